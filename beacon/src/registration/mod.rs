//! Push Registration
//!
//! Registers the device for platform push notifications and exchanges the
//! resulting device token with the push backend.
//!
//! # Overview
//!
//! The module consists of:
//! - [`RegistrationEngine`]: sequences one registration attempt at a time
//! - [`PlatformPushAdapter`]: platform notification service, implemented natively
//! - [`BackendRegistrationApi`]: push-backend network calls, implemented natively
//! - [`RegistrationListener`]: receives the attempt's terminal outcome
//! - [`RegistrationParameters`]: immutable description of one attempt
//!
//! An attempt runs platform registration first, then — only when the caller
//! supplies a previous token that differs from the fresh one — backend
//! unregistration of the stale registration, then backend registration. The
//! engine never talks to the platform or the network itself; both directions
//! go through the collaborator traits, so the host owns permission prompts,
//! authentication and transport.
//!
//! # Usage
//!
//! ## Platform usage (Swift/Kotlin)
//!
//! ```swift
//! // 1. Implement the collaborators
//! let adapter = ApnsAdapter()          // PlatformPushAdapter
//! let backend = PushServiceClient()    // BackendRegistrationApi
//!
//! // 2. Create the engine and start an attempt
//! let engine = RegistrationEngine(platform: adapter, backend: backend)
//! try await engine.startRegistration(parameters: params, listener: self)
//!
//! // 3. Forward completions as they arrive
//! try await engine.platformRegistrationComplete(
//!     outcome: .registered(deviceToken: tokenHex))
//! try await engine.backendRegistrationComplete(outcome: .completed)
//! // listener.registrationDidComplete fires exactly once
//! ```
//!
//! ```kotlin
//! val engine = RegistrationEngine(fcmAdapter, pushServiceClient)
//! engine.startRegistration(params, listener)
//! engine.platformRegistrationComplete(
//!     PlatformRegistrationOutcome.Registered(tokenHex))
//! engine.backendRegistrationComplete(BackendOperationOutcome.Completed)
//! ```
//!
//! Rust callers can instead await [`RegistrationEngine::register`], which
//! folds the listener into the returned `Result`.
//!
//! # Persistence
//!
//! The engine persists nothing. Callers store the last registered token and
//! parameters themselves and pass the token back as
//! `previous_device_token` on the next attempt; `RegistrationParameters`
//! equality tells them whether anything changed at all.

mod adapter;
mod backend;
mod engine;
mod error;
mod listener;
mod parameters;
mod state;

#[cfg(test)]
mod test;

// Public API exports
pub use adapter::{PlatformPushAdapter, PlatformRegistrationOutcome};
pub use backend::{
    BackendOperationOutcome, BackendRegistrationApi, BackendRegistrationRequest,
    BackendUnregistrationRequest,
};
pub use engine::RegistrationEngine;
pub use error::{RegistrationError, RegistrationResult};
pub use listener::{RegistrationListener, RegistrationOutcome, RegistrationStage};
pub use parameters::{
    CustomAttribute, NotificationCapability, RegistrationParameters,
    UnregisterFailurePolicy,
};
pub use state::RegistrationProgress;
