#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

//! `beacon` is the foundational push-notification library for Beacon's mobile apps.
//! It registers a device for platform push notifications, exchanges the resulting
//! device token with the push backend, and models the geofenced regions that
//! backend push content is attached to.

/// Registration of the device with the platform notification service and the
/// push backend. Home of the [`registration::RegistrationEngine`].
pub mod registration;

/// Geofence content model and the location index used to react to nearby
/// geofenced push content.
pub mod geofence;

/// Low level primitives shared across the SDK.
pub mod primitives;

pub use beacon_macros::beacon_error;
pub use primitives::config::{
    current_environment, init_beacon_config, BeaconConfig, BeaconEnvironment,
};
pub use primitives::logger::{set_logger, LogLevel, Logger};

uniffi::setup_scaffolding!("beacon");
