use serde::{Deserialize, Serialize};

use crate::registration::listener::RegistrationStage;

/// Tagged state of the engine's current attempt.
///
/// Each variant carries the data that is only meaningful in that state, so an
/// illegal combination (e.g. "succeeded without a token") cannot be
/// represented. The boolean progress flags callers can observe are derived
/// from this plus [`ProgressFlags`], never stored as independent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RegistrationPhase {
    /// No attempt has been started, or the engine is between attempts.
    Idle,
    /// Waiting for the platform notification service to yield a token.
    PlatformRegistering,
    /// Waiting for the backend to remove the stale registration.
    BackendUnregistering {
        /// The freshly issued token the attempt will register next.
        device_token: String,
    },
    /// Waiting for the backend to accept the new registration.
    BackendRegistering {
        /// The freshly issued token being registered.
        device_token: String,
    },
    /// Terminal: the attempt completed and the token is registered.
    Succeeded {
        /// The registered token.
        device_token: String,
    },
    /// Terminal: the attempt failed.
    Failed {
        /// The stage that failed.
        stage: RegistrationStage,
        /// The collaborator-reported failure.
        message: String,
    },
}

impl RegistrationPhase {
    /// Whether the attempt has reached a terminal outcome.
    pub(crate) const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Short name used in log lines and protocol-violation messages.
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PlatformRegistering => "platform_registering",
            Self::BackendUnregistering { .. } => "backend_unregistering",
            Self::BackendRegistering { .. } => "backend_registering",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Monotonic start/finish markers for the stages of one attempt.
///
/// Reset wholesale by `start_registration`; individual flags only ever flip
/// from false to true while the attempt runs.
#[derive(Debug, Default, Clone)]
pub(crate) struct ProgressFlags {
    pub did_start_registration: bool,
    pub did_start_platform_registration: bool,
    pub did_finish_platform_registration: bool,
    pub did_start_backend_unregistration: bool,
    pub did_finish_backend_unregistration: bool,
    pub did_start_backend_registration: bool,
    pub did_finish_backend_registration: bool,
}

impl ProgressFlags {
    /// Builds the observable snapshot, deriving the terminal flags from the
    /// phase so they can never disagree with it.
    pub(crate) fn snapshot(&self, phase: &RegistrationPhase) -> RegistrationProgress {
        RegistrationProgress {
            did_start_registration: self.did_start_registration,
            did_start_platform_registration: self.did_start_platform_registration,
            did_finish_platform_registration: self.did_finish_platform_registration,
            did_start_backend_unregistration: self.did_start_backend_unregistration,
            did_finish_backend_unregistration: self.did_finish_backend_unregistration,
            did_start_backend_registration: self.did_start_backend_registration,
            did_finish_backend_registration: self.did_finish_backend_registration,
            did_registration_succeed: matches!(
                phase,
                RegistrationPhase::Succeeded { .. }
            ),
            did_registration_fail: matches!(phase, RegistrationPhase::Failed { .. }),
        }
    }
}

/// Observable snapshot of one attempt's progress.
///
/// Purely informational: the host sees the terminal outcome through its
/// listener, and may additionally inspect this record (e.g. for diagnostics
/// screens). At most one of the two terminal flags is ever true.
#[derive(Debug, Clone, Default, Serialize, Deserialize, uniffi::Record)]
pub struct RegistrationProgress {
    /// An attempt was started.
    pub did_start_registration: bool,
    /// Platform registration was requested.
    pub did_start_platform_registration: bool,
    /// The platform yielded a device token.
    pub did_finish_platform_registration: bool,
    /// Backend unregistration of a stale token was requested.
    pub did_start_backend_unregistration: bool,
    /// Backend unregistration completed successfully.
    pub did_finish_backend_unregistration: bool,
    /// Backend registration of the new token was requested.
    pub did_start_backend_registration: bool,
    /// Backend registration completed successfully.
    pub did_finish_backend_registration: bool,
    /// The attempt terminated successfully.
    pub did_registration_succeed: bool,
    /// The attempt terminated with a failure.
    pub did_registration_fail: bool,
}
