/// The stage of the registration sequence a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum RegistrationStage {
    /// Platform-level notification registration
    Platform,
    /// Backend removal of a stale registration
    BackendUnregistration,
    /// Backend registration of the new token
    BackendRegistration,
}

impl RegistrationStage {
    /// Short name used in log lines.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::BackendUnregistration => "backend_unregistration",
            Self::BackendRegistration => "backend_registration",
        }
    }
}

/// Terminal outcome of one registration attempt.
///
/// A single tagged value instead of separate success/failure callbacks: the
/// listener receives exactly one of these per started attempt.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum RegistrationOutcome {
    /// The device token is registered with the backend.
    Succeeded {
        /// The registered device token.
        device_token: String,
    },
    /// The attempt failed at `stage`.
    Failed {
        /// The stage that failed.
        stage: RegistrationStage,
        /// The collaborator-reported failure, verbatim.
        message: String,
    },
}

/// Receives the terminal outcome of a registration attempt.
///
/// Implemented by the host application (or by Rust callers). For a given
/// `start_registration` call, `registration_did_complete` fires exactly once;
/// intermediate stages are never reported through it.
#[uniffi::export(with_foreign)]
pub trait RegistrationListener: Send + Sync {
    /// Called once when the attempt reaches a terminal state.
    fn registration_did_complete(&self, outcome: RegistrationOutcome);
}
