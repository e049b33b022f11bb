/// Errors that can occur during a registration attempt
#[crate::beacon_error]
pub enum RegistrationError {
    /// The platform notification service declined or failed registration,
    /// e.g. the user denied the permission prompt. Fatal to the attempt.
    #[error("platform registration failed: {message}")]
    PlatformRegistrationFailed {
        /// The platform-reported failure
        message: String,
    },

    /// Backend removal of a stale token failed and the attempt's policy is
    /// `Abort`. Under the default `Continue` policy this error is never
    /// surfaced.
    #[error("backend unregistration failed: {message}")]
    BackendUnregistrationFailed {
        /// The backend-reported failure
        message: String,
    },

    /// The backend rejected or failed registration of the new token. Fatal
    /// to the attempt.
    #[error("backend registration failed: {message}")]
    BackendRegistrationFailed {
        /// The backend-reported failure
        message: String,
    },

    /// `start_registration` was called while an attempt is in flight.
    #[error("a registration attempt is already in progress")]
    AttemptInProgress,

    /// A collaborator reported a completion out of the expected sequence.
    /// This is an internal-consistency fault in the caller, not a legitimate
    /// input; it is returned to the violating collaborator and never routed
    /// through the registration listener.
    #[error("protocol violation: {message}")]
    ProtocolViolation {
        /// What arrived, and in which phase
        message: String,
    },
}

/// Result type for registration operations
pub type RegistrationResult<T> = std::result::Result<T, RegistrationError>;
