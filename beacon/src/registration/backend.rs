use crate::registration::parameters::CustomAttribute;

/// Push-backend API that native applications implement for the engine's
/// backend calls.
///
/// Both operations are dispatches: the implementation starts the network call
/// through the app's networking stack (auth headers, SSL pinning, proxies)
/// and returns promptly, then reports the result exactly once via the
/// engine's matching completion method. The engine never talks to the network
/// itself.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait BackendRegistrationApi: Send + Sync {
    /// Requests registration of a fresh device token.
    async fn register_device(&self, request: BackendRegistrationRequest);

    /// Requests removal of a stale device-token registration.
    async fn unregister_device(&self, request: BackendUnregistrationRequest);
}

/// Request payload for registering a device token with the backend.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct BackendRegistrationRequest {
    /// Resolved backend base URL for this attempt.
    pub service_url: String,
    /// Backend identity of the app platform.
    pub platform_uuid: String,
    /// Secret paired with `platform_uuid`.
    pub platform_secret: String,
    /// The freshly issued device token.
    pub device_token: String,
    /// User-facing label for this device.
    pub device_alias: String,
    /// Tags subscribing this device to backend content categories.
    pub tags: Vec<String>,
    /// Arbitrary device metadata forwarded verbatim.
    pub custom_attributes: Vec<CustomAttribute>,
}

/// Request payload for removing a stale device-token registration.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct BackendUnregistrationRequest {
    /// Resolved backend base URL for this attempt.
    pub service_url: String,
    /// Backend identity of the app platform.
    pub platform_uuid: String,
    /// Secret paired with `platform_uuid`.
    pub platform_secret: String,
    /// The stale device token to unregister.
    pub device_token: String,
}

/// Result of a backend operation, reported by the API implementation.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum BackendOperationOutcome {
    /// The backend accepted the operation.
    Completed,
    /// The backend rejected the operation or the call failed.
    Failed {
        /// The backend-reported failure, verbatim.
        message: String,
    },
}
