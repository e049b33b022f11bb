use crate::registration::parameters::NotificationCapability;

/// Platform-side push registration adapter that native applications implement.
///
/// The engine asks the adapter to register the device with the platform
/// notification service (APNS, FCM). The call is a dispatch, not a query: the
/// adapter kicks off the platform request and returns promptly, then reports
/// the result exactly once via
/// [`RegistrationEngine::platform_registration_complete`](crate::registration::RegistrationEngine::platform_registration_complete).
///
/// Presenting the permission prompt, wiring up the app-delegate callbacks and
/// similar lifecycle plumbing are entirely the adapter's concern.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait PlatformPushAdapter: Send + Sync {
    /// Requests platform registration for the given capability set.
    async fn register_for_remote_notifications(
        &self,
        capabilities: Vec<NotificationCapability>,
    );
}

/// Result of the platform registration request, reported by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum PlatformRegistrationOutcome {
    /// The platform issued a device token.
    Registered {
        /// The opaque device token.
        device_token: String,
    },
    /// The platform declined or failed registration.
    Failed {
        /// The platform-reported failure, e.g. a permission denial.
        message: String,
    },
}
