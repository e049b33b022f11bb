use serde::{Deserialize, Serialize};

use crate::primitives::config::current_environment;

/// Notification capabilities the device requests from the platform
/// notification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum NotificationCapability {
    /// Visible alerts / banners
    Alert,
    /// App icon badge updates
    Badge,
    /// Notification sounds
    Sound,
}

/// A single key/value device attribute forwarded to the push backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct CustomAttribute {
    /// Attribute name
    pub key: String,
    /// Attribute value
    pub value: String,
}

/// Policy applied when backend unregistration of a stale token fails.
///
/// Unregistration failure does not prevent a fresh registration from being
/// created, so the default is to continue. The strict alternative is
/// available for backends where a dangling stale registration is worse than
/// a failed attempt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum,
)]
pub enum UnregisterFailurePolicy {
    /// Log the failure and proceed to backend registration. Default.
    #[default]
    Continue,
    /// Treat the failure as fatal to the whole attempt.
    Abort,
}

/// Immutable description of one registration attempt.
///
/// Created once by the caller per attempt and never mutated. Equality lets
/// callers compare stored parameters from a prior attempt against new ones to
/// decide whether a re-registration is needed at all.
///
/// The SDK does not persist these; the caller stores the last-used parameters
/// and token and supplies them back via `previous_device_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct RegistrationParameters {
    /// Push-backend base URL. Empty means the current environment's default.
    pub service_url: String,
    /// Backend identity of the app platform.
    pub platform_uuid: String,
    /// Secret paired with `platform_uuid`, used by the host networking layer
    /// to authenticate backend calls.
    pub platform_secret: String,
    /// User-facing label for this device.
    pub device_alias: String,
    /// Requested notification capability set.
    pub capabilities: Vec<NotificationCapability>,
    /// Tags subscribing this device to backend content categories.
    pub tags: Vec<String>,
    /// Arbitrary device metadata forwarded verbatim to the backend.
    pub custom_attributes: Vec<CustomAttribute>,
    /// Device token from a previous attempt whose backend registration must
    /// be invalidated before the new one is created. `None` skips the
    /// unregistration stage entirely.
    pub previous_device_token: Option<String>,
    /// Policy applied when backend unregistration fails.
    pub unregister_failure_policy: UnregisterFailurePolicy,
}

impl RegistrationParameters {
    /// The backend base URL for this attempt, substituting the environment
    /// default when `service_url` is empty.
    #[must_use]
    pub fn resolved_service_url(&self) -> String {
        if self.service_url.is_empty() {
            current_environment().default_service_url().to_string()
        } else {
            self.service_url.clone()
        }
    }

    /// Whether a stale backend registration must be removed before
    /// registering `new_token`. True only when a previous token exists and
    /// differs from the new one; re-registering the same token needs no
    /// invalidation.
    #[must_use]
    pub fn needs_backend_unregistration(&self, new_token: &str) -> bool {
        self.previous_device_token
            .as_deref()
            .is_some_and(|previous| previous != new_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameters() -> RegistrationParameters {
        RegistrationParameters {
            service_url: String::new(),
            platform_uuid: "9b2b1a70-fc8c-45b6-bfe9-a28a4e4a52a8".to_string(),
            platform_secret: "shh".to_string(),
            device_alias: "kitchen-ipad".to_string(),
            capabilities: vec![
                NotificationCapability::Alert,
                NotificationCapability::Sound,
            ],
            tags: vec!["offers".to_string()],
            custom_attributes: vec![CustomAttribute {
                key: "team".to_string(),
                value: "blue".to_string(),
            }],
            previous_device_token: None,
            unregister_failure_policy: UnregisterFailurePolicy::Continue,
        }
    }

    #[test]
    fn test_resolved_service_url_prefers_explicit_url() {
        let mut params = parameters();
        params.service_url = "https://push.example.org".to_string();
        assert_eq!(params.resolved_service_url(), "https://push.example.org");
    }

    #[test]
    fn test_resolved_service_url_falls_back_to_environment() {
        let params = parameters();
        assert!(params.resolved_service_url().starts_with("https://"));
    }

    #[test]
    fn test_needs_backend_unregistration() {
        let mut params = parameters();
        assert!(!params.needs_backend_unregistration("TK1"));

        params.previous_device_token = Some("OLD".to_string());
        assert!(params.needs_backend_unregistration("NEW"));

        params.previous_device_token = Some("SAME".to_string());
        assert!(!params.needs_backend_unregistration("SAME"));
    }

    #[test]
    fn test_equality_detects_changed_parameters() {
        let stored = parameters();
        let mut fresh = parameters();
        assert_eq!(stored, fresh);

        fresh.device_alias = "bedroom-ipad".to_string();
        assert_ne!(stored, fresh);
    }

    #[test]
    fn test_parameters_survive_caller_side_storage() {
        // Callers persist the last-used parameters themselves and compare on
        // the next launch; a serde round trip models that storage.
        let params = parameters();
        let json = serde_json::to_string(&params).unwrap();
        let restored: RegistrationParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(params, restored);
    }
}
