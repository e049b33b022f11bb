use std::sync::OnceLock;

/// Global configuration for Beacon
static CONFIG_INSTANCE: OnceLock<BeaconConfig> = OnceLock::new();

/// Represents the environment for Beacon operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum BeaconEnvironment {
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

impl BeaconEnvironment {
    /// Returns the string representation of the environment
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Returns the push-backend base URL used when registration parameters
    /// leave `service_url` empty.
    #[must_use]
    pub const fn default_service_url(&self) -> &'static str {
        match self {
            Self::Staging => "https://push.staging.beaconapp.dev",
            Self::Production => "https://push.beaconapp.dev",
        }
    }
}

impl std::fmt::Display for BeaconEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Global configuration for Beacon
#[derive(Debug, Clone, uniffi::Object)]
pub struct BeaconConfig {
    environment: BeaconEnvironment,
}

#[uniffi::export]
impl BeaconConfig {
    /// Creates a new `BeaconConfig` with the specified environment
    ///
    /// # Examples
    ///
    /// ## Swift
    ///
    /// ```swift
    /// let config = BeaconConfig(environment: .production)
    /// ```
    #[uniffi::constructor]
    #[must_use]
    pub const fn new(environment: BeaconEnvironment) -> Self {
        Self { environment }
    }

    /// Gets the current environment
    #[must_use]
    pub const fn environment(&self) -> BeaconEnvironment {
        self.environment
    }
}

/// Initializes the global Beacon configuration.
///
/// This function should be called once at application startup before any other
/// Beacon operations. Subsequent calls will be ignored and log a warning.
///
/// # Examples
///
/// ## Swift
///
/// ```swift
/// import Beacon
///
/// // In your app delegate or during app initialization
/// Beacon.initBeaconConfig(environment: .staging)
/// ```
#[uniffi::export]
pub fn init_beacon_config(environment: BeaconEnvironment) {
    let config = BeaconConfig::new(environment);

    match CONFIG_INSTANCE.set(config) {
        Ok(()) => {
            log::info!("Beacon config initialized with environment: {environment}");
        }
        Err(_) => {
            log::warn!("Beacon config already initialized, ignoring");
        }
    }
}

/// Gets the current Beacon environment.
///
/// # Returns
/// The current environment if config has been initialized, otherwise returns
/// Production as a safe default.
#[must_use]
pub fn current_environment() -> BeaconEnvironment {
    CONFIG_INSTANCE.get().map_or_else(
        || {
            log::warn!("Beacon config not initialized, defaulting to Production");
            BeaconEnvironment::Production
        },
        BeaconConfig::environment,
    )
}

/// Gets a reference to the global Beacon configuration.
#[must_use]
pub fn get_config() -> Option<&'static BeaconConfig> {
    CONFIG_INSTANCE.get()
}

/// Checks if the Beacon configuration has been initialized.
#[must_use]
pub fn is_initialized() -> bool {
    CONFIG_INSTANCE.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_display() {
        assert_eq!(BeaconEnvironment::Staging.as_str(), "staging");
        assert_eq!(BeaconEnvironment::Production.as_str(), "production");

        assert_eq!(BeaconEnvironment::Staging.to_string(), "staging");
        assert_eq!(BeaconEnvironment::Production.to_string(), "production");
    }

    #[test]
    fn test_environment_service_urls_differ() {
        assert_ne!(
            BeaconEnvironment::Staging.default_service_url(),
            BeaconEnvironment::Production.default_service_url()
        );
        assert!(BeaconEnvironment::Production
            .default_service_url()
            .starts_with("https://"));
    }
}
