use std::fmt::Display;

/// Global SDK configuration.
pub mod config;

/// Logging bridge towards the host application.
pub mod logger;

/// An opaque push device token as issued by the platform notification service.
///
/// Platform layers commonly hand tokens around in loosely formatted shapes: raw
/// hex, `0x`-prefixed hex, or the debug rendering of token bytes
/// (`"<740f4707 bebcf74f ...>"`). This wrapper accepts all of those, validates
/// that the payload is hex, and normalizes to plain lowercase hex so every
/// downstream consumer sees one canonical form.
///
/// # Examples
/// ```
/// use beacon::primitives::DeviceToken;
/// let token = DeviceToken::new("<740F4707 BEBCF74F>").unwrap();
/// assert_eq!(token.as_str(), "740f4707bebcf74f");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Object)]
pub struct DeviceToken(String);

#[uniffi::export]
impl DeviceToken {
    /// Initializes a new `DeviceToken` from a textual token representation.
    ///
    /// # Arguments
    /// * `s` - The token text. May be raw hex, `0x`-prefixed, or wrapped in
    ///   angle brackets with embedded spaces.
    ///
    /// # Errors
    /// - `PrimitiveError::InvalidDeviceToken` if the payload is empty or not
    ///   validly encoded hex data.
    #[uniffi::constructor]
    pub fn new(s: &str) -> Result<Self, PrimitiveError> {
        let normalized: String = s
            .trim()
            .trim_start_matches("0x")
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '<' && *c != '>')
            .collect::<String>()
            .to_lowercase();

        if normalized.is_empty() {
            return Err(PrimitiveError::InvalidDeviceToken(s.to_string()));
        }
        hex::decode(&normalized)
            .map_err(|_| PrimitiveError::InvalidDeviceToken(s.to_string()))?;
        Ok(Self(normalized))
    }

    /// Returns the canonical token as a String. Re-wraps `Display` for foreign code.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        self.0.to_string()
    }
}

impl DeviceToken {
    /// Returns the canonical token as a &str.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DeviceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DeviceToken> for String {
    fn from(token: DeviceToken) -> Self {
        token.0
    }
}

impl TryFrom<String> for DeviceToken {
    type Error = PrimitiveError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl TryFrom<&str> for DeviceToken {
    type Error = PrimitiveError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

/// Represents primitive errors on Beacon. These errors may not be called **from** FFI.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PrimitiveError {
    /// The provided string is not a validly encoded device token.
    #[error("invalid device token: {0}")]
    InvalidDeviceToken(String),
}
