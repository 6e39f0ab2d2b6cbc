//! Client identity type.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing a [`ClientIdentity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityParseError {
    /// The input is empty or only whitespace.
    #[error("client identity cannot be empty")]
    Empty,
    /// The input is too long to be sent as a header value.
    #[error("client identity must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters that are not visible ASCII.
    #[error("client identity must be visible ASCII")]
    InvalidCharacter,
}

/// An opaque token attributing purchase requests to one client.
///
/// The server keys its rate limit on this value, so it must stay stable for
/// the lifetime of the device profile. New identities are random UUID v4
/// strings; previously stored identities are accepted as-is as long as they
/// can travel in a request header.
///
/// ## Examples
///
/// ```
/// use bobs_corn_core::ClientIdentity;
///
/// let id = ClientIdentity::generate();
/// assert_eq!(id.as_str().len(), 36);
///
/// assert!(ClientIdentity::parse("  ").is_err());
/// assert_eq!(ClientIdentity::parse(" abc ").unwrap().as_str(), "abc");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Maximum accepted length of a stored identity.
    pub const MAX_LENGTH: usize = 128;

    /// Number of characters shown by [`ClientIdentity::short`].
    pub const SHORT_LENGTH: usize = 8;

    /// Generate a fresh, universally unique identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse a stored identity, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`ClientIdentity::MAX_LENGTH`], or contains non-visible characters.
    pub fn parse(s: &str) -> Result<Self, IdentityParseError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(IdentityParseError::Empty);
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(IdentityParseError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !trimmed.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(IdentityParseError::InvalidCharacter);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identity and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns a short prefix suitable for showing to the user.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..Self::SHORT_LENGTH).unwrap_or(&self.0)
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ClientIdentity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ClientIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_uuid() {
        let id = ClientIdentity::generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(ClientIdentity::generate(), ClientIdentity::generate());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ClientIdentity::parse(""), Err(IdentityParseError::Empty));
        assert_eq!(
            ClientIdentity::parse(" \n\t"),
            Err(IdentityParseError::Empty)
        );
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(ClientIdentity::MAX_LENGTH + 1);
        assert!(matches!(
            ClientIdentity::parse(&long),
            Err(IdentityParseError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_inner_whitespace() {
        assert_eq!(
            ClientIdentity::parse("abc def"),
            Err(IdentityParseError::InvalidCharacter)
        );
    }

    #[test]
    fn test_parse_trims() {
        let id = ClientIdentity::parse("  3f2b9c1e-aaaa  \n").unwrap();
        assert_eq!(id.as_str(), "3f2b9c1e-aaaa");
    }

    #[test]
    fn test_short() {
        let id = ClientIdentity::parse("3f2b9c1e-4d5a-4b6c-8d7e-0123456789ab").unwrap();
        assert_eq!(id.short(), "3f2b9c1e");

        let tiny = ClientIdentity::parse("abc").unwrap();
        assert_eq!(tiny.short(), "abc");
    }

    #[test]
    fn test_serde_transparent() {
        let id = ClientIdentity::parse("abc-123").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc-123\"");
    }
}
