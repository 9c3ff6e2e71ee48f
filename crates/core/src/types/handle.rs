//! URL handle type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Handle`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The input string is empty.
    #[error("handle cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("handle must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9_-]`.
    #[error("handle contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The input starts or ends with a hyphen.
    #[error("handle cannot start or end with a hyphen")]
    EdgeHyphen,
}

/// The URL handle of a product, collection, page, or policy.
///
/// Handles are what the Storefront API uses to look resources up by URL
/// (`/products/{handle}`). Parsing a path segment into a `Handle` before
/// querying lets routes answer 404 for garbage without an API round trip.
///
/// ## Constraints
///
/// - Length: 1-255 characters
/// - Lowercase ASCII letters, digits, `-` and `_` only
/// - Must not start or end with `-`
///
/// ## Examples
///
/// ```
/// use canopy_core::Handle;
///
/// assert!(Handle::parse("classic-tee").is_ok());
/// assert!(Handle::parse("Classic Tee").is_err());
/// assert!(Handle::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Maximum length of a handle.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `Handle` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input violates any of the constraints above.
    pub fn parse(s: &str) -> Result<Self, HandleError> {
        if s.is_empty() {
            return Err(HandleError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(HandleError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(HandleError::InvalidCharacter(c));
        }

        if s.starts_with('-') || s.ends_with('-') {
            return Err(HandleError::EdgeHyphen);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Handle` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Handle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_handles() {
        assert!(Handle::parse("a").is_ok());
        assert!(Handle::parse("classic-tee").is_ok());
        assert!(Handle::parse("privacy-policy").is_ok());
        assert!(Handle::parse("summer_2025").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Handle::parse(""), Err(HandleError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(256);
        assert!(matches!(
            Handle::parse(&long),
            Err(HandleError::TooLong { max: 255 })
        ));
    }

    #[test]
    fn test_parse_rejects_uppercase_and_separators() {
        assert_eq!(
            Handle::parse("Classic"),
            Err(HandleError::InvalidCharacter('C'))
        );
        assert_eq!(
            Handle::parse("a/b"),
            Err(HandleError::InvalidCharacter('/'))
        );
        assert_eq!(
            Handle::parse("a b"),
            Err(HandleError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn test_parse_rejects_edge_hyphens() {
        assert_eq!(Handle::parse("-tee"), Err(HandleError::EdgeHyphen));
        assert_eq!(Handle::parse("tee-"), Err(HandleError::EdgeHyphen));
    }
}
