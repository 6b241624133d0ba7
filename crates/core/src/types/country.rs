//! ISO 3166-1 alpha-2 country codes for shipping addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CountryCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CountryCodeError {
    /// The input string is empty.
    #[error("country cannot be empty")]
    Empty,
    /// The input is not two ASCII letters.
    #[error("country must be a two-letter ISO code (got {0:?})")]
    Malformed(String),
}

/// A two-letter country code, always stored upper case.
///
/// ```
/// use petal_core::CountryCode;
///
/// assert_eq!(CountryCode::parse("ng").map(|c| c.to_string()), Ok("NG".to_string()));
/// assert!(CountryCode::parse("Nigeria").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a country code, normalizing to upper case.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or not exactly two
    /// ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CountryCodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CountryCodeError::Empty);
        }
        if s.len() != 2 || !s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CountryCodeError::Malformed(s.to_owned()));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Defaults to `NG`, the shop's home market.
impl Default for CountryCode {
    fn default() -> Self {
        Self("NG".to_owned())
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CountryCode {
    type Err = CountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case() {
        assert_eq!(CountryCode::parse(" gb ").unwrap().as_str(), "GB");
    }

    #[test]
    fn test_rejects_names_and_numbers() {
        assert_eq!(CountryCode::parse(""), Err(CountryCodeError::Empty));
        assert!(matches!(
            CountryCode::parse("NGA"),
            Err(CountryCodeError::Malformed(_))
        ));
        assert!(matches!(
            CountryCode::parse("1A"),
            Err(CountryCodeError::Malformed(_))
        ));
    }
}
