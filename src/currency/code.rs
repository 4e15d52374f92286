//! A validated three letter currency code.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An upper-case, three letter currency code such as "EUR" or "RON".
///
/// Codes are normalised to upper-case on construction, so comparing two codes
/// is case-insensitive with respect to the input strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and normalise a currency code.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if `code` is not exactly three ASCII letters
    /// once surrounding whitespace is removed.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();

        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::Validation(format!(
                "Currency must be a 3-letter ISO code, got \"{code}\""
            )));
        }

        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Create a currency code without validation.
    ///
    /// The caller should ensure that `code` is a valid, upper-case code, e.g.
    /// because it was read back from the database.
    pub fn new_unchecked(code: &str) -> Self {
        Self(code.to_owned())
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}
