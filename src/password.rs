//! Password strength checks and password hashing.
//!
//! A raw password is first checked with [ValidatedPassword::new], and only a
//! validated password can be turned into a [PasswordHash] for storage.

use std::fmt::Display;

use bcrypt::{hash, verify};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that has passed the strength check, but has not been hashed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// `user_inputs` are other values the user entered, such as their username
    /// and email. Passwords built from them are penalised.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with suggestions for a stronger password if
    /// the password scores less than three out of four.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, user_inputs);

        match analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password.to_owned())),
            _ => {
                let message = analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string();

                Err(Error::TooWeak(if message.trim().is_empty() {
                    "add more words or characters".to_owned()
                } else {
                    message
                }))
            }
        }
    }

    /// Wrap `raw_password` without checking its strength.
    ///
    /// Only for passwords that are known to be strong, such as in tests.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted bcrypt hash of a password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The default bcrypt cost.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with the bcrypt `cost`.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails, e.g. because the cost is
    /// out of range.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check whether `raw_password` is the password that produced this hash.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}


#[cfg(test)]
mod password_hash_tests {
    use crate::{
        Error,
        password::{PasswordHash, ValidatedPassword},
    };

    #[test]
    fn verify_succeeds_for_matching_password() {
        let password = "averysafeandsecurepassword";
        let hash = PasswordHash::new(ValidatedPassword::new_unchecked(password), 4).unwrap();

        assert!(hash.verify(password).unwrap());
    }

    #[test]
    fn verify_fails_for_wrong_password() {
        let hash =
            PasswordHash::new(ValidatedPassword::new_unchecked("averysafeandsecurepassword"), 4)
                .unwrap();

        assert!(!hash.verify("thewrongpassword").unwrap());
    }

    #[test]
    fn verify_existing_hash() {
        let hash = PasswordHash::new_unchecked(
            "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm",
        );

        assert!(hash.verify("okon").unwrap());
    }

    #[test]
    fn verify_fails_on_malformed_hash() {
        let hash = PasswordHash::new_unchecked("not a bcrypt hash");

        assert!(matches!(hash.verify("okon"), Err(Error::HashingError(_))));
    }

    #[test]
    fn new_fails_on_invalid_cost() {
        let result = PasswordHash::new(ValidatedPassword::new_unchecked("password"), 100);

        assert!(matches!(result, Err(Error::HashingError(_))));
    }
}
