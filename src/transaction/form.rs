//! The request body for creating and updating transactions, and its validation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    currency::{CurrencyCode, MIN_AMOUNT},
    database_id::CategoryId,
    transaction::core::NewTransaction,
};

/// The most characters allowed in a description.
pub const DESCRIPTION_MAX_LENGTH: usize = 255;

/// The largest amount accepted for a single transaction, 9,999,999,999.99.
///
/// Dashboard sums are computed by SQLite over `i64` cents and must not overflow.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// The request body for creating or updating a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// What the transaction was for.
    pub description: String,
    /// How much money was spent or earned.
    pub amount: Decimal,
    /// The three letter currency code of `amount`.
    pub currency: String,
    /// When the transaction happened, e.g. "2025-01-15".
    pub date: Date,
    /// The category to file the transaction under.
    pub category_id: CategoryId,
}

impl TransactionRequest {
    /// Check the request and normalise its fields.
    ///
    /// The description is trimmed, the amount is rounded half-up to cents and
    /// the currency code is upper-cased.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if:
    /// - the description is blank or longer than [DESCRIPTION_MAX_LENGTH] characters,
    /// - the rounded amount is less than [MIN_AMOUNT] or more than [MAX_AMOUNT],
    /// - or the currency is not a three letter code.
    pub fn validate(self) -> Result<NewTransaction, Error> {
        let description = self.description.trim();

        if description.is_empty() {
            return Err(Error::Validation("Description is required".to_owned()));
        }

        if description.chars().count() > DESCRIPTION_MAX_LENGTH {
            return Err(Error::Validation(format!(
                "Description must be at most {DESCRIPTION_MAX_LENGTH} characters"
            )));
        }

        let amount = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        if amount < MIN_AMOUNT {
            return Err(Error::Validation(format!(
                "Amount must be at least {MIN_AMOUNT}, got {}",
                self.amount
            )));
        }

        if amount > MAX_AMOUNT {
            return Err(Error::Validation(format!(
                "Amount must be at most {MAX_AMOUNT}, got {}",
                self.amount
            )));
        }

        Ok(NewTransaction {
            description: description.to_owned(),
            amount,
            currency: CurrencyCode::new(&self.currency)?,
            date: self.date,
            category_id: self.category_id,
        })
    }
}
