//! Defines the core data models and database queries for transactions.
//!
//! Amounts are stored as integer cents so that sums computed by SQLite are exact.

use rusqlite::{Connection, Row, named_params, types::Type};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::{CategoryType, get_category},
    currency::CurrencyCode,
    database_id::{CategoryId, TransactionId},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// The category's name and type are included so clients do not need to look
/// them up separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned, always positive.
    pub amount: Decimal,
    /// The currency of `amount`.
    pub currency: CurrencyCode,
    /// When the transaction happened.
    pub date: Date,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The name of the category the transaction belongs to.
    pub category_name: String,
    /// Whether the transaction is income or an expense.
    pub category_type: CategoryType,
    /// The user that owns the transaction.
    pub user_id: UserID,
}

/// The validated fields of a transaction that has not been saved yet, or the
/// new values of one that is being updated.
///
/// Create one with [crate::transaction::TransactionRequest::validate].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// A non-blank description of at most 255 characters.
    pub description: String,
    /// A positive amount with at most two decimal places.
    pub amount: Decimal,
    /// The currency of `amount`.
    pub currency: CurrencyCode,
    /// When the transaction happened.
    pub date: Date,
    /// The category to file the transaction under.
    pub category_id: CategoryId,
}

/// Optional filters for listing a user's transactions.
///
/// A `None` field does not filter anything. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Only include transactions on or after this date.
    pub from: Option<Date>,
    /// Only include transactions on or before this date.
    pub to: Option<Date>,
    /// Only include transactions in this category.
    pub category_id: Option<CategoryId>,
}

// ============================================================================
// AMOUNT CONVERSION
// ============================================================================

/// Convert an amount with at most two decimal places to integer cents.
///
/// # Errors
/// Returns [Error::Validation] if the amount does not fit in an `i64` of cents.
pub fn to_cents(amount: Decimal) -> Result<i64, Error> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.trunc().to_i64())
        .ok_or_else(|| Error::Validation(format!("Amount {amount} is too large")))
}

/// Convert integer cents read from the database back to a decimal amount.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_TRANSACTION: &str = "SELECT t.id, t.description, t.amount, t.currency, t.date, \
     t.category_id, c.name, c.type, t.user_id \
     FROM \"transaction\" t INNER JOIN category c ON c.id = t.category_id";

/// Create a new transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryNotFound] if the category does not exist,
/// - [Error::UserNotFound] if the user does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    get_category(new_transaction.category_id, connection)?;

    connection
        .execute(
            "INSERT INTO \"transaction\" (description, amount, currency, date, category_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &new_transaction.description,
                to_cents(new_transaction.amount)?,
                new_transaction.currency.as_ref(),
                new_transaction.date,
                new_transaction.category_id,
                user_id.as_i64(),
            ),
        )
        .map_err(map_foreign_key_error)?;

    get_transaction(connection.last_insert_rowid(), connection)
}

/// Retrieve a transaction by its `id`, regardless of who owns it.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!("{SELECT_TRANSACTION} WHERE t.id = :id"))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
            error => error.into(),
        })
}

/// Retrieve the transaction `id` if it is owned by `user_id`.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if the transaction does not exist or
/// is owned by another user.
pub fn get_user_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection)?;

    if transaction.user_id != user_id {
        tracing::warn!("User {user_id} tried to access transaction {id} owned by another user");
        return Err(Error::TransactionNotFound);
    }

    Ok(transaction)
}

/// Retrieve the transactions owned by `user_id` that match `filter`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION}
             WHERE t.user_id = :user_id
               AND (:from IS NULL OR t.date >= :from)
               AND (:to IS NULL OR t.date <= :to)
               AND (:category_id IS NULL OR t.category_id = :category_id)
             ORDER BY t.date DESC, t.id DESC"
        ))?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":from": filter.from,
                ":to": filter.to,
                ":category_id": filter.category_id,
            },
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Replace the fields of the transaction `id` owned by `user_id`.
///
/// The category is only looked up again when it changes.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if the transaction does not exist or is owned by another user,
/// - [Error::CategoryNotFound] if the new category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let existing = get_user_transaction(id, user_id, connection)?;

    if existing.category_id != update.category_id {
        get_category(update.category_id, connection)?;
    }

    connection.execute(
        "UPDATE \"transaction\"
         SET description = ?1, amount = ?2, currency = ?3, date = ?4, category_id = ?5
         WHERE id = ?6 AND user_id = ?7",
        (
            &update.description,
            to_cents(update.amount)?,
            update.currency.as_ref(),
            update.date,
            update.category_id,
            id,
            user_id.as_i64(),
        ),
    )?;

    get_transaction(id, connection)
}

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if the transaction does not exist or
/// is owned by another user.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound);
    }

    Ok(())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount > 0),
                currency TEXT NOT NULL,
                date TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Add composite index used by the transaction list and dashboard.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row from the joined transaction and category query to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_currency: String = row.get(3)?;
    let raw_category_type: String = row.get(7)?;
    let category_type = raw_category_type.parse::<CategoryType>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(error))
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: from_cents(row.get(2)?),
        currency: CurrencyCode::new_unchecked(&raw_currency),
        date: row.get(4)?,
        category_id: row.get(5)?,
        category_name: row.get(6)?,
        category_type,
        user_id: UserID::new(row.get(8)?),
    })
}

fn map_foreign_key_error(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::UserNotFound,
        error => error.into(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
