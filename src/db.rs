//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the tables for the domain models if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection`, so this should be
/// called on every newly opened connection.
///
/// # Errors
/// Returns an error if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it is set first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
