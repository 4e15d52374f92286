//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the validated `NewTransaction` used to create or replace one
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for the transaction CRUD endpoints

mod core;
mod endpoints;
mod form;

pub use core::{
    NewTransaction, Transaction, TransactionFilter, create_transaction, create_transaction_table,
    delete_transaction, from_cents, get_transactions, get_user_transaction, map_transaction_row,
    to_cents, update_transaction,
};
pub use endpoints::{
    TransactionQuery, TransactionState, create_transaction_endpoint, delete_transaction_endpoint,
    get_transaction_endpoint, get_transactions_endpoint, update_transaction_endpoint,
};
pub use form::{DESCRIPTION_MAX_LENGTH, MAX_AMOUNT, TransactionRequest};

#[cfg(test)]
pub use core::count_transactions;
