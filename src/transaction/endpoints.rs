//! Route handlers for creating, reading, updating and deleting transactions.
//!
//! Every handler runs behind the auth guard and only touches transactions
//! owned by the authenticated user.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    database_id::{CategoryId, TransactionId},
    transaction::{
        core::{
            Transaction, TransactionFilter, create_transaction, delete_transaction,
            get_transactions, get_user_transaction, update_transaction,
        },
        form::TransactionRequest,
    },
    user::UserID,
};

/// The state needed to manage transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for listing transactions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    /// Only list transactions on or after this date.
    pub from: Option<Date>,
    /// Only list transactions on or before this date.
    pub to: Option<Date>,
    /// Only list transactions in this category.
    pub category_id: Option<CategoryId>,
}

impl From<TransactionQuery> for TransactionFilter {
    fn from(query: TransactionQuery) -> Self {
        Self {
            from: query.from,
            to: query.to,
            category_id: query.category_id,
        }
    }
}

/// A route handler for creating a new transaction, responds with 201 Created
/// and the transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Json(request), _): WithRejection<Json<TransactionRequest>, Error>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let new_transaction = request.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(user_id, new_transaction, &connection)?;
    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for listing the user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<TransactionQuery>, Error>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions(user_id, &query.into(), &connection).map(Json)
}

/// A route handler for getting one of the user's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Path(transaction_id), _): WithRejection<Path<TransactionId>, Error>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_transaction(transaction_id, user_id, &connection).map(Json)
}

/// A route handler for replacing one of the user's transactions.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Path(transaction_id), _): WithRejection<Path<TransactionId>, Error>,
    WithRejection(Json(request), _): WithRejection<Json<TransactionRequest>, Error>,
) -> Result<Json<Transaction>, Error> {
    let update = request.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_transaction(transaction_id, user_id, update, &connection).map(Json)
}

/// A route handler for deleting one of the user's transactions, responds with
/// 204 No Content.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Path(transaction_id), _): WithRejection<Path<TransactionId>, Error>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, user_id, &connection)?;
    tracing::debug!("User {user_id} deleted transaction {transaction_id}");

    Ok(StatusCode::NO_CONTENT)
}
