//! The route handler for listing categories.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::core::{Category, CategoryType, get_all_categories, get_categories_by_type},
};

/// The state needed to list categories.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for reading categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// Only list categories of this type, "INCOME" or "EXPENSE" in any case.
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

/// A route handler for listing all categories, optionally filtered by type.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    WithRejection(Query(query), _): WithRejection<Query<CategoryQuery>, Error>,
) -> Result<Json<Vec<Category>>, Error> {
    let category_type = query
        .category_type
        .as_deref()
        .map(str::parse::<CategoryType>)
        .transpose()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = match category_type {
        Some(category_type) => get_categories_by_type(category_type, &connection)?,
        None => get_all_categories(&connection)?,
    };

    Ok(Json(categories))
}
