//! The dashboard summary of a user's income and expenses over a date range.

use std::{
    ops::RangeInclusive,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    AppState, Error,
    category::CategoryType,
    dashboard::aggregation::{CategoryTotal, expenses_by_category, sum_by_category_type},
    timezone::local_today,
    user::{UserID, get_user_by_id},
};

/// The state needed for the dashboard statistics.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The optional date range for the dashboard statistics.
#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    /// The first day to include, defaults to the first day of the current month.
    pub from: Option<Date>,
    /// The last day to include, defaults to the last day of the current month.
    pub to: Option<Date>,
}

/// A summary of a user's income and expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    /// The sum of income transactions.
    pub total_income: Decimal,
    /// The sum of expense transactions.
    pub total_expense: Decimal,
    /// `total_income - total_expense`.
    pub balance: Decimal,
    /// The expense totals for each category with at least one expense.
    pub expenses_by_category: Vec<CategoryTotal>,
}

/// Get the first and last day of the month containing `date`.
pub fn month_range(date: Date) -> RangeInclusive<Date> {
    let year = date.year();
    let month = date.month();

    let first = Date::from_calendar_date(year, month, 1).unwrap_or(date);
    let next_month_start = match month {
        Month::December => Date::from_calendar_date(year + 1, Month::January, 1),
        _ => Date::from_calendar_date(year, month.next(), 1),
    };
    let last = next_month_start
        .ok()
        .and_then(|start| start.previous_day())
        .unwrap_or(date);

    first..=last
}

/// Resolve the date range for `query`, falling back on the bounds of the
/// month containing `today` for each missing end.
pub fn resolve_date_range(query: &StatisticsQuery, today: Date) -> RangeInclusive<Date> {
    let current_month = month_range(today);

    let start = query.from.unwrap_or(*current_month.start());
    let end = query.to.unwrap_or(*current_month.end());

    start..=end
}

/// Summarise the transactions of `user_id` in `date_range`.
///
/// # Errors
/// This function will return a:
/// - [Error::UserNotFound] if the user does not exist,
/// - or [Error::SqlError] if there is an SQL error.
pub fn get_statistics(
    user_id: UserID,
    date_range: &RangeInclusive<Date>,
    connection: &Connection,
) -> Result<DashboardStatistics, Error> {
    get_user_by_id(user_id, connection)?;

    let total_income =
        sum_by_category_type(user_id, CategoryType::Income, date_range, connection)?;
    let total_expense =
        sum_by_category_type(user_id, CategoryType::Expense, date_range, connection)?;
    let expenses_by_category = expenses_by_category(user_id, date_range, connection)?;

    Ok(DashboardStatistics {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        expenses_by_category,
    })
}

/// A route handler for the dashboard statistics of the authenticated user.
pub async fn get_statistics_endpoint(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<StatisticsQuery>, Error>,
) -> Result<Json<DashboardStatistics>, Error> {
    let today = local_today(&state.local_timezone)?;
    let date_range = resolve_date_range(&query, today);

    tracing::debug!(
        "Getting statistics for user {user_id} from {} to {}",
        date_range.start(),
        date_range.end()
    );

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_statistics(user_id, &date_range, &connection).map(Json)
}


#[cfg(test)]
mod endpoint_tests {
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{get_test_server, register_test_user},
    };

    #[tokio::test]
    async fn statistics_require_token() {
        let server = get_test_server();

        let response = server.get(endpoints::DASHBOARD_STATISTICS).await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn statistics_ignore_user_id_header() {
        let server = get_test_server();
        register_test_user(&server, "alice", "alice@example.com").await;

        let response = server
            .get(endpoints::DASHBOARD_STATISTICS)
            .add_header("X-User-Id", "1")
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn statistics_for_new_user_are_zero() {
        let server = get_test_server();
        let (token, _) = register_test_user(&server, "alice", "alice@example.com").await;

        let response = server
            .get(endpoints::DASHBOARD_STATISTICS)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({
                "totalIncome": 0.0,
                "totalExpense": 0.0,
                "balance": 0.0,
                "expensesByCategory": []
            })
        );
    }

    #[tokio::test]
    async fn statistics_sum_transactions_in_range() {
        let server = get_test_server();
        let (token, _) = register_test_user(&server, "alice", "alice@example.com").await;
        for (amount, category_id, date) in [
            (3000.0, 10, "2025-01-01"),
            (45.5, 1, "2025-01-15"),
            (4.5, 1, "2025-01-20"),
            (1200.0, 2, "2025-01-31"),
            (99.0, 1, "2025-02-01"),
        ] {
            server
                .post(endpoints::TRANSACTIONS)
                .authorization_bearer(&token)
                .json(&json!({
                    "description": "Test",
                    "amount": amount,
                    "currency": "NZD",
                    "date": date,
                    "categoryId": category_id
                }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let response = server
            .get(endpoints::DASHBOARD_STATISTICS)
            .authorization_bearer(&token)
            .add_query_param("from", "2025-01-01")
            .add_query_param("to", "2025-01-31")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({
                "totalIncome": 3000.0,
                "totalExpense": 1250.0,
                "balance": 1750.0,
                "expensesByCategory": [
                    {"categoryId": 1, "categoryName": "Food", "totalAmount": 50.0},
                    {"categoryId": 2, "categoryName": "Rent", "totalAmount": 1200.0}
                ]
            })
        );
    }

    #[tokio::test]
    async fn statistics_with_reversed_range_are_zero() {
        let server = get_test_server();
        let (token, _) = register_test_user(&server, "alice", "alice@example.com").await;

        let response = server
            .get(endpoints::DASHBOARD_STATISTICS)
            .authorization_bearer(&token)
            .add_query_param("from", "2025-02-01")
            .add_query_param("to", "2025-01-01")
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["balance"], 0.0);
    }

    #[tokio::test]
    async fn statistics_fail_on_bad_date() {
        let server = get_test_server();
        let (token, _) = register_test_user(&server, "alice", "alice@example.com").await;

        let response = server
            .get(endpoints::DASHBOARD_STATISTICS)
            .authorization_bearer(&token)
            .add_query_param("from", "last tuesday")
            .await;

        response.assert_status_bad_request();
    }
}
