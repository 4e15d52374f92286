//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, log_in_endpoint, register_endpoint},
    category::get_categories_endpoint,
    currency::convert_currency_endpoint,
    dashboard::get_statistics_endpoint,
    endpoints,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        get_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// The transaction and dashboard routes require a valid bearer token.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(endpoints::CATEGORIES, get(get_categories_endpoint))
        .route(endpoints::CONVERT_CURRENCY, post(convert_currency_endpoint));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(get_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::DASHBOARD_STATISTICS,
            get(get_statistics_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::{endpoints, test_utils::get_test_server};

    #[tokio::test]
    async fn coffee_is_a_teapot() {
        let server = get_test_server();

        let response = server.get(endpoints::COFFEE).await;

        response.assert_status(StatusCode::IM_A_TEAPOT);
        response.assert_text("I'm a teapot");
    }

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let server = get_test_server();

        let response = server.get("/api/nothing-here").await;

        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let server = get_test_server();

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status_unauthorized();
        assert_eq!(response.json::<Value>()["status"], 401);
    }
}
