//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{id}', use [format_endpoint].

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for listing categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route for converting an amount between currencies.
pub const CONVERT_CURRENCY: &str = "/api/currency/convert";
/// The route for the dashboard summary.
pub const DASHBOARD_STATISTICS: &str = "/api/dashboard/statistics";
/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is the text between a left brace and the next right brace,
/// e.g. '{id}' in '/api/transactions/{id}'. Only the first parameter is
/// replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{id}{}",
        &endpoint_path[..param_start],
        &endpoint_path[param_end..]
    )
}
