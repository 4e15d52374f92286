//! A REST API for tracking a personal budget.
//!
//! Users register and log in to receive a JSON Web Token, record income and
//! expense transactions against a fixed set of categories, view a dashboard
//! that totals their transactions over a date range, and convert amounts
//! between currencies using a live exchange rate.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod currency;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod error;
mod logging;
mod password;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, DEFAULT_TOKEN_DURATION, JwtKeys};
pub use category::{Category, CategoryType, seed_default_categories};
pub use currency::{CurrencyCode, ExchangeRateClient, FrankfurterClient};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{NewTransaction, Transaction, create_transaction};
pub use user::{NewUser, Role, User, UserID, create_user};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
