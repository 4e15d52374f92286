use std::{error::Error, net::SocketAddr, path::PathBuf, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use rusqlite::Connection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use budget_api::{
    AppState, FrankfurterClient, build_router, get_local_offset, graceful_shutdown,
    logging_middleware, seed_default_categories,
};

/// The REST API server for budget_api.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH", default_value = "budget.db")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Directory containing an SSL certificate `cert.pem` and key `key.pem`.
    /// The server uses plain HTTP if this is not set.
    #[arg(long, env = "CERT_PATH")]
    cert_path: Option<PathBuf>,

    /// The secret used to sign authentication tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// How many hours an authentication token is valid for.
    #[arg(long, env = "TOKEN_HOURS", default_value_t = 24)]
    token_hours: i64,

    /// The base URL of the Frankfurter exchange rate API.
    #[arg(long, env = "RATE_API_URL", default_value = FrankfurterClient::DEFAULT_BASE_URL)]
    rate_api_url: String,

    /// How many seconds to wait for the exchange rate API before giving up.
    #[arg(long, env = "RATE_TIMEOUT_SECS", default_value_t = FrankfurterClient::DEFAULT_TIMEOUT.as_secs())]
    rate_timeout_secs: u64,

    /// Comma separated origins allowed to make cross-origin requests, or "*"
    /// to allow any origin.
    #[arg(long, env = "CORS_ALLOW_ORIGINS", default_value = "*")]
    cors_allow_origins: String,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    if let Err(error) = run(args).await {
        tracing::error!("server stopped with an error: {error}");
        exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if get_local_offset(&args.timezone).is_none() {
        return Err(format!("Invalid timezone {}", args.timezone).into());
    }

    let rate_client = FrankfurterClient::new(
        &args.rate_api_url,
        std::time::Duration::from_secs(args.rate_timeout_secs),
    )?;

    let connection = Connection::open(&args.db_path)?;
    let state = AppState::new(
        connection,
        &args.jwt_secret,
        &args.timezone,
        Arc::new(rate_client),
    )?
    .with_token_duration(time::Duration::hours(args.token_hours));

    {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| "could not acquire database lock")?;
        seed_default_categories(&connection)?;
    }

    let router = build_router(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer(&args.cors_allow_origins)?);
    let router = add_tracing_layer(router);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    match args.cert_path {
        Some(cert_path) => {
            let tls_config = RustlsConfig::from_pem_file(
                cert_path.join("cert.pem"),
                cert_path.join("key.pem"),
            )
            .await?;

            tracing::info!("HTTPS server listening on {}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("HTTP server listening on {}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
    }

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn cors_layer(allow_origins: &str) -> Result<CorsLayer, Box<dyn Error>> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allow_origins.trim() == "*" {
        return Ok(layer.allow_origin(Any));
    }

    let origins = allow_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(layer.allow_origin(origins))
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
