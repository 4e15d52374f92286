//! Looks up exchange rates from an external rate provider.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::currency::CurrencyCode;

/// A source of exchange rates between two currencies.
///
/// Implementations never fail: a missing rate and a transport failure are both
/// reported as `None`.
#[async_trait]
pub trait ExchangeRateClient: Send + Sync {
    /// Get the rate for converting one unit of `from` into `to`.
    ///
    /// `date` asks for the rate as of that date. Implementations may ignore it
    /// and return the latest rate.
    async fn get_exchange_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: Option<Date>,
    ) -> Option<Decimal>;
}

/// The body returned by the `/latest` endpoint of a Frankfurter-style API.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

/// Fetches the latest rates from a Frankfurter-style HTTP API
/// (e.g. <https://api.frankfurter.app>).
#[derive(Debug, Clone)]
pub struct FrankfurterClient {
    client: reqwest::Client,
    base_url: String,
}

impl FrankfurterClient {
    /// The public Frankfurter API.
    pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

    /// How long to wait for the provider before treating the rate as unavailable.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a client for the provider at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client could not be built, e.g.
    /// because the TLS backend failed to initialise.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("budget_api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn fetch_latest(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Option<Decimal>, reqwest::Error> {
        let response = self
            .client
            .get(format!("{}/latest", self.base_url))
            .query(&[("from", from.as_ref()), ("to", to.as_ref())])
            .send()
            .await?
            .error_for_status()?
            .json::<LatestRatesResponse>()
            .await?;

        Ok(response.rates.get(to.as_ref()).copied())
    }
}

#[async_trait]
impl ExchangeRateClient for FrankfurterClient {
    async fn get_exchange_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        // Only the latest rate is ever requested.
        _date: Option<Date>,
    ) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }

        match self.fetch_latest(from, to).await {
            Ok(Some(rate)) if rate > Decimal::ZERO => Some(rate),
            Ok(Some(rate)) => {
                tracing::warn!("Rate provider returned non-positive rate {rate} for {from} -> {to}");
                None
            }
            Ok(None) => {
                tracing::warn!("Rate provider has no rate for {from} -> {to}");
                None
            }
            Err(error) => {
                tracing::warn!("Could not fetch exchange rate for {from} -> {to}: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{Json, Router, http::StatusCode, routing::get};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::macros::date;
    use tokio::net::TcpListener;

    use crate::currency::{CurrencyCode, ExchangeRateClient, FrankfurterClient};

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn spawn_provider(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind test listener");
        let address = listener.local_addr().expect("Could not get local address");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test provider stopped unexpectedly");
        });

        format!("http://{address}")
    }

    fn eur_to_ron_router() -> Router {
        Router::new().route(
            "/latest",
            get(|| async {
                Json(json!({
                    "amount": 1.0,
                    "base": "EUR",
                    "date": "2025-01-24",
                    "rates": { "RON": 4.9766 }
                }))
            }),
        )
    }

    fn code(code: &str) -> CurrencyCode {
        CurrencyCode::new(code).unwrap()
    }

    #[tokio::test]
    async fn same_currency_returns_one_without_network_call() {
        // Nothing listens on this address, so any request would fail.
        let client =
            FrankfurterClient::new("http://127.0.0.1:1", Duration::from_millis(100)).unwrap();

        let rate = client
            .get_exchange_rate(&code("usd"), &code("USD"), None)
            .await;

        assert_eq!(rate, Some(Decimal::ONE));
    }

    #[tokio::test]
    async fn returns_rate_from_provider() {
        let base_url = spawn_provider(eur_to_ron_router()).await;
        let client = FrankfurterClient::new(&base_url, Duration::from_secs(2)).unwrap();

        let rate = client
            .get_exchange_rate(&code("EUR"), &code("RON"), None)
            .await;

        assert_eq!(rate, Some(dec!(4.9766)));
    }

    #[tokio::test]
    async fn date_is_ignored() {
        let base_url = spawn_provider(eur_to_ron_router()).await;
        let client = FrankfurterClient::new(&base_url, Duration::from_secs(2)).unwrap();

        let rate = client
            .get_exchange_rate(&code("EUR"), &code("RON"), Some(date!(2020 - 03 - 01)))
            .await;

        assert_eq!(rate, Some(dec!(4.9766)));
    }

    #[tokio::test]
    async fn missing_target_key_is_unavailable() {
        let base_url = spawn_provider(eur_to_ron_router()).await;
        let client = FrankfurterClient::new(&base_url, Duration::from_secs(2)).unwrap();

        let rate = client
            .get_exchange_rate(&code("EUR"), &code("USD"), None)
            .await;

        assert_eq!(rate, None);
    }

    #[tokio::test]
    async fn malformed_body_is_unavailable() {
        let router = Router::new().route("/latest", get(|| async { "definitely not JSON" }));
        let base_url = spawn_provider(router).await;
        let client = FrankfurterClient::new(&base_url, Duration::from_secs(2)).unwrap();

        let rate = client
            .get_exchange_rate(&code("EUR"), &code("RON"), None)
            .await;

        assert_eq!(rate, None);
    }

    #[tokio::test]
    async fn error_status_is_unavailable() {
        let router = Router::new().route(
            "/latest",
            get(|| async { (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))) }),
        );
        let base_url = spawn_provider(router).await;
        let client = FrankfurterClient::new(&base_url, Duration::from_secs(2)).unwrap();

        let rate = client
            .get_exchange_rate(&code("EUR"), &code("XXX"), None)
            .await;

        assert_eq!(rate, None);
    }

    #[tokio::test]
    async fn non_positive_rate_is_unavailable() {
        let router = Router::new().route(
            "/latest",
            get(|| async { Json(json!({"rates": { "RON": 0 }})) }),
        );
        let base_url = spawn_provider(router).await;
        let client = FrankfurterClient::new(&base_url, Duration::from_secs(2)).unwrap();

        let rate = client
            .get_exchange_rate(&code("EUR"), &code("RON"), None)
            .await;

        assert_eq!(rate, None);
    }

    #[tokio::test]
    async fn timeout_is_unavailable() {
        let router = Router::new().route(
            "/latest",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"rates": { "RON": 4.9766 }}))
            }),
        );
        let base_url = spawn_provider(router).await;
        let client = FrankfurterClient::new(&base_url, Duration::from_millis(100)).unwrap();

        let rate = client
            .get_exchange_rate(&code("EUR"), &code("RON"), None)
            .await;

        assert_eq!(rate, None);
    }

    #[tokio::test]
    async fn unreachable_provider_is_unavailable() {
        let client =
            FrankfurterClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();

        let rate = client
            .get_exchange_rate(&code("EUR"), &code("RON"), None)
            .await;

        assert_eq!(rate, None);
    }
}
