//! Converts an amount of money from one currency to another.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::WithRejection;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    currency::{CurrencyCode, ExchangeRateClient},
    timezone::local_today,
};

/// The smallest amount of money accepted anywhere in the API, one cent.
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The state needed to convert currencies.
#[derive(Clone)]
pub struct ConvertState {
    /// The source of exchange rates.
    pub rate_client: Arc<dyn ExchangeRateClient>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ConvertState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            rate_client: state.rate_client.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for converting an amount between currencies.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    /// The currency `amount` is given in.
    pub from_currency: String,
    /// The currency to convert `amount` into.
    pub to_currency: String,
    /// The amount of money to convert.
    pub amount: Decimal,
}

/// The result of converting an amount between currencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    /// The amount as given in the request.
    pub original_amount: Decimal,
    /// The normalised source currency.
    pub from_currency: CurrencyCode,
    /// `original_amount * rate` rounded to two decimal places.
    pub converted_amount: Decimal,
    /// The normalised target currency.
    pub to_currency: CurrencyCode,
    /// The exchange rate used.
    pub rate: Decimal,
    /// The date the conversion was performed.
    pub rate_date: Date,
}

/// Multiply `amount` by `rate` and round the result to cents, rounding
/// midpoints away from zero.
///
/// # Errors
///
/// Returns [Error::Validation] if the product does not fit in a decimal.
pub fn apply_rate(amount: Decimal, rate: Decimal) -> Result<Decimal, Error> {
    amount
        .checked_mul(rate)
        .map(|converted| converted.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| Error::Validation(format!("Amount {amount} is too large to convert")))
}

/// Convert `amount` from one currency to another using the rate given by `rate_client`.
///
/// The currency codes are validated and normalised to upper-case before the
/// rate is looked up.
///
/// # Errors
///
/// Returns:
/// - [Error::Validation] if a currency code is malformed or the amount is less than 0.01,
/// - [Error::RateUnavailable] if no rate is available for the currency pair.
pub async fn convert(
    request: ConvertRequest,
    rate_client: &dyn ExchangeRateClient,
    today: Date,
) -> Result<ConversionResponse, Error> {
    let from_currency = CurrencyCode::new(&request.from_currency)?;
    let to_currency = CurrencyCode::new(&request.to_currency)?;

    if request.amount < MIN_AMOUNT {
        return Err(Error::Validation(format!(
            "Amount must be at least {MIN_AMOUNT}, got {}",
            request.amount
        )));
    }

    let Some(rate) = rate_client
        .get_exchange_rate(&from_currency, &to_currency, None)
        .await
    else {
        return Err(Error::RateUnavailable {
            from: from_currency,
            to: to_currency,
        });
    };

    let converted_amount = apply_rate(request.amount, rate)?;

    Ok(ConversionResponse {
        original_amount: request.amount,
        from_currency,
        converted_amount,
        to_currency,
        rate,
        rate_date: today,
    })
}

/// A route handler for converting an amount between two currencies.
pub async fn convert_currency_endpoint(
    State(state): State<ConvertState>,
    WithRejection(Json(request), _): WithRejection<Json<ConvertRequest>, Error>,
) -> Result<Json<ConversionResponse>, Error> {
    let today = local_today(&state.local_timezone)?;

    tracing::debug!(
        "Converting {} {} to {}",
        request.amount,
        request.from_currency,
        request.to_currency
    );

    convert(request, state.rate_client.as_ref(), today)
        .await
        .map(Json)
}
