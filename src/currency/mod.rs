//! Currency codes, exchange rate lookup and currency conversion.

mod code;
mod convert;
mod rate;

pub use code::CurrencyCode;
pub use convert::{
    ConversionResponse, ConvertRequest, ConvertState, MIN_AMOUNT, apply_rate, convert,
    convert_currency_endpoint,
};
pub use rate::{ExchangeRateClient, FrankfurterClient};
