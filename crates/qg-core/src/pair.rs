//! Trading pair identification and per-pair order constraints.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Venue asset code (e.g. "XLM", "BTC").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Asset {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Ordered (base, quote) asset pair.
///
/// Key into the precision model and into venue order books.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: Asset,
    pub quote: Asset,
}

impl TradingPair {
    pub fn new(base: impl Into<Asset>, quote: impl Into<Asset>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Venue market string, e.g. `XLM_BTC` for delimiter `_`.
    pub fn to_market(&self, delimiter: &str) -> String {
        format!("{}{delimiter}{}", self.base, self.quote)
    }

    /// Parse a venue market string with a non-empty delimiter.
    pub fn from_market(market: &str, delimiter: &str) -> Result<Self> {
        if delimiter.is_empty() {
            return Err(CoreError::InvalidPair(format!(
                "cannot split {market:?} without a delimiter"
            )));
        }
        match market.split_once(delimiter) {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
                Ok(Self::new(base, quote))
            }
            _ => Err(CoreError::InvalidPair(format!(
                "{market:?} is not of the form BASE{delimiter}QUOTE"
            ))),
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Price/volume precision and minimum base volume for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConstraints {
    /// Fractional digits allowed in a price.
    pub price_precision: u32,
    /// Fractional digits allowed in a volume.
    pub volume_precision: u32,
    /// Minimum order volume in base units.
    pub min_base_volume: Decimal,
}

impl OrderConstraints {
    pub fn new(price_precision: u32, volume_precision: u32, min_base_volume: Decimal) -> Self {
        Self {
            price_precision,
            volume_precision,
            min_base_volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_string_round_trip() {
        let pair = TradingPair::new("xlm", "btc");
        assert_eq!(pair.to_market("_"), "XLM_BTC");
        assert_eq!(TradingPair::from_market("XLM_BTC", "_").unwrap(), pair);
    }

    #[test]
    fn test_from_market_rejects_malformed() {
        assert!(TradingPair::from_market("XLMBTC", "_").is_err());
        assert!(TradingPair::from_market("_BTC", "_").is_err());
        assert!(TradingPair::from_market("XLMBTC", "").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(TradingPair::new("ETH", "BTC").to_string(), "ETH/BTC");
    }
}
