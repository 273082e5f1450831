//! Ledger-side assets and the trader's resting offers.
//!
//! Offers on the ledger are expressed from the point of view of the asset
//! being sold: a buy of base is recorded as a sell of quote, with the price
//! as a ratio of buying per selling unit.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::order::OrderAction;

/// Asset as identified on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerAsset {
    Native,
    Credit { code: String, issuer: String },
}

impl LedgerAsset {
    pub fn credit(code: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self::Credit {
            code: code.into(),
            issuer: issuer.into(),
        }
    }
}

impl fmt::Display for LedgerAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Credit { code, issuer } => write!(f, "{code}:{issuer}"),
        }
    }
}

/// The (base, quote) assets the bot trades on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPair {
    pub base: LedgerAsset,
    pub quote: LedgerAsset,
}

impl LedgerPair {
    pub fn new(base: LedgerAsset, quote: LedgerAsset) -> Self {
        Self { base, quote }
    }

    /// Classify an offer by the assets it sells and buys.
    ///
    /// Selling base for quote is a sell; selling quote for base is a buy.
    pub fn action_of(&self, selling: &LedgerAsset, buying: &LedgerAsset) -> Result<OrderAction> {
        if *selling == self.base && *buying == self.quote {
            Ok(OrderAction::Sell)
        } else if *selling == self.quote && *buying == self.base {
            Ok(OrderAction::Buy)
        } else {
            Err(CoreError::UnknownValue(format!(
                "offer selling {selling} for {buying} does not match pair {}/{}",
                self.base, self.quote
            )))
        }
    }
}

/// Price as a ratio of two integers (numerator / denominator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRatio {
    pub n: i32,
    pub d: i32,
}

impl PriceRatio {
    pub fn new(n: i32, d: i32) -> Self {
        Self { n, d }
    }

    /// Exact decimal value `n / d`. Both parts must be positive.
    pub fn to_decimal(&self) -> Result<Decimal> {
        if self.n <= 0 || self.d <= 0 {
            return Err(CoreError::InvalidPrice(format!(
                "price ratio {}/{} must be positive",
                self.n, self.d
            )));
        }
        Ok(Decimal::from(self.n) / Decimal::from(self.d))
    }

    /// Exact decimal value of the inverted ratio, `d / n`.
    pub fn inverse_decimal(&self) -> Result<Decimal> {
        PriceRatio::new(self.d, self.n).to_decimal()
    }
}

impl fmt::Display for PriceRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.n, self.d)
    }
}

/// One of the trader's own offers resting on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOffer {
    pub id: u64,
    pub selling: LedgerAsset,
    pub buying: LedgerAsset,
    pub price: PriceRatio,
    /// Amount of the selling asset, as reported by the ledger.
    pub amount: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pair() -> LedgerPair {
        LedgerPair::new(LedgerAsset::Native, LedgerAsset::credit("BTC", "GISSUER"))
    }

    #[test]
    fn test_action_of() {
        let p = pair();
        assert_eq!(
            p.action_of(&p.base, &p.quote).unwrap(),
            OrderAction::Sell
        );
        assert_eq!(p.action_of(&p.quote, &p.base).unwrap(), OrderAction::Buy);
        assert!(p
            .action_of(&LedgerAsset::credit("ETH", "GOTHER"), &p.base)
            .is_err());
    }

    #[test]
    fn test_ratio_to_decimal() {
        assert_eq!(PriceRatio::new(1, 20).to_decimal().unwrap(), dec!(0.05));
        assert_eq!(PriceRatio::new(1, 20).inverse_decimal().unwrap(), dec!(20));
        assert!(PriceRatio::new(1, 0).to_decimal().is_err());
        assert!(PriceRatio::new(0, 5).inverse_decimal().is_err());
    }
}
