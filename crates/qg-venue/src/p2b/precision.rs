//! Default p2pb2b order constraints.

use qg_core::{OrderConstraints, PrecisionModel, TradingPair};
use rust_decimal_macros::dec;

/// Built-in constraint table; configuration may add or override entries.
pub fn default_precision() -> PrecisionModel {
    PrecisionModel::new(super::VENUE_NAME)
        .with(
            TradingPair::new("SHX", "USD"),
            OrderConstraints::new(8, 8, dec!(50)),
        )
        .with(
            TradingPair::new("SHX", "BTC"),
            OrderConstraints::new(8, 8, dec!(50)),
        )
        .with(
            TradingPair::new("SHX", "ETH"),
            OrderConstraints::new(8, 8, dec!(50)),
        )
        .with(
            TradingPair::new("ETH", "BTC"),
            OrderConstraints::new(5, 8, dec!(0.02)),
        )
        .with(
            TradingPair::new("XLM", "BTC"),
            OrderConstraints::new(8, 8, dec!(30)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let model = default_precision();
        assert_eq!(model.len(), 5);
        assert_eq!(
            model.lookup(&TradingPair::new("ETH", "BTC")),
            Some(OrderConstraints::new(5, 8, dec!(0.02)))
        );
        assert!(model.lookup(&TradingPair::new("DOGE", "USD")).is_none());
    }
}
