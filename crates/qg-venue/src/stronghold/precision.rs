//! Default Stronghold order constraints.

use qg_core::{OrderConstraints, PrecisionModel, TradingPair};
use rust_decimal_macros::dec;

pub fn default_precision() -> PrecisionModel {
    PrecisionModel::new(super::VENUE_NAME)
        .with(
            TradingPair::new("XLM", "USD"),
            OrderConstraints::new(6, 8, dec!(30)),
        )
        .with(
            TradingPair::new("XLM", "BTC"),
            OrderConstraints::new(8, 8, dec!(30)),
        )
        .with(
            TradingPair::new("BTC", "USD"),
            OrderConstraints::new(1, 8, dec!(0.002)),
        )
        .with(
            TradingPair::new("ETH", "USD"),
            OrderConstraints::new(2, 8, dec!(0.02)),
        )
        .with(
            TradingPair::new("ETH", "BTC"),
            OrderConstraints::new(5, 8, dec!(0.02)),
        )
        .with(
            TradingPair::new("XRP", "USD"),
            OrderConstraints::new(5, 8, dec!(30)),
        )
        .with(
            TradingPair::new("XRP", "BTC"),
            OrderConstraints::new(8, 8, dec!(30)),
        )
}
