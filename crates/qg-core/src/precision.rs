//! Per-pair precision lookup.

use std::collections::HashMap;

use tracing::warn;

use crate::pair::{OrderConstraints, TradingPair};

/// Maps trading pairs to their order constraints for one venue.
///
/// Unknown pairs are not an error here: `lookup` logs a warning and returns
/// `None`, leaving the caller to decide.
#[derive(Debug, Clone, Default)]
pub struct PrecisionModel {
    venue: String,
    table: HashMap<TradingPair, OrderConstraints>,
}

impl PrecisionModel {
    pub fn new(venue: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            table: HashMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, pair: TradingPair, constraints: OrderConstraints) -> Self {
        self.insert(pair, constraints);
        self
    }

    /// Insert or override the constraints for a pair.
    pub fn insert(&mut self, pair: TradingPair, constraints: OrderConstraints) {
        self.table.insert(pair, constraints);
    }

    pub fn lookup(&self, pair: &TradingPair) -> Option<OrderConstraints> {
        let found = self.table.get(pair).copied();
        if found.is_none() {
            warn!(venue = %self.venue, %pair, "No order constraints for trading pair");
        }
        found
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lookup_known_and_unknown() {
        let model = PrecisionModel::new("test").with(
            TradingPair::new("XLM", "BTC"),
            OrderConstraints::new(8, 8, dec!(30)),
        );

        let oc = model.lookup(&TradingPair::new("XLM", "BTC")).unwrap();
        assert_eq!(oc.price_precision, 8);
        assert!(model.lookup(&TradingPair::new("BTC", "XLM")).is_none());
    }

    #[test]
    fn test_insert_overrides() {
        let pair = TradingPair::new("ETH", "BTC");
        let mut model =
            PrecisionModel::new("test").with(pair.clone(), OrderConstraints::new(5, 8, dec!(0.02)));
        model.insert(pair.clone(), OrderConstraints::new(6, 8, dec!(0.02)));

        assert_eq!(model.len(), 1);
        assert_eq!(model.lookup(&pair).unwrap().price_precision, 6);
    }
}
