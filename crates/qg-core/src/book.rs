//! Order book data types.
//!
//! Order books are always fetched fresh from the venue and owned by the
//! caller that fetched them; nothing here is cached.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::number::Number;
use crate::order::OrderAction;
use crate::pair::TradingPair;

/// Aggregated (price, amount) point on one side of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub price: Number,
    pub amount: Number,
}

impl Level {
    pub fn new(price: Number, amount: Number) -> Self {
        Self { price, amount }
    }
}

/// Snapshot of both sides of a venue order book.
///
/// `asks` are ordered ascending by price and `bids` descending, i.e. both
/// best-to-worst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    pub pair: TradingPair,
    pub asks: Vec<Level>,
    pub bids: Vec<Level>,
}

impl OrderBook {
    pub fn new(pair: TradingPair, asks: Vec<Level>, bids: Vec<Level>) -> Self {
        Self { pair, asks, bids }
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }

    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    /// Side of the book that resting orders with `action` sit on.
    pub fn side(&self, action: OrderAction) -> &[Level] {
        match action {
            OrderAction::Sell => &self.asks,
            OrderAction::Buy => &self.bids,
        }
    }
}

/// Merge per-order book rows into price levels.
///
/// Rows must arrive best-first for the side `action` rests on: ascending
/// prices for sells, descending for buys. Rows at an equal rounded price
/// are summed into one level; a row priced behind the previous one is an
/// error.
pub fn aggregate_levels(
    rows: impl IntoIterator<Item = Level>,
    action: OrderAction,
) -> Result<Vec<Level>> {
    let mut levels: Vec<Level> = Vec::new();

    for row in rows {
        let Some(last) = levels.last_mut() else {
            levels.push(row);
            continue;
        };
        if row.price == last.price {
            last.amount = last.amount.add(&row.amount);
            continue;
        }
        let in_order = match action {
            OrderAction::Sell => row.price > last.price,
            OrderAction::Buy => row.price < last.price,
        };
        if !in_order {
            return Err(CoreError::UnsortedBook(format!(
                "{action} row at {} follows {}",
                row.price, last.price
            )));
        }
        levels.push(row);
    }

    Ok(levels)
}

/// Best bid and ask reported by the venue ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub ask_price: Number,
    pub bid_price: Number,
}
