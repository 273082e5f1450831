//! Core domain types for the quoteguard maker bot.
//!
//! This crate provides the types shared by the gateway, the venue
//! connectors and the submit filters:
//! - `Number`: decimal value with an explicit precision
//! - `TradingPair`, `OrderConstraints`, `PrecisionModel`: per-pair precision
//! - `Level`, `OrderBook`, `Ticker`: venue market data
//! - `Order`, `OpenOrder`, `TransactionId`: venue order types
//! - `Operation`, `RestingOffer`, `LedgerAsset`: ledger-side offer management

pub mod book;
pub mod error;
pub mod ledger;
pub mod number;
pub mod operation;
pub mod order;
pub mod pair;
pub mod precision;

pub use book::{aggregate_levels, Level, OrderBook, Ticker};
pub use error::{CoreError, Result};
pub use ledger::{LedgerAsset, LedgerPair, PriceRatio, RestingOffer};
pub use number::Number;
pub use operation::{CancelOffer, ManageOffer, Operation};
pub use order::{CancelOrderResult, OpenOrder, Order, OrderAction, OrderType, TransactionId};
pub use pair::{Asset, OrderConstraints, TradingPair};
pub use precision::PrecisionModel;
