//! quoteguard: maker-only safety filter and signed venue gateway.
//!
//! Wires the configured venue connector, gateway and submit filter together
//! and exposes the operations the command line drives:
//! - order book, ticker, balances and open orders for the configured pair
//! - maker-mode filtering of an operation batch

pub mod app;
pub mod config;
pub mod error;

pub use app::{build_gateway, Application, FilterBatch, FilterReport};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
