//! Venue connectors.
//!
//! [`Exchange`] is the full capability set a trading strategy may use
//! against a venue. Connectors implement what the venue offers and report
//! [`VenueError::NotSupported`] for the rest.

pub mod error;
pub mod exchange;
pub mod factory;
pub mod p2b;
pub mod stronghold;

pub use error::{VenueError, VenueResult};
pub use exchange::{
    DepositInfo, Exchange, Trade, TradeHistory, WithdrawInfo, WithdrawalReceipt, SIMULATED_ORDER_ID,
};
pub use factory::{make_exchange, ExchangeOptions, VenueKind};
pub use p2b::P2bExchange;
pub use stronghold::{StrongholdExchange, WithdrawKeys};
