//! Filter error types.

use qg_core::{CoreError, Number, OrderAction, PriceRatio};
use qg_venue::VenueError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Could not fetch order book: {0}")]
    Venue(#[from] VenueError),

    #[error("Invalid ordering of {side} offers: {price} after {last}")]
    InvalidOrdering {
        side: OrderAction,
        last: Number,
        price: Number,
    },

    #[error("Offer does not trade the configured pair: {0}")]
    UnknownAsset(String),

    #[error("Unable to transform offer {offer_id} (amount {amount}, price {price})")]
    Untransformable {
        offer_id: u64,
        amount: Decimal,
        price: PriceRatio,
    },

    #[error("No order constraints for trading pair {0}")]
    MissingConstraints(String),
}

pub type FilterResult<T> = Result<T, FilterError>;
