//! Venue error types.

use qg_core::CoreError;
use qg_gateway::GatewayError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("{0} is not supported by this venue")]
    NotSupported(&'static str),

    #[error("No order constraints for trading pair {0}")]
    UnknownPair(String),

    #[error("Precision exceeded: {0}")]
    PrecisionExceeded(String),

    #[error("Invalid order id {0:?}")]
    InvalidOrderId(String),

    #[error("Unknown venue kind: {0}")]
    UnknownVenue(String),

    #[error("Venue configuration error: {0}")]
    Config(String),

    #[error("Unexpected venue response: {0}")]
    UnexpectedResponse(String),

    #[error("No withdrawal key registered for {asset} address {address}")]
    UnknownWithdrawKey { asset: String, address: String },

    #[error("Withdrawal of {amount} exceeds the limit of {limit}")]
    WithdrawAmountAboveLimit { amount: Decimal, limit: Decimal },

    #[error("Withdrawal of {amount} does not cover the fee of {fee}")]
    WithdrawAmountInvalid { amount: Decimal, fee: Decimal },

    #[error("Deposit of {amount} exceeds the limit of {limit}")]
    DepositAmountAboveLimit { amount: Decimal, limit: Decimal },

    #[error("Too many deposit addresses on the account")]
    TooManyDepositAddresses,
}

impl VenueError {
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }
}

pub type VenueResult<T> = Result<T, VenueError>;
