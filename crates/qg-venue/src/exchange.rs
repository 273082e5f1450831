//! The exchange capability set.

use std::collections::HashMap;

use qg_core::{
    Asset, CancelOrderResult, Number, OpenOrder, Order, OrderBook, OrderConstraints, Ticker,
    TradingPair, TransactionId,
};
use qg_gateway::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{VenueError, VenueResult};

/// One executed trade.
///
/// Public trade feeds carry no id, cost or fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub order: Order,
    pub id: Option<TransactionId>,
    pub cost: Option<Number>,
    pub fee: Option<Number>,
}

/// Trades in ascending time order plus the cursor to continue from.
///
/// `cursor` is `None` when nothing was returned and no start cursor was
/// given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeHistory {
    pub cursor: Option<String>,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawInfo {
    pub amount_to_receive: Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositInfo {
    pub address: String,
    pub fee: Number,
    pub expires_at_secs: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub withdrawal_id: String,
}

/// Order id returned for orders that were never sent.
pub const SIMULATED_ORDER_ID: &str = "simulated";

/// Reject an order carrying more digits than the pair allows.
pub(crate) fn check_order_precision(order: &Order, constraints: OrderConstraints) -> VenueResult<()> {
    if order.price.precision() > constraints.price_precision {
        return Err(VenueError::PrecisionExceeded(format!(
            "price precision can be a maximum of {}, got {} (value {})",
            constraints.price_precision,
            order.price.precision(),
            order.price
        )));
    }
    if order.volume.precision() > constraints.volume_precision {
        return Err(VenueError::PrecisionExceeded(format!(
            "volume precision can be a maximum of {}, got {} (value {})",
            constraints.volume_precision,
            order.volume.precision(),
            order.volume
        )));
    }
    Ok(())
}

fn not_supported<'a, T: Send + 'a>(capability: &'static str) -> BoxFuture<'a, VenueResult<T>> {
    warn!(capability, "Venue capability not supported");
    Box::pin(async move { Err(VenueError::NotSupported(capability)) })
}

/// Everything a strategy can ask of a venue.
///
/// The trading and market-data methods are required; account transfer and
/// trade history methods default to [`VenueError::NotSupported`].
pub trait Exchange: Send + Sync {
    /// Short venue name for logs.
    fn name(&self) -> &str;

    fn add_order<'a>(&'a self, order: &'a Order) -> BoxFuture<'a, VenueResult<TransactionId>>;

    fn cancel_order<'a>(
        &'a self,
        id: &'a TransactionId,
        pair: &'a TradingPair,
    ) -> BoxFuture<'a, VenueResult<CancelOrderResult>>;

    /// Total (available + locked) balance for each requested asset the venue
    /// reports. Assets the venue does not know are omitted.
    fn get_account_balances<'a>(
        &'a self,
        assets: &'a [Asset],
    ) -> BoxFuture<'a, VenueResult<HashMap<Asset, Number>>>;

    fn get_order_constraints(&self, pair: &TradingPair) -> Option<OrderConstraints>;

    /// Both sides of the book, `max_count` levels each, best first.
    fn get_order_book<'a>(
        &'a self,
        pair: &'a TradingPair,
        max_count: usize,
    ) -> BoxFuture<'a, VenueResult<OrderBook>>;

    fn get_open_orders<'a>(
        &'a self,
        pairs: &'a [TradingPair],
    ) -> BoxFuture<'a, VenueResult<HashMap<TradingPair, Vec<OpenOrder>>>>;

    fn get_ticker_price<'a>(
        &'a self,
        pairs: &'a [TradingPair],
    ) -> BoxFuture<'a, VenueResult<HashMap<TradingPair, Ticker>>>;

    /// Cursor marking "now" for trade polling.
    fn get_latest_trade_cursor(&self) -> VenueResult<String>;

    fn get_trade_history<'a>(
        &'a self,
        _pair: &'a TradingPair,
        _cursor_start: Option<&'a str>,
        _cursor_end: Option<&'a str>,
    ) -> BoxFuture<'a, VenueResult<TradeHistory>> {
        not_supported("get_trade_history")
    }

    fn get_trades<'a>(
        &'a self,
        _pair: &'a TradingPair,
        _cursor: Option<&'a str>,
    ) -> BoxFuture<'a, VenueResult<TradeHistory>> {
        not_supported("get_trades")
    }

    fn get_withdraw_info<'a>(
        &'a self,
        _asset: &'a Asset,
        _amount: Number,
        _address: &'a str,
    ) -> BoxFuture<'a, VenueResult<WithdrawInfo>> {
        not_supported("get_withdraw_info")
    }

    fn prepare_deposit<'a>(
        &'a self,
        _asset: &'a Asset,
        _amount: Number,
    ) -> BoxFuture<'a, VenueResult<DepositInfo>> {
        not_supported("prepare_deposit")
    }

    fn withdraw_funds<'a>(
        &'a self,
        _asset: &'a Asset,
        _amount: Number,
        _address: &'a str,
    ) -> BoxFuture<'a, VenueResult<WithdrawalReceipt>> {
        not_supported("withdraw_funds")
    }
}
