//! p2pb2b REST wire format.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const BALANCES_PATH: &str = "/api/v1/account/balances";
pub const ORDERS_PATH: &str = "/api/v1/orders";
pub const ORDER_NEW_PATH: &str = "/api/v1/order/new";
pub const ORDER_CANCEL_PATH: &str = "/api/v1/order/cancel";
pub const TICKER_PATH: &str = "/api/v1/public/ticker";
pub const BOOK_PATH: &str = "/api/v1/public/book";

/// Rows per page for paginated endpoints.
pub const PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceItem {
    pub available: String,
    pub freeze: String,
}

pub type BalancesResult = HashMap<String, BalanceItem>;

/// Order row, shared by the open-orders and order-book endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueOrder {
    #[serde(rename = "orderId", alias = "id", default)]
    pub id: u64,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub amount: String,
    /// Unfilled amount.
    #[serde(default)]
    pub left: Option<String>,
    #[serde(rename = "type", default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    /// Unix seconds, possibly fractional.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl VenueOrder {
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.timestamp.map(|secs| (secs * 1000.0) as i64)
    }
}

/// One page of a paginated order listing.
///
/// Open orders arrive under `records`, book entries under `orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersPage {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub orders: Option<Vec<VenueOrder>>,
    #[serde(default)]
    pub records: Option<Vec<VenueOrder>>,
}

impl OrdersPage {
    pub fn into_rows(self) -> Vec<VenueOrder> {
        self.records.or(self.orders).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TickerResult {
    pub bid: String,
    pub ask: String,
    #[serde(default)]
    pub last: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrdersRequest<'a> {
    pub market: &'a str,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest<'a> {
    pub market: &'a str,
    pub amount: String,
    pub side: &'a str,
    pub price: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderRequest<'a> {
    pub market: &'a str,
    #[serde(rename = "orderId")]
    pub order_id: u64,
}
