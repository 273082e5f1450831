//! Stronghold REST wire format.
//!
//! Private calls are signed POSTs that name the method in the path, public
//! market data is plain GET. Amounts and prices travel as strings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const ADD_ORDER_PATH: &str = "/0/private/AddOrder";
pub const CANCEL_ORDER_PATH: &str = "/0/private/CancelOrder";
pub const BALANCE_PATH: &str = "/0/private/Balance";
pub const OPEN_ORDERS_PATH: &str = "/0/private/OpenOrders";
pub const TRADES_HISTORY_PATH: &str = "/0/private/TradesHistory";
pub const WITHDRAW_INFO_PATH: &str = "/0/private/WithdrawInfo";
pub const WITHDRAW_PATH: &str = "/0/private/Withdraw";
pub const DEPOSIT_METHODS_PATH: &str = "/0/private/DepositMethods";
pub const DEPOSIT_ADDRESSES_PATH: &str = "/0/private/DepositAddresses";
pub const DEPTH_PATH: &str = "/0/public/Depth";
pub const TICKER_PATH: &str = "/0/public/Ticker";
pub const TRADES_PATH: &str = "/0/public/Trades";

#[derive(Debug, Clone, Serialize)]
pub struct AddOrderRequest<'a> {
    pub pair: &'a str,
    #[serde(rename = "type")]
    pub action: String,
    #[serde(rename = "ordertype")]
    pub order_type: String,
    pub volume: String,
    pub price: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddOrderResult {
    #[serde(default)]
    pub txid: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderRequest<'a> {
    pub txid: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrderResult {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub pending: bool,
}

/// Account balances, one field per listed asset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct BalanceResult {
    #[serde(default)]
    pub xlm: Option<String>,
    #[serde(default)]
    pub btc: Option<String>,
    #[serde(default)]
    pub eth: Option<String>,
    #[serde(default)]
    pub xrp: Option<String>,
    #[serde(default)]
    pub usd: Option<String>,
}

impl BalanceResult {
    /// Balance field for an asset code.
    pub fn field(&self, code: &str) -> Option<&str> {
        let value = match code {
            "XLM" => &self.xlm,
            "BTC" => &self.btc,
            "ETH" => &self.eth,
            "XRP" => &self.xrp,
            "USD" => &self.usd,
            _ => return None,
        };
        value.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderDescription {
    pub pair: String,
    #[serde(rename = "type")]
    pub action: String,
    #[serde(rename = "ordertype", default)]
    pub order_type: Option<String>,
    pub price: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenOrderRow {
    pub descr: OrderDescription,
    pub vol: String,
    #[serde(default)]
    pub vol_exec: Option<String>,
    /// Unix seconds, possibly fractional; 0 when unset.
    #[serde(default)]
    pub opentm: f64,
    #[serde(default)]
    pub starttm: f64,
    #[serde(default)]
    pub expiretm: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenOrdersResult {
    #[serde(default)]
    pub open: HashMap<String, OpenOrderRow>,
}

/// Unix seconds to milliseconds, `None` for the venue's 0.
pub fn seconds_to_ms(secs: f64) -> Option<i64> {
    (secs > 0.0).then(|| (secs * 1000.0) as i64)
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepthRow {
    pub price: String,
    pub amount: String,
    #[serde(default)]
    pub ts: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepthResult {
    #[serde(default)]
    pub asks: Vec<DepthRow>,
    #[serde(default)]
    pub bids: Vec<DepthRow>,
}

/// Ticker for one market; `a` and `b` lead with the best ask and bid.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerRow {
    pub a: Vec<String>,
    pub b: Vec<String>,
}

pub type TickerResult = HashMap<String, TickerRow>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TradesHistoryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRow {
    pub pair: String,
    /// Unix seconds, possibly fractional.
    pub time: f64,
    #[serde(rename = "type")]
    pub action: String,
    #[serde(rename = "ordertype")]
    pub order_type: String,
    pub price: String,
    pub vol: String,
    pub cost: String,
    pub fee: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradesHistoryResult {
    #[serde(default)]
    pub trades: HashMap<String, HistoryRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicTrade {
    pub price: String,
    pub volume: String,
    /// Unix milliseconds.
    pub time: i64,
    #[serde(default)]
    pub buy: bool,
    #[serde(default)]
    pub sell: bool,
    #[serde(default)]
    pub market: bool,
    #[serde(default)]
    pub limit: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradesResult {
    pub last: i64,
    #[serde(default)]
    pub trades: Vec<PublicTrade>,
}

/// Body shared by withdraw-info and withdraw.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawRequest<'a> {
    pub asset: &'a str,
    pub key: &'a str,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawInfoResult {
    pub limit: String,
    #[serde(default)]
    pub fee: Option<String>,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawResult {
    pub refid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositMethodsRequest<'a> {
    pub asset: &'a str,
}

/// Deposit limit: `false` for unlimited, otherwise an amount.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DepositLimit {
    Flag(bool),
    Amount(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositMethod {
    pub method: String,
    pub limit: DepositLimit,
    #[serde(default)]
    pub fee: Option<String>,
    #[serde(rename = "gen-address")]
    pub gen_address: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositAddressesRequest<'a> {
    pub asset: &'a str,
    pub method: &'a str,
    /// Only ever sent as `"true"`; the venue reads any value as a request
    /// for a new address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<&'static str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositAddress {
    pub address: String,
    /// Unix seconds; `"0"` when the address never expires.
    pub expiretm: String,
    #[serde(default)]
    pub new: bool,
}
