//! Stronghold connector.
//!
//! Market names join base and quote with no delimiter (`XLMBTC`). Funds
//! only leave the account for addresses registered under a withdrawal key,
//! so the connector carries an asset to address to key table.

mod precision;
pub mod wire;

use std::collections::HashMap;
use std::sync::Arc;

use qg_core::{
    aggregate_levels, Asset, CancelOrderResult, CoreError, Level, Number, OpenOrder, Order,
    OrderAction, OrderBook, OrderConstraints, OrderType, PrecisionModel, Ticker, TradingPair,
    TransactionId,
};
use qg_gateway::{BoxFuture, Gateway, GatewayError};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{VenueError, VenueResult};
use crate::exchange::{
    check_order_precision, DepositInfo, Exchange, Trade, TradeHistory, WithdrawInfo,
    WithdrawalReceipt, SIMULATED_ORDER_ID,
};
use wire::{
    seconds_to_ms, AddOrderRequest, AddOrderResult, BalanceResult, CancelOrderRequest,
    DepositAddress, DepositAddressesRequest, DepositLimit, DepositMethod, DepositMethodsRequest,
    DepthResult, DepthRow, OpenOrderRow, OpenOrdersResult, PublicTrade, TickerResult,
    TradesHistoryRequest, TradesHistoryResult, TradesResult, WithdrawInfoResult, WithdrawRequest,
    WithdrawResult, ADD_ORDER_PATH, BALANCE_PATH, CANCEL_ORDER_PATH, DEPOSIT_ADDRESSES_PATH,
    DEPOSIT_METHODS_PATH, DEPTH_PATH, OPEN_ORDERS_PATH, TICKER_PATH, TRADES_HISTORY_PATH,
    TRADES_PATH, WITHDRAW_INFO_PATH, WITHDRAW_PATH,
};

pub use precision::default_precision;

pub const VENUE_NAME: &str = "stronghold";
pub const DEFAULT_BASE_URL: &str = "https://api.stronghold.co";
pub const DEFAULT_DELIMITER: &str = "";

const BALANCE_PRECISION: u32 = 10;

/// Failure text the venue uses once an account holds its maximum number of
/// deposit addresses.
const TOO_MANY_ADDRESSES: &str = "Too many addresses";

/// Withdrawal keys by asset, then destination address.
#[derive(Debug, Clone, Default)]
pub struct WithdrawKeys(HashMap<Asset, HashMap<String, String>>);

impl WithdrawKeys {
    pub fn insert(&mut self, asset: Asset, address: impl Into<String>, key: impl Into<String>) {
        self.0
            .entry(asset)
            .or_default()
            .insert(address.into(), key.into());
    }

    pub fn key(&self, asset: &Asset, address: &str) -> VenueResult<&str> {
        self.0
            .get(asset)
            .and_then(|keys| keys.get(address))
            .map(String::as_str)
            .ok_or_else(|| VenueError::UnknownWithdrawKey {
                asset: asset.to_string(),
                address: address.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.0.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn decimal_field(raw: &str, field: &str) -> VenueResult<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| CoreError::InvalidNumber(format!("{field} {raw:?}: {e}")).into())
}

pub struct StrongholdExchange {
    gateway: Arc<Gateway>,
    precision: PrecisionModel,
    delimiter: String,
    withdraw_keys: WithdrawKeys,
    simulated: bool,
}

impl StrongholdExchange {
    pub fn new(gateway: Arc<Gateway>, precision: PrecisionModel) -> Self {
        Self {
            gateway,
            precision,
            delimiter: DEFAULT_DELIMITER.to_string(),
            withdraw_keys: WithdrawKeys::default(),
            simulated: false,
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    #[must_use]
    pub fn with_withdraw_keys(mut self, keys: WithdrawKeys) -> Self {
        self.withdraw_keys = keys;
        self
    }

    /// In simulated mode orders are accepted and cancelled locally.
    #[must_use]
    pub fn simulated(mut self, simulated: bool) -> Self {
        self.simulated = simulated;
        self
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    fn market(&self, pair: &TradingPair) -> String {
        pair.to_market(&self.delimiter)
    }

    fn constraints(&self, pair: &TradingPair) -> VenueResult<OrderConstraints> {
        self.precision
            .lookup(pair)
            .ok_or_else(|| VenueError::UnknownPair(pair.to_string()))
    }

    async fn post<T, R>(&self, path: &str, fields: &R) -> VenueResult<T>
    where
        T: serde::de::DeserializeOwned,
        R: Serialize,
    {
        let fields =
            serde_json::to_value(fields).map_err(|e| GatewayError::Encode(e.to_string()))?;
        Ok(self.gateway.post(path, fields).await?)
    }

    async fn deposit_addresses(
        &self,
        asset: &str,
        method: &str,
        generate: bool,
    ) -> VenueResult<Vec<DepositAddress>> {
        let request = DepositAddressesRequest {
            asset,
            method,
            new: generate.then_some("true"),
        };
        match self.post(DEPOSIT_ADDRESSES_PATH, &request).await {
            Err(VenueError::Gateway(GatewayError::Unsuccessful(message)))
                if message.contains(TOO_MANY_ADDRESSES) =>
            {
                Err(VenueError::TooManyDepositAddresses)
            }
            other => other,
        }
    }

    fn trade_from_history(
        &self,
        id: &str,
        pair: &TradingPair,
        row: &wire::HistoryRow,
        constraints: OrderConstraints,
    ) -> VenueResult<Trade> {
        let fee_precision = constraints
            .price_precision
            .max(constraints.volume_precision);
        Ok(Trade {
            order: Order {
                pair: pair.clone(),
                action: row.action.parse()?,
                order_type: row.order_type.parse()?,
                price: Number::from_str_with_precision(&row.price, constraints.price_precision)?,
                volume: Number::from_str_with_precision(&row.vol, constraints.volume_precision)?,
                timestamp_ms: Some((row.time * 1000.0) as i64),
            },
            id: Some(TransactionId::new(id)),
            cost: Some(Number::from_str_with_precision(&row.cost, fee_precision)?),
            fee: Some(Number::from_str_with_precision(&row.fee, fee_precision)?),
        })
    }
}

fn levels_from_rows(
    rows: &[DepthRow],
    side: OrderAction,
    max_count: usize,
    constraints: OrderConstraints,
) -> VenueResult<Vec<Level>> {
    let levels = rows
        .iter()
        .take(max_count)
        .map(|row| -> VenueResult<Level> {
            Ok(Level::new(
                Number::from_str_with_precision(&row.price, constraints.price_precision)?,
                Number::from_str_with_precision(&row.amount, constraints.volume_precision)?,
            ))
        })
        .collect::<VenueResult<Vec<_>>>()?;
    Ok(aggregate_levels(levels, side)?)
}

fn open_order_from_row(
    id: &str,
    pair: &TradingPair,
    row: &OpenOrderRow,
    constraints: OrderConstraints,
) -> VenueResult<OpenOrder> {
    let order_type: OrderType = match row.descr.order_type.as_deref() {
        Some(t) => t.parse()?,
        None => OrderType::Limit,
    };
    let volume_executed = match row.vol_exec.as_deref() {
        Some(v) => Number::from_str_with_precision(v, constraints.volume_precision)?,
        None => Number::zero(constraints.volume_precision),
    };

    Ok(OpenOrder {
        order: Order {
            pair: pair.clone(),
            action: row.descr.action.parse()?,
            order_type,
            price: Number::from_str_with_precision(&row.descr.price, constraints.price_precision)?,
            volume: Number::from_str_with_precision(&row.vol, constraints.volume_precision)?,
            timestamp_ms: seconds_to_ms(row.opentm),
        },
        id: TransactionId::new(id),
        start_time_ms: seconds_to_ms(row.starttm),
        expire_time_ms: seconds_to_ms(row.expiretm),
        volume_executed,
    })
}

fn trade_from_public(
    pair: &TradingPair,
    row: &PublicTrade,
    constraints: OrderConstraints,
) -> VenueResult<Trade> {
    let action = match (row.buy, row.sell) {
        (true, _) => OrderAction::Buy,
        (false, true) => OrderAction::Sell,
        (false, false) => {
            return Err(VenueError::UnexpectedResponse(format!(
                "trade at {} has neither buy nor sell flag",
                row.time
            )))
        }
    };
    let order_type = match (row.market, row.limit) {
        (true, _) => OrderType::Market,
        (false, true) => OrderType::Limit,
        (false, false) => {
            return Err(VenueError::UnexpectedResponse(format!(
                "trade at {} has neither market nor limit flag",
                row.time
            )))
        }
    };

    Ok(Trade {
        order: Order {
            pair: pair.clone(),
            action,
            order_type,
            price: Number::from_str_with_precision(&row.price, constraints.price_precision)?,
            volume: Number::from_str_with_precision(&row.volume, constraints.volume_precision)?,
            timestamp_ms: Some(row.time),
        },
        id: None,
        cost: None,
        fee: None,
    })
}

/// Last unused address in the venue's listing.
fn pick_new_address(addresses: Vec<DepositAddress>) -> Option<DepositAddress> {
    addresses.into_iter().filter(|a| a.new).last()
}

impl Exchange for StrongholdExchange {
    fn name(&self) -> &str {
        VENUE_NAME
    }

    fn add_order<'a>(&'a self, order: &'a Order) -> BoxFuture<'a, VenueResult<TransactionId>> {
        Box::pin(async move {
            let market = self.market(&order.pair);

            if self.simulated {
                info!(
                    %market,
                    action = %order.action,
                    price = %order.price,
                    volume = %order.volume,
                    "Simulated mode, not adding order"
                );
                return Ok(TransactionId::new(SIMULATED_ORDER_ID));
            }

            check_order_precision(order, self.constraints(&order.pair)?)?;

            let request = AddOrderRequest {
                pair: &market,
                action: order.action.to_string(),
                order_type: order.order_type.to_string(),
                volume: order.volume.as_string(),
                price: order.price.as_string(),
            };
            let created: AddOrderResult = self.post(ADD_ORDER_PATH, &request).await?;
            match created.txid.as_slice() {
                [id] => {
                    debug!(%market, order_id = %id, "Order created");
                    Ok(TransactionId::new(id.clone()))
                }
                [] => Err(VenueError::UnexpectedResponse(
                    "no transaction id returned for new order".to_string(),
                )),
                ids => Err(VenueError::UnexpectedResponse(format!(
                    "{} transaction ids returned for one order: {ids:?}",
                    ids.len()
                ))),
            }
        })
    }

    fn cancel_order<'a>(
        &'a self,
        id: &'a TransactionId,
        pair: &'a TradingPair,
    ) -> BoxFuture<'a, VenueResult<CancelOrderResult>> {
        Box::pin(async move {
            if self.simulated {
                info!(order_id = %id, "Simulated mode, not cancelling order");
                return Ok(CancelOrderResult::Cancelled);
            }

            debug!(order_id = %id, %pair, "Cancelling order");
            let request = CancelOrderRequest { txid: id.as_str() };
            let res: wire::CancelOrderResult = self.post(CANCEL_ORDER_PATH, &request).await?;
            if res.count > 1 {
                warn!(order_id = %id, count = res.count, "Cancel matched more than one order");
            }

            Ok(match (res.count, res.pending) {
                (0, _) => CancelOrderResult::Failed,
                (_, true) => CancelOrderResult::Pending,
                (_, false) => CancelOrderResult::Cancelled,
            })
        })
    }

    fn get_account_balances<'a>(
        &'a self,
        assets: &'a [Asset],
    ) -> BoxFuture<'a, VenueResult<HashMap<Asset, Number>>> {
        Box::pin(async move {
            let balances: BalanceResult = self.post(BALANCE_PATH, &serde_json::json!({})).await?;

            let mut out = HashMap::with_capacity(assets.len());
            for asset in assets {
                let Some(raw) = balances.field(asset.code()) else {
                    debug!(%asset, "Venue reports no balance for asset");
                    continue;
                };
                out.insert(
                    asset.clone(),
                    Number::from_str_with_precision(raw, BALANCE_PRECISION)?,
                );
            }
            Ok(out)
        })
    }

    fn get_order_constraints(&self, pair: &TradingPair) -> Option<OrderConstraints> {
        self.precision.lookup(pair)
    }

    fn get_order_book<'a>(
        &'a self,
        pair: &'a TradingPair,
        max_count: usize,
    ) -> BoxFuture<'a, VenueResult<OrderBook>> {
        Box::pin(async move {
            let constraints = self.constraints(pair)?;
            let market = self.market(pair);
            let query = vec![
                ("pair".to_string(), market.clone()),
                ("count".to_string(), max_count.to_string()),
            ];
            let depth: DepthResult = self.gateway.get(DEPTH_PATH, &query).await?;

            let asks = levels_from_rows(&depth.asks, OrderAction::Sell, max_count, constraints)?;
            let bids = levels_from_rows(&depth.bids, OrderAction::Buy, max_count, constraints)?;

            debug!(%market, asks = asks.len(), bids = bids.len(), "Fetched order book");
            Ok(OrderBook::new(pair.clone(), asks, bids))
        })
    }

    fn get_open_orders<'a>(
        &'a self,
        pairs: &'a [TradingPair],
    ) -> BoxFuture<'a, VenueResult<HashMap<TradingPair, Vec<OpenOrder>>>> {
        Box::pin(async move {
            let listing: OpenOrdersResult =
                self.post(OPEN_ORDERS_PATH, &serde_json::json!({})).await?;

            let markets: HashMap<String, &TradingPair> =
                pairs.iter().map(|p| (self.market(p), p)).collect();
            let mut out: HashMap<TradingPair, Vec<OpenOrder>> =
                pairs.iter().map(|p| (p.clone(), Vec::new())).collect();

            for (id, row) in &listing.open {
                let Some(pair) = markets.get(&row.descr.pair) else {
                    continue;
                };
                let order = open_order_from_row(id, pair, row, self.constraints(pair)?)?;
                out.entry((*pair).clone()).or_default().push(order);
            }
            for orders in out.values_mut() {
                orders.sort_by(|a, b| {
                    (a.order.timestamp_ms, a.id.as_str()).cmp(&(b.order.timestamp_ms, b.id.as_str()))
                });
            }
            Ok(out)
        })
    }

    fn get_ticker_price<'a>(
        &'a self,
        pairs: &'a [TradingPair],
    ) -> BoxFuture<'a, VenueResult<HashMap<TradingPair, Ticker>>> {
        Box::pin(async move {
            let markets: Vec<String> = pairs.iter().map(|p| self.market(p)).collect();
            let query = vec![("pair".to_string(), markets.join(","))];
            let tickers: TickerResult = self.gateway.get(TICKER_PATH, &query).await?;

            let mut out = HashMap::with_capacity(pairs.len());
            for (pair, market) in pairs.iter().zip(&markets) {
                let constraints = self.constraints(pair)?;
                let row = tickers.get(market).ok_or_else(|| {
                    VenueError::UnexpectedResponse(format!("no ticker for {market}"))
                })?;
                let (Some(ask), Some(bid)) = (row.a.first(), row.b.first()) else {
                    return Err(VenueError::UnexpectedResponse(format!(
                        "empty ticker for {market}"
                    )));
                };
                out.insert(
                    pair.clone(),
                    Ticker {
                        ask_price: Number::from_str_with_precision(
                            ask,
                            constraints.price_precision,
                        )?,
                        bid_price: Number::from_str_with_precision(
                            bid,
                            constraints.price_precision,
                        )?,
                    },
                );
            }
            Ok(out)
        })
    }

    fn get_latest_trade_cursor(&self) -> VenueResult<String> {
        Ok(chrono::Utc::now().timestamp().to_string())
    }

    /// The account's trades on `pair`, oldest first.
    ///
    /// The returned cursor is one second past the last trade, so polling
    /// with it never repeats a trade.
    fn get_trade_history<'a>(
        &'a self,
        pair: &'a TradingPair,
        cursor_start: Option<&'a str>,
        cursor_end: Option<&'a str>,
    ) -> BoxFuture<'a, VenueResult<TradeHistory>> {
        Box::pin(async move {
            let constraints = self.constraints(pair)?;
            let market = self.market(pair);
            let request = TradesHistoryRequest {
                start: cursor_start,
                end: cursor_end,
            };
            let history: TradesHistoryResult = self.post(TRADES_HISTORY_PATH, &request).await?;

            let mut trades = history
                .trades
                .iter()
                .filter(|(_, row)| row.pair == market)
                .map(|(id, row)| self.trade_from_history(id, pair, row, constraints))
                .collect::<VenueResult<Vec<_>>>()?;
            trades.sort_by(|a, b| {
                fn key(t: &Trade) -> (Option<i64>, Option<&str>) {
                    (t.order.timestamp_ms, t.id.as_ref().map(TransactionId::as_str))
                }
                key(a).cmp(&key(b))
            });

            let cursor = match trades.last().and_then(|t| t.order.timestamp_ms) {
                Some(ms) => Some((ms.div_euclid(1000) + 1).to_string()),
                None => cursor_start.map(str::to_string),
            };
            debug!(%market, trades = trades.len(), ?cursor, "Fetched trade history");
            Ok(TradeHistory { cursor, trades })
        })
    }

    fn get_trades<'a>(
        &'a self,
        pair: &'a TradingPair,
        cursor: Option<&'a str>,
    ) -> BoxFuture<'a, VenueResult<TradeHistory>> {
        Box::pin(async move {
            let constraints = self.constraints(pair)?;
            let mut query = vec![("pair".to_string(), self.market(pair))];
            if let Some(since) = cursor {
                query.push(("since".to_string(), since.to_string()));
            }
            let res: TradesResult = self.gateway.get(TRADES_PATH, &query).await?;

            let mut trades = res
                .trades
                .iter()
                .map(|row| trade_from_public(pair, row, constraints))
                .collect::<VenueResult<Vec<_>>>()?;
            trades.sort_by_key(|t| t.order.timestamp_ms);

            Ok(TradeHistory {
                cursor: Some(res.last.to_string()),
                trades,
            })
        })
    }

    fn get_withdraw_info<'a>(
        &'a self,
        asset: &'a Asset,
        amount: Number,
        address: &'a str,
    ) -> BoxFuture<'a, VenueResult<WithdrawInfo>> {
        Box::pin(async move {
            let key = self.withdraw_keys.key(asset, address)?;
            let request = WithdrawRequest {
                asset: asset.code(),
                key,
                amount: amount.as_string(),
            };
            let info: WithdrawInfoResult = self.post(WITHDRAW_INFO_PATH, &request).await?;

            let limit = decimal_field(&info.limit, "limit")?;
            if limit < amount.value() {
                return Err(VenueError::WithdrawAmountAboveLimit {
                    amount: amount.value(),
                    limit,
                });
            }
            if let Some(fee) = info.fee.as_deref() {
                let fee = decimal_field(fee, "fee")?;
                if fee >= amount.value() {
                    return Err(VenueError::WithdrawAmountInvalid {
                        amount: amount.value(),
                        fee,
                    });
                }
            }

            Ok(WithdrawInfo {
                amount_to_receive: Number::from_str_with_precision(
                    &info.amount,
                    amount.precision(),
                )?,
            })
        })
    }

    /// An unused deposit address for `asset`, generating one when the account
    /// has none left.
    fn prepare_deposit<'a>(
        &'a self,
        asset: &'a Asset,
        amount: Number,
    ) -> BoxFuture<'a, VenueResult<DepositInfo>> {
        Box::pin(async move {
            let code = asset.code();
            let methods: Vec<DepositMethod> = self
                .post(DEPOSIT_METHODS_PATH, &DepositMethodsRequest { asset: code })
                .await?;
            let method = methods.into_iter().next().ok_or_else(|| {
                VenueError::UnexpectedResponse(format!("no deposit method for {asset}"))
            })?;

            match &method.limit {
                DepositLimit::Flag(false) => {}
                DepositLimit::Flag(true) => {
                    return Err(VenueError::UnexpectedResponse(
                        "deposit limit flag set without an amount".to_string(),
                    ))
                }
                DepositLimit::Amount(raw) => {
                    let limit = decimal_field(raw, "limit")?;
                    if limit < amount.value() {
                        return Err(VenueError::DepositAmountAboveLimit {
                            amount: amount.value(),
                            limit,
                        });
                    }
                }
            }
            let fee = match method.fee.as_deref() {
                Some(raw) => Number::from_str_with_precision(raw, amount.precision())?,
                None => Number::zero(amount.precision()),
            };

            for generate in [false, true] {
                let addresses = self.deposit_addresses(code, &method.method, generate).await?;
                if let Some(picked) = pick_new_address(addresses) {
                    let expires = picked.expiretm.trim().parse::<i64>().map_err(|e| {
                        CoreError::InvalidNumber(format!("expiretm {:?}: {e}", picked.expiretm))
                    })?;
                    debug!(%asset, generated = generate, "Deposit address selected");
                    return Ok(DepositInfo {
                        address: picked.address,
                        fee,
                        expires_at_secs: (expires > 0).then_some(expires),
                    });
                }
            }
            Err(VenueError::UnexpectedResponse(format!(
                "no new deposit address returned for {asset}"
            )))
        })
    }

    fn withdraw_funds<'a>(
        &'a self,
        asset: &'a Asset,
        amount: Number,
        address: &'a str,
    ) -> BoxFuture<'a, VenueResult<WithdrawalReceipt>> {
        Box::pin(async move {
            let key = self.withdraw_keys.key(asset, address)?;
            let request = WithdrawRequest {
                asset: asset.code(),
                key,
                amount: amount.as_string(),
            };
            let res: WithdrawResult = self.post(WITHDRAW_PATH, &request).await?;
            info!(%asset, amount = %amount, withdrawal_id = %res.refid, "Withdrawal submitted");
            Ok(WithdrawalReceipt {
                withdrawal_id: res.refid,
            })
        })
    }
}
