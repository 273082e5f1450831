//! p2pb2b connector.
//!
//! Private endpoints are signed POSTs, public market data is plain GET.
//! Market names join base and quote with the configured delimiter
//! (`XLM_BTC` by default).

mod precision;
pub mod wire;

use std::collections::HashMap;
use std::sync::Arc;

use qg_core::{
    aggregate_levels, Asset, CancelOrderResult, Level, Number, OpenOrder, Order, OrderAction, OrderBook,
    OrderConstraints, OrderType, PrecisionModel, Ticker, TradingPair, TransactionId,
};
use qg_gateway::{collect_depth, collect_pages, BoxFuture, Gateway};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{VenueError, VenueResult};
use crate::exchange::{check_order_precision, Exchange};
use wire::{
    BalancesResult, CancelOrderRequest, CreateOrderRequest, OrdersPage, OrdersRequest,
    TickerResult, VenueOrder, BALANCES_PATH, BOOK_PATH, ORDERS_PATH, ORDER_CANCEL_PATH,
    ORDER_NEW_PATH, PAGE_LIMIT, TICKER_PATH,
};

pub use precision::default_precision;

pub const VENUE_NAME: &str = "p2pb2b";
pub const DEFAULT_BASE_URL: &str = "https://p2pb2b.io";
pub const DEFAULT_DELIMITER: &str = "_";

/// Fractional digits used for account balances.
const BALANCE_PRECISION: u32 = 8;

pub use crate::exchange::SIMULATED_ORDER_ID;

pub struct P2bExchange {
    gateway: Arc<Gateway>,
    precision: PrecisionModel,
    delimiter: String,
    simulated: bool,
}

impl P2bExchange {
    pub fn new(gateway: Arc<Gateway>, precision: PrecisionModel) -> Self {
        Self {
            gateway,
            precision,
            delimiter: DEFAULT_DELIMITER.to_string(),
            simulated: false,
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
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
        let fields = serde_json::to_value(fields)
            .map_err(|e| qg_gateway::GatewayError::Encode(e.to_string()))?;
        Ok(self.gateway.post(path, fields).await?)
    }

    async fn orders_page(
        &self,
        market: &str,
        offset: usize,
        limit: usize,
    ) -> qg_gateway::GatewayResult<Vec<VenueOrder>> {
        let request = OrdersRequest {
            market,
            offset,
            limit,
        };
        let fields = serde_json::to_value(&request)
            .map_err(|e| qg_gateway::GatewayError::Encode(e.to_string()))?;
        let page: OrdersPage = self.gateway.post(ORDERS_PATH, fields).await?;
        Ok(page.into_rows())
    }

    async fn book_page(
        &self,
        market: &str,
        side: OrderAction,
        offset: usize,
        limit: usize,
    ) -> qg_gateway::GatewayResult<Vec<VenueOrder>> {
        let query = vec![
            ("market".to_string(), market.to_string()),
            ("side".to_string(), side.to_string()),
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        let page: OrdersPage = self.gateway.get(BOOK_PATH, &query).await?;
        Ok(page.into_rows())
    }

    /// Fetch one side of the book: resting sells are the asks, resting buys
    /// the bids.
    async fn book_side(
        &self,
        market: &str,
        side: OrderAction,
        depth: usize,
        constraints: OrderConstraints,
    ) -> VenueResult<Vec<Level>> {
        let rows = collect_depth(depth, PAGE_LIMIT, move |offset, limit| {
            self.book_page(market, side, offset, limit)
        })
        .await?;

        let levels = rows
            .iter()
            .map(|row| -> VenueResult<Level> {
                Ok(Level::new(
                    Number::from_str_with_precision(&row.price, constraints.price_precision)?,
                    Number::from_str_with_precision(&row.amount, constraints.volume_precision)?,
                ))
            })
            .collect::<VenueResult<Vec<_>>>()?;

        // the venue lists one row per resting order
        Ok(aggregate_levels(levels, side)?)
    }

    async fn open_orders_for(&self, pair: &TradingPair) -> VenueResult<Vec<OpenOrder>> {
        let constraints = self.constraints(pair)?;
        let market = self.market(pair);
        let market = market.as_str();

        let rows = collect_pages(PAGE_LIMIT, move |offset, limit| {
            self.orders_page(market, offset, limit)
        })
        .await?;

        rows.iter()
            .map(|row| open_order_from_row(pair, row, constraints))
            .collect()
    }
}

fn open_order_from_row(
    pair: &TradingPair,
    row: &VenueOrder,
    constraints: OrderConstraints,
) -> VenueResult<OpenOrder> {
    let action: OrderAction = row.side.as_deref().unwrap_or_default().parse()?;
    let order_type: OrderType = match row.order_type.as_deref() {
        Some(t) => t.parse()?,
        None => OrderType::Limit,
    };
    let volume = Number::from_str_with_precision(&row.amount, constraints.volume_precision)?;
    let volume_executed = match row.left.as_deref() {
        Some(left) => {
            let left = Number::from_str_with_precision(left, constraints.volume_precision)?;
            Number::new(volume.value() - left.value(), constraints.volume_precision)
        }
        None => Number::zero(constraints.volume_precision),
    };

    Ok(OpenOrder {
        order: Order {
            pair: pair.clone(),
            action,
            order_type,
            price: Number::from_str_with_precision(&row.price, constraints.price_precision)?,
            volume,
            timestamp_ms: row.timestamp_ms(),
        },
        id: TransactionId::new(row.id.to_string()),
        start_time_ms: row.timestamp_ms(),
        expire_time_ms: None,
        volume_executed,
    })
}

impl Exchange for P2bExchange {
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

            let side = order.action.to_string();
            let request = CreateOrderRequest {
                market: &market,
                amount: order.volume.as_string(),
                side: &side,
                price: order.price.as_string(),
            };
            let created: VenueOrder = self.post(ORDER_NEW_PATH, &request).await?;
            debug!(%market, order_id = created.id, "Order created");
            Ok(TransactionId::new(created.id.to_string()))
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

            let order_id: u64 = id
                .as_str()
                .parse()
                .map_err(|_| VenueError::InvalidOrderId(id.to_string()))?;
            let market = self.market(pair);
            let request = CancelOrderRequest {
                market: &market,
                order_id,
            };
            let _: serde_json::Value = self.post(ORDER_CANCEL_PATH, &request).await?;
            Ok(CancelOrderResult::Cancelled)
        })
    }

    fn get_account_balances<'a>(
        &'a self,
        assets: &'a [Asset],
    ) -> BoxFuture<'a, VenueResult<HashMap<Asset, Number>>> {
        Box::pin(async move {
            let balances: BalancesResult = self.post(BALANCES_PATH, &serde_json::json!({})).await?;

            let mut out = HashMap::with_capacity(assets.len());
            for asset in assets {
                let Some(item) = balances.get(asset.code()) else {
                    debug!(%asset, "Venue reports no balance for asset");
                    continue;
                };
                let available = Number::from_str_with_precision(&item.available, BALANCE_PRECISION)?;
                let freeze = Number::from_str_with_precision(&item.freeze, BALANCE_PRECISION)?;
                out.insert(asset.clone(), available.add(&freeze));
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

            let asks = self
                .book_side(&market, OrderAction::Sell, max_count, constraints)
                .await?;
            let bids = self
                .book_side(&market, OrderAction::Buy, max_count, constraints)
                .await?;

            debug!(%market, asks = asks.len(), bids = bids.len(), "Fetched order book");
            Ok(OrderBook::new(pair.clone(), asks, bids))
        })
    }

    fn get_open_orders<'a>(
        &'a self,
        pairs: &'a [TradingPair],
    ) -> BoxFuture<'a, VenueResult<HashMap<TradingPair, Vec<OpenOrder>>>> {
        Box::pin(async move {
            let mut out = HashMap::with_capacity(pairs.len());
            for pair in pairs {
                let orders = self.open_orders_for(pair).await?;
                out.insert(pair.clone(), orders);
            }
            Ok(out)
        })
    }

    fn get_ticker_price<'a>(
        &'a self,
        pairs: &'a [TradingPair],
    ) -> BoxFuture<'a, VenueResult<HashMap<TradingPair, Ticker>>> {
        Box::pin(async move {
            let mut out = HashMap::with_capacity(pairs.len());
            for pair in pairs {
                let constraints = self.constraints(pair)?;
                let query = vec![("market".to_string(), self.market(pair))];
                let ticker: TickerResult = self.gateway.get(TICKER_PATH, &query).await?;
                out.insert(
                    pair.clone(),
                    Ticker {
                        ask_price: Number::from_str_with_precision(
                            &ticker.ask,
                            constraints.price_precision,
                        )?,
                        bid_price: Number::from_str_with_precision(
                            &ticker.bid,
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
}
