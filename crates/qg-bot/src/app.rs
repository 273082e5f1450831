//! Application wiring.
//!
//! Builds the transport, gateway, venue connector and submit filter from an
//! [`AppConfig`] and exposes the operations the command line drives.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use qg_core::{Asset, Number, OpenOrder, Operation, OrderBook, RestingOffer, Ticker, TradingPair};
use qg_filter::{make_filter_maker_mode, SubmitFilter, SubmitMode};
use qg_gateway::{
    CommandEgress, EgressStrategy, Gateway, HttpTransport, StaticEgress, Transport,
};
use qg_venue::{make_exchange, Exchange};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// An operation batch with the trader's resting offers, as read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterBatch {
    pub ops: Vec<Operation>,
    /// Resting sell offers, best (lowest) first.
    #[serde(default)]
    pub selling_offers: Vec<RestingOffer>,
    /// Resting buy offers, best first.
    #[serde(default)]
    pub buying_offers: Vec<RestingOffer>,
}

impl FilterBatch {
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// What a filter pass did to a batch.
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    pub mode: SubmitMode,
    pub ops: Vec<Operation>,
    pub kept: usize,
    pub dropped: usize,
    pub transformed: usize,
}

/// Main application.
pub struct Application {
    config: AppConfig,
    exchange: Arc<dyn Exchange>,
    pair: TradingPair,
    filter: Option<Arc<dyn SubmitFilter>>,
}

impl Application {
    /// Build against the live venue over HTTP.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::with_timeout(
            config.gateway.request_timeout(),
        )?);
        let gateway = build_gateway(&config, transport)?;
        Self::with_gateway(config, Arc::new(gateway))
    }

    /// Build the venue connector on top of an existing gateway.
    pub fn with_gateway(config: AppConfig, gateway: Arc<Gateway>) -> AppResult<Self> {
        let exchange = make_exchange(config.venue_kind()?, gateway, config.exchange_options()?)?;
        Self::with_exchange(config, exchange)
    }

    pub fn with_exchange(config: AppConfig, exchange: Arc<dyn Exchange>) -> AppResult<Self> {
        let pair = config.filter.trading_pair()?;
        let mode = config.filter.submit_mode;
        let filter = match config.filter.ledger_pair() {
            Ok(ledger_pair) => make_filter_maker_mode(
                mode,
                exchange.clone(),
                pair.clone(),
                ledger_pair,
                config.filter.book_depth,
            ),
            // no quote asset is only fatal when offers get filtered
            Err(_) if mode == SubmitMode::Both => None,
            Err(e) => return Err(e),
        };
        info!(
            venue = exchange.name(),
            %pair,
            mode = %config.filter.submit_mode,
            "Application initialized"
        );
        Ok(Self {
            config,
            exchange,
            pair,
            filter,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    /// Both book sides for the configured pair.
    pub async fn order_book(&self, depth: Option<usize>) -> AppResult<OrderBook> {
        let depth = depth.unwrap_or(self.config.filter.book_depth);
        Ok(self.exchange.get_order_book(&self.pair, depth).await?)
    }

    pub async fn ticker(&self) -> AppResult<Ticker> {
        let pairs = [self.pair.clone()];
        let mut tickers = self.exchange.get_ticker_price(&pairs).await?;
        tickers
            .remove(&self.pair)
            .ok_or_else(|| AppError::Config(format!("no ticker returned for {}", self.pair)))
    }

    /// Balances for `assets`, or for both sides of the pair when empty.
    pub async fn balances(&self, assets: &[Asset]) -> AppResult<HashMap<Asset, Number>> {
        let assets = if assets.is_empty() {
            vec![self.pair.base.clone(), self.pair.quote.clone()]
        } else {
            assets.to_vec()
        };
        Ok(self.exchange.get_account_balances(&assets).await?)
    }

    pub async fn open_orders(&self) -> AppResult<Vec<OpenOrder>> {
        let pairs = [self.pair.clone()];
        let mut orders = self.exchange.get_open_orders(&pairs).await?;
        Ok(orders.remove(&self.pair).unwrap_or_default())
    }

    /// Run a batch through the configured submit filter.
    ///
    /// In `both` mode the batch is returned untouched and the venue is not
    /// queried.
    pub async fn filter(&self, batch: FilterBatch) -> AppResult<FilterReport> {
        let mode = self.config.filter.submit_mode;
        let Some(filter) = &self.filter else {
            let kept = batch.ops.len();
            info!(kept, "Submit mode allows taking, batch passed through");
            return Ok(FilterReport {
                mode,
                ops: batch.ops,
                kept,
                dropped: 0,
                transformed: 0,
            });
        };

        let outcome = filter
            .apply_with_outcome(batch.ops, &batch.selling_offers, &batch.buying_offers)
            .await?;
        Ok(FilterReport {
            mode,
            ops: outcome.ops,
            kept: outcome.kept,
            dropped: outcome.dropped,
            transformed: outcome.transformed,
        })
    }
}

/// Gateway with the configured credentials, routes and retry settings.
pub fn build_gateway(config: &AppConfig, transport: Arc<dyn Transport>) -> AppResult<Gateway> {
    let credentials = config.credentials()?;
    let mut gateway = Gateway::new(config.gateway.gateway_config(config.base_url()?), transport)
        .with_credentials(credentials);

    let routes = config.egress.routes.clone();
    if !routes.is_empty() {
        let strategy: Arc<dyn EgressStrategy> = match &config.egress.command {
            Some(program) => {
                let mut command = CommandEgress::new(program.clone(), config.egress.args.clone());
                if let Some(dir) = &config.egress.workdir {
                    command = command.with_workdir(dir);
                }
                Arc::new(command)
            }
            None => {
                warn!(
                    routes = routes.len(),
                    "No egress command configured, routes will not be recycled"
                );
                Arc::new(StaticEgress)
            }
        };
        gateway = gateway.with_routes(routes, strategy);
    }

    Ok(gateway)
}
