//! Maker-only submit filter.
//!
//! Before a batch of offer operations is submitted, drop or cancel every
//! offer that would cross the best external price on the venue: a sell at
//! or below the top bid, or a buy at or above the top ask. Deletes and
//! non-offer operations always pass.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use qg_core::{
    CoreError, LedgerPair, ManageOffer, Number, Operation, OrderAction, RestingOffer, TradingPair,
};
use qg_gateway::BoxFuture;
use qg_telemetry::Metrics;
use qg_venue::Exchange;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FilterError, FilterResult};
use crate::levels::top_price_excluding_trader;

/// Book levels fetched per side.
pub const DEFAULT_BOOK_DEPTH: usize = 50;

/// How offers may be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// Offers may take liquidity.
    #[default]
    Both,
    /// Offers may only rest on the book.
    MakerOnly,
}

impl fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Both => write!(f, "both"),
            Self::MakerOnly => write!(f, "maker_only"),
        }
    }
}

impl FromStr for SubmitMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "both" => Ok(Self::Both),
            "maker_only" => Ok(Self::MakerOnly),
            other => Err(CoreError::UnknownValue(format!("submit mode {other:?}"))),
        }
    }
}

/// A stage that rewrites an operation batch before submission.
pub trait SubmitFilter: Send + Sync {
    fn name(&self) -> &str;

    /// `selling_offers` and `buying_offers` are the trader's resting offers
    /// on the ask and bid side, best first.
    fn apply_with_outcome<'a>(
        &'a self,
        ops: Vec<Operation>,
        selling_offers: &'a [RestingOffer],
        buying_offers: &'a [RestingOffer],
    ) -> BoxFuture<'a, FilterResult<FilterOutcome>>;

    /// The surviving operations only.
    fn apply<'a>(
        &'a self,
        ops: Vec<Operation>,
        selling_offers: &'a [RestingOffer],
        buying_offers: &'a [RestingOffer],
    ) -> BoxFuture<'a, FilterResult<Vec<Operation>>> {
        Box::pin(async move {
            self.apply_with_outcome(ops, selling_offers, buying_offers)
                .await
                .map(|outcome| outcome.ops)
        })
    }
}

/// Result of one filter pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterOutcome {
    /// Surviving operations in their original relative order.
    pub ops: Vec<Operation>,
    pub kept: usize,
    pub dropped: usize,
    pub transformed: usize,
}

enum Decision {
    Keep(Operation),
    Drop,
    Transform(Operation),
}

/// Decide one offer against the opposing top prices.
fn transform_offer(
    mo: ManageOffer,
    ledger_pair: &LedgerPair,
    top_bid: Option<&Number>,
    top_ask: Option<&Number>,
) -> FilterResult<Decision> {
    if mo.is_delete() {
        return Ok(Decision::Keep(Operation::ManageOffer(mo)));
    }

    let action = ledger_pair
        .action_of(&mo.selling, &mo.buying)
        .map_err(|e| FilterError::UnknownAsset(e.to_string()))?;

    let (price, keep): (Decimal, bool) = match (action, top_bid, top_ask) {
        (OrderAction::Buy, _, Some(top_ask)) => {
            let price = mo.price.inverse_decimal()?;
            (price, price < top_ask.value())
        }
        (OrderAction::Sell, Some(top_bid), _) => {
            let price = mo.price.to_decimal()?;
            (price, price > top_bid.value())
        }
        (OrderAction::Buy, _, None) => (mo.price.inverse_decimal()?, true),
        (OrderAction::Sell, None, _) => (mo.price.to_decimal()?, true),
    };

    debug!(
        offer_id = mo.offer_id,
        %action,
        %price,
        top_bid = ?top_bid.map(|n| n.value()),
        top_ask = ?top_ask.map(|n| n.value()),
        keep,
        "Maker mode decision"
    );

    if keep {
        return Ok(Decision::Keep(Operation::ManageOffer(mo)));
    }
    if mo.is_new() {
        return Ok(Decision::Drop);
    }
    if !mo.amount.is_zero() {
        return Ok(Decision::Transform(Operation::Cancel(mo.to_cancel())));
    }
    Err(FilterError::Untransformable {
        offer_id: mo.offer_id,
        amount: mo.amount,
        price: mo.price,
    })
}

/// Apply maker-only rules to a batch given the resolved top prices.
///
/// Any error aborts the whole batch.
pub fn filter_ops(
    ops: Vec<Operation>,
    ledger_pair: &LedgerPair,
    top_bid: Option<&Number>,
    top_ask: Option<&Number>,
) -> FilterResult<FilterOutcome> {
    let original = ops.len();
    let mut outcome = FilterOutcome {
        ops: Vec::with_capacity(original),
        ..FilterOutcome::default()
    };

    for op in ops {
        let decision = match op {
            Operation::ManageOffer(mo) => transform_offer(mo, ledger_pair, top_bid, top_ask)?,
            other => Decision::Keep(other),
        };

        match decision {
            Decision::Keep(op) => {
                outcome.ops.push(op);
                outcome.kept += 1;
            }
            Decision::Transform(op) => {
                outcome.ops.push(op);
                outcome.transformed += 1;
            }
            Decision::Drop => outcome.dropped += 1,
        }
    }

    info!(
        dropped = outcome.dropped,
        transformed = outcome.transformed,
        kept = outcome.kept,
        original,
        filtered = outcome.ops.len(),
        "Maker mode filter applied"
    );
    Ok(outcome)
}

/// Filter that keeps offers from crossing the venue's book.
pub struct MakerModeFilter {
    exchange: Arc<dyn Exchange>,
    pair: TradingPair,
    ledger_pair: LedgerPair,
    book_depth: usize,
}

impl MakerModeFilter {
    pub fn new(exchange: Arc<dyn Exchange>, pair: TradingPair, ledger_pair: LedgerPair) -> Self {
        Self {
            exchange,
            pair,
            ledger_pair,
            book_depth: DEFAULT_BOOK_DEPTH,
        }
    }

    #[must_use]
    pub fn with_book_depth(mut self, depth: usize) -> Self {
        self.book_depth = depth;
        self
    }

    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    /// Fetch a fresh book, resolve the opposing top prices and filter.
    async fn run(
        &self,
        ops: Vec<Operation>,
        selling_offers: &[RestingOffer],
        buying_offers: &[RestingOffer],
    ) -> FilterResult<FilterOutcome> {
        let book = self
            .exchange
            .get_order_book(&self.pair, self.book_depth)
            .await?;
        let constraints = self
            .exchange
            .get_order_constraints(&self.pair)
            .ok_or_else(|| FilterError::MissingConstraints(self.pair.to_string()))?;

        let top_bid =
            top_price_excluding_trader(&book.bids, buying_offers, OrderAction::Buy, constraints)?;
        let top_ask =
            top_price_excluding_trader(&book.asks, selling_offers, OrderAction::Sell, constraints)?;

        debug!(
            pair = %self.pair,
            top_bid = ?top_bid.map(|n| n.value()),
            top_ask = ?top_ask.map(|n| n.value()),
            "Resolved external top of book"
        );

        filter_ops(ops, &self.ledger_pair, top_bid.as_ref(), top_ask.as_ref())
    }
}

impl SubmitFilter for MakerModeFilter {
    fn name(&self) -> &str {
        "maker_mode"
    }

    fn apply_with_outcome<'a>(
        &'a self,
        ops: Vec<Operation>,
        selling_offers: &'a [RestingOffer],
        buying_offers: &'a [RestingOffer],
    ) -> BoxFuture<'a, FilterResult<FilterOutcome>> {
        Box::pin(async move {
            let result = self.run(ops, selling_offers, buying_offers).await;
            match &result {
                Ok(outcome) => {
                    Metrics::filter_applied(outcome.kept, outcome.dropped, outcome.transformed)
                }
                Err(e) => {
                    warn!(pair = %self.pair, error = %e, "Maker mode filter failed");
                    Metrics::filter_failed();
                }
            }
            result
        })
    }
}

/// The maker-mode filter when `mode` asks for it, otherwise `None`.
pub fn make_filter_maker_mode(
    mode: SubmitMode,
    exchange: Arc<dyn Exchange>,
    pair: TradingPair,
    ledger_pair: LedgerPair,
    book_depth: usize,
) -> Option<Arc<dyn SubmitFilter>> {
    match mode {
        SubmitMode::MakerOnly => Some(Arc::new(
            MakerModeFilter::new(exchange, pair, ledger_pair).with_book_depth(book_depth),
        )),
        SubmitMode::Both => None,
    }
}
