//! Maker-mode filter against a scripted in-memory exchange.

use std::collections::HashMap;
use std::sync::Arc;

use qg_core::{
    Asset, CancelOrderResult, LedgerAsset, LedgerPair, Level, ManageOffer, Number, OpenOrder,
    Operation, Order, OrderBook, OrderConstraints, PriceRatio, RestingOffer, Ticker, TradingPair,
    TransactionId,
};
use qg_filter::{make_filter_maker_mode, FilterError, MakerModeFilter, SubmitFilter, SubmitMode};
use qg_gateway::{BoxFuture, Gateway, GatewayConfig, GatewayError, MockTransport, RetryPolicy};
use qg_venue::{Exchange, P2bExchange, VenueError, VenueResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Exchange serving a fixed book and recording requested depths.
struct ScriptedExchange {
    book: Option<OrderBook>,
    constraints: Option<OrderConstraints>,
    depths: parking_lot::Mutex<Vec<usize>>,
}

impl ScriptedExchange {
    fn new(asks: Vec<Level>, bids: Vec<Level>) -> Self {
        Self {
            book: Some(OrderBook::new(pair(), asks, bids)),
            constraints: Some(OrderConstraints::new(7, 7, dec!(30))),
            depths: parking_lot::Mutex::new(Vec::new()),
        }
    }

    fn unavailable() -> Self {
        Self {
            book: None,
            constraints: Some(OrderConstraints::new(7, 7, dec!(30))),
            depths: parking_lot::Mutex::new(Vec::new()),
        }
    }
}

impl Exchange for ScriptedExchange {
    fn name(&self) -> &str {
        "scripted"
    }

    fn add_order<'a>(&'a self, _order: &'a Order) -> BoxFuture<'a, VenueResult<TransactionId>> {
        Box::pin(async { Err(VenueError::NotSupported("add_order")) })
    }

    fn cancel_order<'a>(
        &'a self,
        _id: &'a TransactionId,
        _pair: &'a TradingPair,
    ) -> BoxFuture<'a, VenueResult<CancelOrderResult>> {
        Box::pin(async { Err(VenueError::NotSupported("cancel_order")) })
    }

    fn get_account_balances<'a>(
        &'a self,
        _assets: &'a [Asset],
    ) -> BoxFuture<'a, VenueResult<HashMap<Asset, Number>>> {
        Box::pin(async { Ok(HashMap::new()) })
    }

    fn get_order_constraints(&self, _pair: &TradingPair) -> Option<OrderConstraints> {
        self.constraints
    }

    fn get_order_book<'a>(
        &'a self,
        _pair: &'a TradingPair,
        max_count: usize,
    ) -> BoxFuture<'a, VenueResult<OrderBook>> {
        Box::pin(async move {
            self.depths.lock().push(max_count);
            self.book.clone().ok_or(VenueError::Gateway(GatewayError::OutOfRange {
                requested: max_count,
                available: 0,
            }))
        })
    }

    fn get_open_orders<'a>(
        &'a self,
        _pairs: &'a [TradingPair],
    ) -> BoxFuture<'a, VenueResult<HashMap<TradingPair, Vec<OpenOrder>>>> {
        Box::pin(async { Ok(HashMap::new()) })
    }

    fn get_ticker_price<'a>(
        &'a self,
        _pairs: &'a [TradingPair],
    ) -> BoxFuture<'a, VenueResult<HashMap<TradingPair, Ticker>>> {
        Box::pin(async { Ok(HashMap::new()) })
    }

    fn get_latest_trade_cursor(&self) -> VenueResult<String> {
        Ok("0".to_string())
    }
}

fn pair() -> TradingPair {
    TradingPair::new("XLM", "BTC")
}

fn btc() -> LedgerAsset {
    LedgerAsset::credit("BTC", "GISSUER")
}

fn ledger_pair() -> LedgerPair {
    LedgerPair::new(LedgerAsset::Native, btc())
}

fn level(price: Decimal, amount: Decimal) -> Level {
    Level::new(Number::new(price, 7), Number::new(amount, 7))
}

fn sell_op(id: u64, amount: Decimal, n: i32, d: i32) -> Operation {
    Operation::ManageOffer(ManageOffer {
        offer_id: id,
        selling: LedgerAsset::Native,
        buying: btc(),
        amount,
        price: PriceRatio::new(n, d),
    })
}

fn buy_op(id: u64, amount: Decimal, n: i32, d: i32) -> Operation {
    Operation::ManageOffer(ManageOffer {
        offer_id: id,
        selling: btc(),
        buying: LedgerAsset::Native,
        amount,
        price: PriceRatio::new(n, d),
    })
}

fn resting_sell(id: u64, n: i32, d: i32, amount: &str) -> RestingOffer {
    RestingOffer {
        id,
        selling: LedgerAsset::Native,
        buying: btc(),
        price: PriceRatio::new(n, d),
        amount: amount.to_string(),
    }
}

fn resting_buy(id: u64, n: i32, d: i32, amount: &str) -> RestingOffer {
    RestingOffer {
        id,
        selling: btc(),
        buying: LedgerAsset::Native,
        price: PriceRatio::new(n, d),
        amount: amount.to_string(),
    }
}

fn filter(exchange: ScriptedExchange) -> (Arc<ScriptedExchange>, MakerModeFilter) {
    let exchange = Arc::new(exchange);
    let filter = MakerModeFilter::new(exchange.clone(), pair(), ledger_pair());
    (exchange, filter)
}

#[tokio::test]
async fn test_sell_below_external_bid_dropped() {
    let (exchange, filter) = filter(ScriptedExchange::new(
        vec![level(dec!(0.07), dec!(10))],
        vec![level(dec!(0.06), dec!(10))],
    ));

    let outcome = filter
        .apply_with_outcome(vec![sell_op(0, dec!(10), 1, 20)], &[], &[])
        .await
        .unwrap();
    assert!(outcome.ops.is_empty());
    assert_eq!(outcome.dropped, 1);
    assert_eq!(*exchange.depths.lock(), vec![50]);
}

#[tokio::test]
async fn test_trader_own_bid_is_not_the_market() {
    // The only bid at 0.06 is the trader's own 20 XLM; the real top bid is
    // 0.04, so a sell at 0.05 no longer crosses.
    let (_exchange, filter) = filter(ScriptedExchange::new(
        vec![level(dec!(0.07), dec!(10))],
        vec![level(dec!(0.06), dec!(20)), level(dec!(0.04), dec!(5))],
    ));
    // Sells 1.2 BTC at 50/3 XLM per BTC: bids 0.06 for 20 XLM.
    let buying = vec![resting_buy(11, 50, 3, "1.2")];

    let ops = vec![sell_op(0, dec!(10), 1, 20)];
    let outcome = filter
        .apply_with_outcome(ops.clone(), &[], &buying)
        .await
        .unwrap();
    assert_eq!(outcome.ops, ops);
    assert_eq!(outcome.kept, 1);
}

#[tokio::test]
async fn test_trader_own_ask_is_not_the_market() {
    let (_exchange, filter) = filter(ScriptedExchange::new(
        vec![level(dec!(0.07), dec!(10)), level(dec!(0.09), dec!(3))],
        vec![level(dec!(0.05), dec!(10))],
    ));
    let selling = vec![resting_sell(12, 7, 100, "10")];

    // Bids 0.08 (sells BTC at 25/2 XLM per BTC): crosses 0.07 only if that
    // ask were someone else's.
    let outcome = filter
        .apply_with_outcome(vec![buy_op(0, dec!(1), 25, 2)], &selling, &[])
        .await
        .unwrap();
    assert_eq!(outcome.kept, 1);

    // Without the trader's own offer the 0.07 ask is real.
    let outcome = filter
        .apply_with_outcome(vec![buy_op(0, dec!(1), 25, 2)], &[], &[])
        .await
        .unwrap();
    assert_eq!(outcome.dropped, 1);
}

#[tokio::test]
async fn test_existing_offer_rewritten_to_cancel() {
    let (_exchange, filter) = filter(ScriptedExchange::new(
        vec![],
        vec![level(dec!(0.06), dec!(10))],
    ));

    let ops = filter
        .apply(vec![sell_op(42, dec!(10), 1, 20)], &[], &[])
        .await
        .unwrap();
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        Operation::Cancel(c) => {
            assert_eq!(c.offer_id, 42);
            assert!(c.as_manage_offer().is_delete());
        }
        other => panic!("expected cancel, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_book_keeps_everything() {
    let (_exchange, filter) = filter(ScriptedExchange::new(vec![], vec![]));
    let ops = vec![sell_op(0, dec!(1), 1, 100), buy_op(0, dec!(1), 1, 100)];
    let out = filter.apply(ops.clone(), &[], &[]).await.unwrap();
    assert_eq!(out, ops);
}

#[tokio::test]
async fn test_book_fetch_failure_is_error() {
    let (_exchange, filter) = filter(ScriptedExchange::unavailable());
    let err = filter
        .apply(vec![sell_op(0, dec!(1), 1, 20)], &[], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, FilterError::Venue(_)));
}

#[tokio::test]
async fn test_missing_constraints_is_error() {
    let mut exchange = ScriptedExchange::new(vec![], vec![]);
    exchange.constraints = None;
    let (_exchange, filter) = filter(exchange);

    let err = filter.apply(vec![], &[], &[]).await.unwrap_err();
    assert!(matches!(err, FilterError::MissingConstraints(_)));
}

#[tokio::test]
async fn test_unsorted_trader_offers_abort() {
    let (_exchange, filter) = filter(ScriptedExchange::new(
        vec![level(dec!(0.05), dec!(1))],
        vec![],
    ));
    let selling = vec![resting_sell(1, 3, 50, "1"), resting_sell(2, 1, 20, "1")];
    let err = filter
        .apply(vec![sell_op(0, dec!(1), 1, 10)], &selling, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, FilterError::InvalidOrdering { .. }));
}

#[tokio::test]
async fn test_applying_twice_changes_nothing() {
    let (_exchange, filter) = filter(ScriptedExchange::new(
        vec![level(dec!(0.09), dec!(10))],
        vec![level(dec!(0.06), dec!(10))],
    ));
    let ops = vec![
        sell_op(0, dec!(1), 1, 20),
        sell_op(8, dec!(1), 1, 20),
        buy_op(0, dec!(1), 25, 2),
        buy_op(9, dec!(1), 10, 1),
    ];

    let once = filter.apply(ops, &[], &[]).await.unwrap();
    let twice = filter.apply(once.clone(), &[], &[]).await.unwrap();
    assert_eq!(once, twice);
}

#[tokio::test]
async fn test_factory_respects_submit_mode() {
    let scripted = Arc::new(ScriptedExchange::new(vec![], vec![]));
    let exchange: Arc<dyn Exchange> = scripted.clone();
    assert!(
        make_filter_maker_mode(SubmitMode::Both, exchange.clone(), pair(), ledger_pair(), 7)
            .is_none()
    );

    let filter =
        make_filter_maker_mode(SubmitMode::MakerOnly, exchange, pair(), ledger_pair(), 7).unwrap();
    assert_eq!(filter.name(), "maker_mode");

    let ops = vec![sell_op(0, dec!(1), 1, 20)];
    let outcome = filter.apply_with_outcome(ops.clone(), &[], &[]).await.unwrap();
    assert_eq!(outcome.ops, ops);
    assert_eq!(outcome.kept, 1);
    assert_eq!(*scripted.depths.lock(), vec![7]);
}

fn venue_page(rows: &[(&str, &str)]) -> String {
    let orders: Vec<String> = rows
        .iter()
        .map(|(price, amount)| format!(r#"{{"price":"{price}","amount":"{amount}"}}"#))
        .collect();
    format!(
        r#"{{"success":true,"message":"","result":{{"total":{},"orders":[{}]}}}}"#,
        rows.len(),
        orders.join(",")
    )
}

fn p2b_filter(mock: &Arc<MockTransport>, depth: usize) -> MakerModeFilter {
    let gateway = Gateway::new(
        GatewayConfig::new(qg_venue::p2b::DEFAULT_BASE_URL).with_retry(RetryPolicy::no_retry()),
        mock.clone(),
    );
    let exchange = Arc::new(P2bExchange::new(
        Arc::new(gateway),
        qg_venue::p2b::default_precision(),
    ));
    MakerModeFilter::new(exchange, pair(), ledger_pair()).with_book_depth(depth)
}

#[tokio::test]
async fn test_venue_book_made_only_of_own_asks_has_no_external_ask() {
    let mock = MockTransport::shared();
    // one row per resting order, two of them at the same price
    mock.push_ok(venue_page(&[("0.05", "4"), ("0.05", "6"), ("0.06", "3")]));
    mock.push_ok(venue_page(&[("0.04", "5"), ("0.03", "5"), ("0.02", "5")]));
    let filter = p2b_filter(&mock, 3);

    let selling = vec![
        resting_sell(1, 1, 20, "4"),
        resting_sell(2, 1, 20, "6"),
        resting_sell(3, 3, 50, "3"),
    ];
    // buy at 0.055: above the trader's own 0.05 asks, but nobody else is asking
    let ops = vec![buy_op(0, dec!(1), 200, 11)];

    let outcome = filter
        .apply_with_outcome(ops.clone(), &selling, &[])
        .await
        .unwrap();

    assert_eq!(outcome.ops, ops);
    assert_eq!(outcome.kept, 1);
    assert_eq!(outcome.dropped, 0);
    assert_eq!(mock.request_count(), 2);
}

#[tokio::test]
async fn test_venue_book_external_ask_behind_own_stack() {
    let mock = MockTransport::shared();
    mock.push_ok(venue_page(&[("0.05", "4"), ("0.05", "6"), ("0.06", "8")]));
    mock.push_ok(venue_page(&[("0.04", "5"), ("0.03", "5"), ("0.02", "5")]));
    let filter = p2b_filter(&mock, 3);

    // the trader only owns 3 of the 8 at 0.06
    let selling = vec![
        resting_sell(1, 1, 20, "4"),
        resting_sell(2, 1, 20, "6"),
        resting_sell(3, 3, 50, "3"),
    ];
    let ops = vec![buy_op(0, dec!(1), 200, 11), buy_op(0, dec!(1), 50, 3)];

    let outcome = filter
        .apply_with_outcome(ops, &selling, &[])
        .await
        .unwrap();

    // 0.055 rests below the external 0.06 ask, 0.06 would cross it
    assert_eq!(outcome.ops, vec![buy_op(0, dec!(1), 200, 11)]);
    assert_eq!(outcome.dropped, 1);
}
