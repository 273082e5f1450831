//! Price levels of the trader's own offers, and the best external price once
//! those offers are taken out of the venue book.

use qg_core::{CoreError, Level, Number, OrderAction, OrderConstraints, RestingOffer};
use rust_decimal::Decimal;

use crate::error::{FilterError, FilterResult};

/// True when `price` starts a level beyond `last` in the side's priority
/// direction: higher for sells, lower for buys.
fn is_new_level(last: Option<&Number>, price: &Number, action: OrderAction) -> bool {
    match last {
        None => true,
        Some(last) => match action {
            OrderAction::Sell => price > last,
            OrderAction::Buy => price < last,
        },
    }
}

fn parse_amount(raw: &str) -> FilterResult<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| CoreError::InvalidNumber(format!("offer amount {raw:?}: {e}")).into())
}

/// Collate the trader's offers for one side into price levels.
///
/// Sell offers are priced in quote per base and sized in base. Buy offers
/// sell the quote asset, so their price is inverted and their amount is
/// converted to base units before rounding to the pair's precision.
///
/// Offers must already be sorted best-first; equal rounded prices merge.
pub fn collate_offers(
    offers: &[RestingOffer],
    action: OrderAction,
    constraints: OrderConstraints,
) -> FilterResult<Vec<Level>> {
    let mut levels: Vec<Level> = Vec::new();

    for offer in offers {
        let raw_amount = parse_amount(&offer.amount)?;
        let (price, amount) = match action {
            OrderAction::Sell => (offer.price.to_decimal()?, raw_amount),
            // amount / (d / n) == amount * n / d
            OrderAction::Buy => {
                let price = offer.price.inverse_decimal()?;
                let base = raw_amount
                    .checked_mul(Decimal::from(offer.price.n))
                    .and_then(|scaled| scaled.checked_div(Decimal::from(offer.price.d)))
                    .ok_or_else(|| {
                        CoreError::InvalidNumber(format!(
                            "offer amount {} at {} overflows",
                            offer.amount, offer.price
                        ))
                    })?;
                (price, base)
            }
        };
        let price = Number::new(price, constraints.price_precision);
        let amount = Number::new(amount, constraints.volume_precision);

        let last = levels.last().map(|l| l.price);
        if is_new_level(last.as_ref(), &price, action) {
            levels.push(Level::new(price, amount));
        } else if let Some(current) = levels.last_mut().filter(|l| l.price == price) {
            current.amount = current.amount.add(&amount);
        } else {
            return Err(FilterError::InvalidOrdering {
                side: action,
                last: last.unwrap_or(price),
                price,
            });
        }
    }

    Ok(levels)
}

/// Best price on `book_side` not accounted for by the trader's own levels.
///
/// Walks both sequences by index. The first external level that is priced
/// better than the trader's level at the same index, or that carries more
/// volume than it, belongs to someone else. `None` means the side holds
/// nothing but the trader's own offers.
pub fn resolve_top_price(
    book_side: &[Level],
    trader_levels: &[Level],
    action: OrderAction,
) -> Option<Number> {
    for (i, external) in book_side.iter().enumerate() {
        let Some(trader) = trader_levels.get(i) else {
            return Some(external.price);
        };
        if is_new_level(Some(&external.price), &trader.price, action) {
            return Some(external.price);
        }
        if trader.amount < external.amount {
            return Some(external.price);
        }
    }
    None
}

/// Collate `trader_offers` and resolve the top external price of `book_side`.
pub fn top_price_excluding_trader(
    book_side: &[Level],
    trader_offers: &[RestingOffer],
    action: OrderAction,
    constraints: OrderConstraints,
) -> FilterResult<Option<Number>> {
    let trader_levels = collate_offers(trader_offers, action, constraints)?;
    Ok(resolve_top_price(book_side, &trader_levels, action))
}
