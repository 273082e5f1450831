//! Submit filters.
//!
//! A submit filter sees every ledger operation batch before it is signed and
//! may keep, drop or rewrite individual operations. The maker-mode filter
//! makes sure no new or modified offer would cross the best external price
//! on the venue, so the bot only ever adds liquidity.

pub mod error;
pub mod levels;
pub mod maker_mode;

pub use error::{FilterError, FilterResult};
pub use levels::{collate_offers, resolve_top_price, top_price_excluding_trader};
pub use maker_mode::{
    filter_ops, make_filter_maker_mode, FilterOutcome, MakerModeFilter, SubmitFilter, SubmitMode,
};
