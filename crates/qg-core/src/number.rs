//! Precision-carrying decimal numbers.
//!
//! Uses `rust_decimal` for exact decimal arithmetic so that binary
//! floating-point artifacts never reach a price comparison. Every `Number`
//! remembers the number of fractional digits it was rounded to.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Largest scale `Decimal` can represent.
const MAX_PRECISION: u32 = 28;

/// Decimal value rounded to an explicit number of fractional digits.
///
/// Equality, ordering and hashing only look at the numeric value, so
/// `1.50 (precision 2)` equals `1.5 (precision 1)`. The precision is carried
/// along for formatting and for checking against venue constraints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Number {
    value: Decimal,
    precision: u32,
}

impl Number {
    /// Create a number, rounding `value` half away from zero to `precision`.
    #[must_use]
    pub fn new(value: Decimal, precision: u32) -> Self {
        let precision = precision.min(MAX_PRECISION);
        Self {
            value: value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero),
            precision,
        }
    }

    #[must_use]
    pub fn zero(precision: u32) -> Self {
        Self::new(Decimal::ZERO, precision)
    }

    /// Parse a venue-supplied numeric string at the given precision.
    ///
    /// Accepts plain (`"0.00003"`) and scientific (`"3e-5"`) notation.
    pub fn from_str_with_precision(s: &str, precision: u32) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidNumber("empty string".to_string()));
        }
        let parsed = if trimmed.contains(['e', 'E']) {
            Decimal::from_scientific(trimmed)
        } else {
            trimmed.parse::<Decimal>()
        }
        .map_err(|e| CoreError::InvalidNumber(format!("{trimmed:?}: {e}")))?;
        Ok(Self::new(parsed, precision))
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.value
    }

    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.value.is_sign_positive() && !self.value.is_zero()
    }

    /// Sum of two numbers, kept at the larger of the two precisions.
    #[must_use]
    pub fn add(&self, other: &Number) -> Number {
        Number::new(self.value + other.value, self.precision.max(other.precision))
    }

    /// Number of fractional digits actually needed to represent the value.
    ///
    /// `0.0300` has a declared precision of 4 but a significant precision of 2.
    #[must_use]
    pub fn significant_precision(&self) -> u32 {
        self.value.normalize().scale()
    }

    /// Render with exactly `precision` fractional digits.
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.normalize().hash(state);
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.precision as usize, self.value)
    }
}
