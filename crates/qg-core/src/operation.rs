//! Pending ledger operations.
//!
//! A submission batch is an ordered, heterogeneous list of operations. Only
//! offer-management entries are interesting to submit filters; everything
//! else is carried through untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{LedgerAsset, PriceRatio};

/// One entry of a submission batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Create (offer_id 0), modify, or delete (amount 0) an offer.
    ManageOffer(ManageOffer),
    /// Delete an existing offer. Terminal.
    Cancel(CancelOffer),
    /// Any other ledger mutator. Never inspected.
    Passthrough { payload: serde_json::Value },
}

impl Operation {
    /// True for entries that remove an offer from the book.
    pub fn is_delete(&self) -> bool {
        match self {
            Self::ManageOffer(mo) => mo.is_delete(),
            Self::Cancel(_) => true,
            Self::Passthrough { .. } => false,
        }
    }
}

/// Price-setting offer instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageOffer {
    /// Ledger offer id; 0 means the offer does not exist yet.
    #[serde(default)]
    pub offer_id: u64,
    pub selling: LedgerAsset,
    pub buying: LedgerAsset,
    /// Amount of the selling asset. Zero deletes the offer.
    pub amount: Decimal,
    /// Buying units per selling unit.
    pub price: PriceRatio,
}

impl ManageOffer {
    pub fn is_new(&self) -> bool {
        self.offer_id == 0
    }

    pub fn is_delete(&self) -> bool {
        self.amount.is_zero()
    }

    /// Copy of this instruction rewritten to remove the offer.
    pub fn to_cancel(&self) -> CancelOffer {
        CancelOffer {
            offer_id: self.offer_id,
            selling: self.selling.clone(),
            buying: self.buying.clone(),
            price: self.price,
        }
    }
}

/// Instruction deleting an existing offer (a manage-offer with amount 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOffer {
    pub offer_id: u64,
    pub selling: LedgerAsset,
    pub buying: LedgerAsset,
    pub price: PriceRatio,
}

impl CancelOffer {
    /// The ledger representation: the same offer with amount forced to 0.
    pub fn as_manage_offer(&self) -> ManageOffer {
        ManageOffer {
            offer_id: self.offer_id,
            selling: self.selling.clone(),
            buying: self.buying.clone(),
            amount: Decimal::ZERO,
            price: self.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn offer(id: u64, amount: Decimal) -> ManageOffer {
        ManageOffer {
            offer_id: id,
            selling: LedgerAsset::Native,
            buying: LedgerAsset::credit("BTC", "GISSUER"),
            amount,
            price: PriceRatio::new(1, 20),
        }
    }

    #[test]
    fn test_new_and_delete_flags() {
        assert!(offer(0, dec!(10)).is_new());
        assert!(!offer(42, dec!(10)).is_new());
        assert!(offer(7, dec!(0)).is_delete());
    }

    #[test]
    fn test_to_cancel_forces_zero_amount() {
        let cancel = offer(42, dec!(10)).to_cancel();
        assert_eq!(cancel.offer_id, 42);
        let mo = cancel.as_manage_offer();
        assert!(mo.is_delete());
        assert_eq!(mo.price, PriceRatio::new(1, 20));
    }

    #[test]
    fn test_operation_json_tagging() {
        let op = Operation::ManageOffer(offer(0, dec!(1.5)));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "manage_offer");
        let back: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);

        let pass: Operation =
            serde_json::from_str(r#"{"op":"passthrough","payload":{"kind":"payment"}}"#).unwrap();
        assert!(!pass.is_delete());
    }
}
