//! Waterfall deduction planning
//!
//! Spends drain a member's buckets in the fixed priority order
//! `primary -> package_earnings -> referral_bounty -> winning_earnings`.
//! Planning is pure: it computes per-bucket deltas against a snapshot and
//! either satisfies the full amount or fails with no deltas at all.

use crate::error::WalletError;
use crate::snapshot::{BucketSnapshot, LedgerDelta};
use refledger_core::Bucket;
use rust_decimal::Decimal;

/// The outcome of planning a deduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductionPlan {
    /// Negative deltas, one per bucket that was drawn from.
    pub deltas: Vec<LedgerDelta>,
    /// True if any bucket beyond `primary` was drawn from. Callers use
    /// this to flag a purchase as funded partly by reinvested earnings.
    pub touched_non_primary: bool,
    /// The amount the plan removes in total.
    pub total: Decimal,
}

/// Plan removing `amount` from the snapshot's buckets in waterfall order.
///
/// For each bucket in priority order, takes `min(remaining, balance)` and
/// stops once the remainder hits zero. Fails with `InsufficientFunds` if
/// the buckets are exhausted first; in that case no deltas are produced.
pub fn plan_deduction(
    snapshot: &BucketSnapshot,
    amount: Decimal,
) -> Result<DeductionPlan, WalletError> {
    if amount < Decimal::ZERO {
        return Err(WalletError::NegativeAmount(amount));
    }

    let mut remaining = amount;
    let mut deltas = Vec::new();
    let mut touched_non_primary = false;

    for bucket in Bucket::DEDUCTION_ORDER {
        if remaining.is_zero() {
            break;
        }
        let balance = snapshot.get(bucket);
        let take = remaining.min(balance);
        if take > Decimal::ZERO {
            deltas.push(LedgerDelta::new(bucket, -take));
            if bucket != Bucket::Primary {
                touched_non_primary = true;
            }
            remaining -= take;
        }
    }

    if remaining > Decimal::ZERO {
        return Err(WalletError::InsufficientFunds {
            requested: amount,
            available: snapshot.sum_buckets(),
        });
    }

    Ok(DeductionPlan {
        deltas,
        touched_non_primary,
        total: amount,
    })
}

/// Plan crediting `amount` into a single bucket.
pub fn plan_credit(bucket: Bucket, amount: Decimal) -> Result<Vec<LedgerDelta>, WalletError> {
    if amount < Decimal::ZERO {
        return Err(WalletError::NegativeAmount(amount));
    }
    Ok(vec![LedgerDelta::new(bucket, amount)])
}
