//! Bucket snapshot
//!
//! A point-in-time copy of one member's earnings row, read under the
//! store's write lock. All mutations are planned against the snapshot and
//! written back in a single step, so a failed plan leaves nothing applied.

use refledger_core::{clamp_non_negative, round2, Bucket};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One signed balance change against a single bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDelta {
    pub bucket: Bucket,
    /// Positive for credits, negative for deductions.
    pub change: Decimal,
}

impl LedgerDelta {
    pub fn new(bucket: Bucket, change: Decimal) -> Self {
        Self { bucket, change }
    }
}

/// A member's four earnings buckets plus the derived combined total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketSnapshot {
    pub primary: Decimal,
    pub package_earnings: Decimal,
    pub referral_bounty: Decimal,
    pub winning_earnings: Decimal,
    /// Invariant: equals the sum of the four buckets at every
    /// transaction boundary.
    pub combined: Decimal,
}

impl BucketSnapshot {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: Bucket) -> Decimal {
        match bucket {
            Bucket::Primary => self.primary,
            Bucket::PackageEarnings => self.package_earnings,
            Bucket::ReferralBounty => self.referral_bounty,
            Bucket::WinningEarnings => self.winning_earnings,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Decimal {
        match bucket {
            Bucket::Primary => &mut self.primary,
            Bucket::PackageEarnings => &mut self.package_earnings,
            Bucket::ReferralBounty => &mut self.referral_bounty,
            Bucket::WinningEarnings => &mut self.winning_earnings,
        }
    }

    /// Sum of the four buckets.
    pub fn sum_buckets(&self) -> Decimal {
        self.primary + self.package_earnings + self.referral_bounty + self.winning_earnings
    }

    /// Check the combined-equals-sum invariant.
    pub fn is_consistent(&self) -> bool {
        self.combined == self.sum_buckets()
    }

    /// Apply a set of deltas, returning the resulting snapshot.
    ///
    /// Each bucket is rounded to 2 decimal places and floored at zero;
    /// the combined total is re-derived from the buckets so the
    /// consistency invariant holds by construction.
    pub fn apply(&self, deltas: &[LedgerDelta]) -> BucketSnapshot {
        let mut next = *self;
        for delta in deltas {
            let slot = next.get_mut(delta.bucket);
            *slot = clamp_non_negative(round2(*slot + delta.change));
        }
        next.combined = next.sum_buckets();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(p: Decimal, pe: Decimal, rb: Decimal, we: Decimal) -> BucketSnapshot {
        BucketSnapshot {
            primary: p,
            package_earnings: pe,
            referral_bounty: rb,
            winning_earnings: we,
            combined: p + pe + rb + we,
        }
    }

    #[test]
    fn test_apply_credit_updates_combined() {
        let snap = snapshot(dec!(100), dec!(0), dec!(0), dec!(0));
        let next = snap.apply(&[LedgerDelta::new(Bucket::ReferralBounty, dec!(25.5))]);

        assert_eq!(next.referral_bounty, dec!(25.5));
        assert_eq!(next.combined, dec!(125.5));
        assert!(next.is_consistent());
    }

    #[test]
    fn test_apply_clamps_at_zero() {
        let snap = snapshot(dec!(10), dec!(0), dec!(0), dec!(0));
        let next = snap.apply(&[LedgerDelta::new(Bucket::Primary, dec!(-10.009))]);

        assert_eq!(next.primary, Decimal::ZERO);
        assert_eq!(next.combined, Decimal::ZERO);
    }

    #[test]
    fn test_apply_rounds_to_two_places() {
        let snap = BucketSnapshot::zero();
        let next = snap.apply(&[LedgerDelta::new(Bucket::PackageEarnings, dec!(33.333333))]);

        assert_eq!(next.package_earnings, dec!(33.33));
        assert!(next.is_consistent());
    }

    #[test]
    fn test_inconsistent_snapshot_detected() {
        let mut snap = snapshot(dec!(50), dec!(0), dec!(0), dec!(0));
        snap.combined = dec!(60);
        assert!(!snap.is_consistent());
    }
}
