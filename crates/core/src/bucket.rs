//! Earnings buckets
//!
//! A member's balance is split across four named buckets plus a derived
//! combined total. Spends drain the buckets in a fixed waterfall order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of a member's named sub-balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Deposited funds, drained first
    Primary,
    /// Yield paid out by matured packages
    PackageEarnings,
    /// Referral commissions from descendants' purchases
    ReferralBounty,
    /// Reward-wheel winnings
    WinningEarnings,
}

impl Bucket {
    /// Waterfall priority: primary is drained first, winnings last.
    pub const DEDUCTION_ORDER: [Bucket; 4] = [
        Bucket::Primary,
        Bucket::PackageEarnings,
        Bucket::ReferralBounty,
        Bucket::WinningEarnings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Primary => "primary",
            Bucket::PackageEarnings => "package_earnings",
            Bucket::ReferralBounty => "referral_bounty",
            Bucket::WinningEarnings => "winning_earnings",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(Bucket::Primary),
            "package_earnings" => Some(Bucket::PackageEarnings),
            "referral_bounty" => Some(Bucket::ReferralBounty),
            "winning_earnings" => Some(Bucket::WinningEarnings),
            _ => None,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The earnings categories a member may withdraw from.
///
/// The primary bucket holds deposits and is only spent, never withdrawn,
/// so it has no earnings type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningsType {
    Package,
    Referral,
    Winning,
}

impl EarningsType {
    /// The bucket this earnings type draws from.
    pub fn bucket(&self) -> Bucket {
        match self {
            EarningsType::Package => Bucket::PackageEarnings,
            EarningsType::Referral => Bucket::ReferralBounty,
            EarningsType::Winning => Bucket::WinningEarnings,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EarningsType::Package => "package",
            EarningsType::Referral => "referral",
            EarningsType::Winning => "winning",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "package" => Some(EarningsType::Package),
            "referral" => Some(EarningsType::Referral),
            "winning" => Some(EarningsType::Winning),
            _ => None,
        }
    }
}

impl fmt::Display for EarningsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduction_order_starts_at_primary() {
        assert_eq!(Bucket::DEDUCTION_ORDER[0], Bucket::Primary);
        assert_eq!(Bucket::DEDUCTION_ORDER[3], Bucket::WinningEarnings);
    }

    #[test]
    fn test_bucket_str_roundtrip() {
        for bucket in Bucket::DEDUCTION_ORDER {
            assert_eq!(Bucket::from_str(bucket.as_str()), Some(bucket));
        }
        assert_eq!(Bucket::from_str("combined"), None);
    }

    #[test]
    fn test_earnings_type_maps_to_bucket() {
        assert_eq!(EarningsType::Package.bucket(), Bucket::PackageEarnings);
        assert_eq!(EarningsType::Referral.bucket(), Bucket::ReferralBounty);
        assert_eq!(EarningsType::Winning.bucket(), Bucket::WinningEarnings);
    }

    #[test]
    fn test_earnings_type_str_roundtrip() {
        for et in [
            EarningsType::Package,
            EarningsType::Referral,
            EarningsType::Winning,
        ] {
            assert_eq!(EarningsType::from_str(et.as_str()), Some(et));
        }
        assert_eq!(EarningsType::from_str("primary"), None);
    }
}
