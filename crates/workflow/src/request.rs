//! Shared pieces of the deposit and withdrawal workflows: the resolver's
//! decision and the payout fee schedule.

use refledger_core::{round2, EarningsType};
use refledger_store::records::RequestStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a resolver decided about a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Approve,
    Reject,
}

impl Resolution {
    pub fn status(&self) -> RequestStatus {
        match self {
            Resolution::Approve => RequestStatus::Approved,
            Resolution::Reject => RequestStatus::Rejected,
        }
    }
}

/// Percentage fee charged on withdrawals, keyed by earnings type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    #[serde(default = "default_package_fee")]
    pub package_fee_percent: Decimal,
    #[serde(default = "default_referral_fee")]
    pub referral_fee_percent: Decimal,
    #[serde(default = "default_winning_fee")]
    pub winning_fee_percent: Decimal,
}

fn default_package_fee() -> Decimal {
    Decimal::TEN
}

fn default_referral_fee() -> Decimal {
    Decimal::TEN
}

fn default_winning_fee() -> Decimal {
    Decimal::ZERO
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            package_fee_percent: default_package_fee(),
            referral_fee_percent: default_referral_fee(),
            winning_fee_percent: default_winning_fee(),
        }
    }
}

/// Fee and net payout for one withdrawal amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub fee: Decimal,
    pub net: Decimal,
}

impl FeePolicy {
    pub fn fee_percent(&self, earnings_type: EarningsType) -> Decimal {
        match earnings_type {
            EarningsType::Package => self.package_fee_percent,
            EarningsType::Referral => self.referral_fee_percent,
            EarningsType::Winning => self.winning_fee_percent,
        }
    }

    /// Splits a gross withdrawal amount into fee and net payout.
    pub fn assess(&self, earnings_type: EarningsType, amount: Decimal) -> FeeBreakdown {
        let fee = round2(amount * self.fee_percent(earnings_type) / Decimal::ONE_HUNDRED);
        FeeBreakdown {
            fee,
            net: round2(amount - fee),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_package_withdrawal_pays_ten_percent() {
        let policy = FeePolicy::default();
        let breakdown = policy.assess(EarningsType::Package, dec!(250));
        assert_eq!(breakdown.fee, dec!(25));
        assert_eq!(breakdown.net, dec!(225));
    }

    #[test]
    fn test_winning_withdrawal_is_free() {
        let policy = FeePolicy::default();
        let breakdown = policy.assess(EarningsType::Winning, dec!(99.99));
        assert_eq!(breakdown.fee, dec!(0));
        assert_eq!(breakdown.net, dec!(99.99));
    }

    #[test]
    fn test_fee_rounds_half_up() {
        let policy = FeePolicy::default();
        // 10% of 0.25 is 0.025, which rounds up to 0.03.
        let breakdown = policy.assess(EarningsType::Referral, dec!(0.25));
        assert_eq!(breakdown.fee, dec!(0.03));
        assert_eq!(breakdown.net, dec!(0.22));
    }
}
