//! Bonus rate policies
//!
//! The per-level referral bonus table is injectable rather than a single
//! constant: production flows have shipped with more than one table, so
//! engines take the policy at construction and config files can override
//! the rates without recompilation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-level referral bonus rates.
///
/// `rates[0]` is the percentage paid to the direct sponsor (level 1);
/// the table length bounds how deep the fan-out reaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusPolicy {
    #[serde(default = "default_rates")]
    rates: Vec<Decimal>,
}

fn default_rates() -> Vec<Decimal> {
    vec![
        Decimal::new(10, 0), // level 1: 10%
        Decimal::new(2, 0),  // level 2: 2%
        Decimal::new(2, 0),  // level 3: 2%
        Decimal::ONE,        // levels 4-10: 1%
        Decimal::ONE,
        Decimal::ONE,
        Decimal::ONE,
        Decimal::ONE,
        Decimal::ONE,
        Decimal::ONE,
    ]
}

impl BonusPolicy {
    /// The canonical table: 10% / 2% / 2% / 1% for levels 4-10.
    pub fn standard() -> Self {
        Self {
            rates: default_rates(),
        }
    }

    /// The boosted table used by promotional flows:
    /// 10% / 3% / 2% / 1.5% / 1.5% / 1% for levels 6-10.
    pub fn promotional() -> Self {
        Self {
            rates: vec![
                Decimal::new(10, 0),
                Decimal::new(3, 0),
                Decimal::new(2, 0),
                Decimal::new(15, 1),
                Decimal::new(15, 1),
                Decimal::ONE,
                Decimal::ONE,
                Decimal::ONE,
                Decimal::ONE,
                Decimal::ONE,
            ],
        }
    }

    /// Build a custom table. Levels beyond the table receive nothing.
    pub fn from_rates(rates: Vec<Decimal>) -> Self {
        Self { rates }
    }

    /// Bonus percentage for a 1-based level, `None` past the table depth.
    pub fn bonus_percent(&self, level: usize) -> Option<Decimal> {
        if level == 0 {
            return None;
        }
        self.rates.get(level - 1).copied()
    }

    /// How many ancestor levels receive a bounty.
    pub fn max_depth(&self) -> usize {
        self.rates.len()
    }
}

impl Default for BonusPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
