//! RefLedger wallet - Multi-bucket balances and waterfall deduction
//!
//! Pure balance arithmetic: snapshots are loaded by the store under its
//! write lock, plans are computed here, and the store applies the
//! resulting deltas atomically.

pub mod error;
pub mod snapshot;
pub mod waterfall;

pub use error::WalletError;
pub use snapshot::{BucketSnapshot, LedgerDelta};
pub use waterfall::{plan_credit, plan_deduction, DeductionPlan};
