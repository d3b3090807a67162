//! RefLedger commission engine
//!
//! Orchestrates purchases: waterfall deduction, yield computation, bounty
//! fan-out across the referral chain, and connection maturity/claims.

pub mod claim;
pub mod engine;
pub mod error;

pub use claim::ClaimResult;
pub use engine::{CommissionEngine, PurchaseResult};
pub use error::CommissionError;
