//! RefLedger referral graph
//!
//! Materialized hierarchy paths, injectable bonus-rate policies, and the
//! bounded-depth chain resolution the commission engine fans bounties
//! out through.

pub mod chain;
pub mod error;
pub mod path;
pub mod policy;

pub use chain::{build_chain, AncestorShare};
pub use error::ReferralError;
pub use path::HierarchyPath;
pub use policy::BonusPolicy;
