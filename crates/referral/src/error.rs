//! Referral graph errors

use thiserror::Error;

/// Errors from hierarchy parsing and chain building
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferralError {
    #[error("Invalid hierarchy for member {member_id}: {reason}")]
    InvalidHierarchy {
        member_id: String,
        reason: &'static str,
    },
}
