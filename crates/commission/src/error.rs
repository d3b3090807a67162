//! Commission engine errors

use chrono::{DateTime, Utc};
use refledger_referral::ReferralError;
use refledger_store::StoreError;
use refledger_wallet::WalletError;
use thiserror::Error;

/// Errors from purchase processing and claims
#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Referral(#[from] ReferralError),

    #[error("Package is disabled: {0}")]
    PackageDisabled(String),

    #[error("Connection {connection_id} does not belong to member {member_id}")]
    NotOwner {
        connection_id: String,
        member_id: String,
    },

    #[error("Connection {0} has already ended")]
    AlreadyClaimed(String),

    #[error("Connection {connection_id} matures at {matures_at}")]
    NotMatured {
        connection_id: String,
        matures_at: DateTime<Utc>,
    },
}
