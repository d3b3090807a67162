//! Error type for the request workflows.

use refledger_store::StoreError;
use refledger_wallet::WalletError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Member {0} already has a pending deposit request")]
    PendingDepositExists(String),

    #[error("Request {id} was already resolved as {status}")]
    AlreadyResolved { id: String, status: &'static str },

    #[error("Member {member_id} already requested a {earnings_type} withdrawal today")]
    DailyLimitReached {
        member_id: String,
        earnings_type: &'static str,
    },

    #[error("Member {0} is not allowed to resolve requests")]
    NotAuthorized(String),

    #[error("Resolver {resolver_id} is not assigned to request {request_id}")]
    NotAssigned {
        resolver_id: String,
        request_id: String,
    },
}
