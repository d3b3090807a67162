//! Deposit and withdrawal request workflows.
//!
//! Both follow the same PENDING -> APPROVED/REJECTED state machine, but
//! differ in when the ledger moves: deposits credit at approval, while
//! withdrawals reserve funds at creation and refund on rejection.

mod deposit;
mod error;
mod request;
mod withdrawal;

pub use deposit::DepositWorkflow;
pub use error::WorkflowError;
pub use request::{FeeBreakdown, FeePolicy, Resolution};
pub use withdrawal::WithdrawalWorkflow;
