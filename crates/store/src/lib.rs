//! RefLedger SQLite persistence
//!
//! One database holds members and their earnings, package templates,
//! purchase connections, deposit/withdrawal requests and the append-only
//! logs. Engines open a [`StoreTx`] per mutating flow; everything inside
//! commits atomically or not at all.

pub mod error;
mod logs;
mod members;
mod packages;
pub mod records;
mod requests;
pub mod store;

pub use error::StoreError;
pub use records::{
    BountyEntry, ConnectionStatus, DepositRequest, Member, NewBounty, NewTransaction, Package,
    PackageConnection, RequestStatus, TransactionEntry, TransactionKind, WithdrawalRequest,
};
pub use store::{Store, StoreTx};
