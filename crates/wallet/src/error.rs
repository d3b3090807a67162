//! Wallet errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from wallet planning operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Amount must be non-negative: {0}")]
    NegativeAmount(Decimal),
}
