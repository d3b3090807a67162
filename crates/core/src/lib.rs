//! RefLedger core domain types
//!
//! Shared building blocks for the wallet ledger and commission engine:
//! non-negative [`Amount`], the earnings [`Bucket`] set, member [`Role`]s
//! and the injectable [`Clock`].

pub mod amount;
pub mod bucket;
pub mod clock;
pub mod role;

pub use amount::{clamp_non_negative, round2, Amount, AmountError};
pub use bucket::{Bucket, EarningsType};
pub use clock::{Clock, FixedClock, SystemClock};
pub use role::Role;
