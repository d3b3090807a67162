//! Persistent record types
//!
//! Row-level structs shared by the engines. Status enums carry
//! `as_str`/`from_str` codecs for their stored TEXT form.

use chrono::{DateTime, Utc};
use refledger_core::{EarningsType, Role};
use refledger_referral::HierarchyPath;
use refledger_wallet::BucketSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A member account. Never deleted; misbehaving accounts are restricted
/// via the flag instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub display_name: String,
    pub role: Role,
    /// Set on the member's first completed purchase.
    pub active: bool,
    pub restricted: bool,
    pub earnings: BucketSnapshot,
    pub hierarchy_path: HierarchyPath,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
        hierarchy_path: HierarchyPath,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
            active: false,
            restricted: false,
            earnings: BucketSnapshot::zero(),
            hierarchy_path,
            created_at,
        }
    }
}

/// A yield template. Admin CRUD happens elsewhere; the engine only reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    /// Percentage return over the package duration.
    pub percentage: Decimal,
    pub duration_days: i64,
    pub disabled: bool,
}

/// Status of a purchase instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Active,
    Ended,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Active => "active",
            ConnectionStatus::Ended => "ended",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ConnectionStatus::Active),
            "ended" => Some(ConnectionStatus::Ended),
            _ => None,
        }
    }
}

/// One purchase of a package by a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConnection {
    pub id: String,
    pub member_id: String,
    pub package_id: String,
    pub principal: Decimal,
    pub yield_amount: Decimal,
    pub status: ConnectionStatus,
    pub ready_to_claim: bool,
    /// True when the purchase drew on earnings buckets beyond primary.
    pub is_reinvestment: bool,
    pub matures_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PackageConnection {
    pub fn new(
        member_id: &str,
        package: &Package,
        principal: Decimal,
        yield_amount: Decimal,
        is_reinvestment: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: prefixed_id("CON"),
            member_id: member_id.to_string(),
            package_id: package.id.clone(),
            principal,
            yield_amount,
            status: ConnectionStatus::Active,
            ready_to_claim: false,
            is_reinvestment,
            matures_at: now + chrono::Duration::days(package.duration_days),
            created_at: now,
        }
    }
}

/// Kind tag on a transaction-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Purchase,
    Bounty,
    PackageClaim,
    DepositRequested,
    DepositApproved,
    DepositRejected,
    WithdrawalRequested,
    WithdrawalApproved,
    WithdrawalRejected,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Bounty => "bounty",
            TransactionKind::PackageClaim => "package_claim",
            TransactionKind::DepositRequested => "deposit_requested",
            TransactionKind::DepositApproved => "deposit_approved",
            TransactionKind::DepositRejected => "deposit_rejected",
            TransactionKind::WithdrawalRequested => "withdrawal_requested",
            TransactionKind::WithdrawalApproved => "withdrawal_approved",
            TransactionKind::WithdrawalRejected => "withdrawal_rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(TransactionKind::Purchase),
            "bounty" => Some(TransactionKind::Bounty),
            "package_claim" => Some(TransactionKind::PackageClaim),
            "deposit_requested" => Some(TransactionKind::DepositRequested),
            "deposit_approved" => Some(TransactionKind::DepositApproved),
            "deposit_rejected" => Some(TransactionKind::DepositRejected),
            "withdrawal_requested" => Some(TransactionKind::WithdrawalRequested),
            "withdrawal_approved" => Some(TransactionKind::WithdrawalApproved),
            "withdrawal_rejected" => Some(TransactionKind::WithdrawalRejected),
            _ => None,
        }
    }
}

/// A balance-affecting event, appended once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEntry {
    pub id: i64,
    pub member_id: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Input for appending to the transaction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub member_id: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(
        member_id: &str,
        kind: TransactionKind,
        amount: Decimal,
        note: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            member_id: member_id.to_string(),
            kind,
            amount,
            note: note.into(),
            created_at,
        }
    }
}

/// A referral bounty payout, appended once per credited ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BountyEntry {
    pub id: i64,
    pub earner_id: String,
    pub source_member_id: String,
    pub connection_id: String,
    pub level: usize,
    pub percent: Decimal,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Input for appending to the bounty log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBounty {
    pub earner_id: String,
    pub source_member_id: String,
    pub connection_id: String,
    pub level: usize,
    pub percent: Decimal,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Resolution state of a deposit or withdrawal request.
///
/// Approved and Rejected are terminal; no request ever leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// A member's request to have an external deposit credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    pub id: String,
    pub member_id: String,
    pub amount: Decimal,
    /// Free-form payment reference supplied by the member.
    pub account_info: String,
    pub status: RequestStatus,
    pub approved_by: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl DepositRequest {
    pub fn new(
        member_id: &str,
        amount: Decimal,
        account_info: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: prefixed_id("DEP"),
            member_id: member_id.to_string(),
            amount,
            account_info: account_info.into(),
            status: RequestStatus::Pending,
            approved_by: None,
            note: None,
            created_at,
            resolved_at: None,
        }
    }
}

/// A member's request to pay out earnings. Funds are reserved the moment
/// the request is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub id: String,
    pub member_id: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub earnings_type: EarningsType,
    pub bank_info: String,
    pub status: RequestStatus,
    /// Assigned at creation by approver load-balancing.
    pub approved_by: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl WithdrawalRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        member_id: &str,
        amount: Decimal,
        fee: Decimal,
        net_amount: Decimal,
        earnings_type: EarningsType,
        bank_info: impl Into<String>,
        approved_by: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: prefixed_id("WDR"),
            member_id: member_id.to_string(),
            amount,
            fee,
            net_amount,
            earnings_type,
            bank_info: bank_info.into(),
            status: RequestStatus::Pending,
            approved_by,
            note: None,
            created_at,
            resolved_at: None,
        }
    }
}

/// Short uppercase id in the `PFX-XXXXXXXX` form used across the platform.
pub fn prefixed_id(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix,
        uuid::Uuid::new_v4().to_string()[..8].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_prefixed_id_shape() {
        let id = prefixed_id("CON");
        assert!(id.starts_with("CON-"));
        assert_eq!(id.len(), 12);
    }

    #[test]
    fn test_connection_maturity() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let package = Package {
            id: "PKG-1".to_string(),
            name: "Starter".to_string(),
            percentage: dec!(20),
            duration_days: 30,
            disabled: false,
        };
        let conn = PackageConnection::new("MBR-A", &package, dec!(100), dec!(20), false, now);

        assert_eq!(conn.status, ConnectionStatus::Active);
        assert!(!conn.ready_to_claim);
        assert_eq!(conn.matures_at, now + chrono::Duration::days(30));
    }

    #[test]
    fn test_request_status_terminality() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_status_codecs() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::from_str(status.as_str()), Some(status));
        }
        for status in [ConnectionStatus::Active, ConnectionStatus::Ended] {
            assert_eq!(ConnectionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TransactionKind::from_str("purchase"), Some(TransactionKind::Purchase));
        assert_eq!(TransactionKind::from_str("refund"), None);
    }
}
