//! Deposit and withdrawal request rows

use crate::error::StoreError;
use crate::records::{DepositRequest, RequestStatus, WithdrawalRequest};
use crate::store::{fmt_ts, parse_decimal, parse_ts, StoreTx};
use chrono::{DateTime, Utc};
use refledger_core::EarningsType;
use rusqlite::{params, Row};

fn deposit_from_row(row: &Row<'_>) -> rusqlite::Result<RawDeposit> {
    Ok(RawDeposit {
        id: row.get(0)?,
        member_id: row.get(1)?,
        amount: row.get(2)?,
        account_info: row.get(3)?,
        status: row.get(4)?,
        approved_by: row.get(5)?,
        note: row.get(6)?,
        created_at: row.get(7)?,
        resolved_at: row.get(8)?,
    })
}

struct RawDeposit {
    id: String,
    member_id: String,
    amount: String,
    account_info: String,
    status: String,
    approved_by: Option<String>,
    note: Option<String>,
    created_at: String,
    resolved_at: Option<String>,
}

impl RawDeposit {
    fn decode(self) -> Result<DepositRequest, StoreError> {
        let status = RequestStatus::from_str(&self.status)
            .ok_or_else(|| StoreError::Corrupt(format!("request status {:?}", self.status)))?;
        Ok(DepositRequest {
            id: self.id,
            member_id: self.member_id,
            amount: parse_decimal(&self.amount)?,
            account_info: self.account_info,
            status,
            approved_by: self.approved_by,
            note: self.note,
            created_at: parse_ts(&self.created_at)?,
            resolved_at: self.resolved_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

fn withdrawal_from_row(row: &Row<'_>) -> rusqlite::Result<RawWithdrawal> {
    Ok(RawWithdrawal {
        id: row.get(0)?,
        member_id: row.get(1)?,
        amount: row.get(2)?,
        fee: row.get(3)?,
        net_amount: row.get(4)?,
        earnings_type: row.get(5)?,
        bank_info: row.get(6)?,
        status: row.get(7)?,
        approved_by: row.get(8)?,
        note: row.get(9)?,
        created_at: row.get(10)?,
        resolved_at: row.get(11)?,
    })
}

struct RawWithdrawal {
    id: String,
    member_id: String,
    amount: String,
    fee: String,
    net_amount: String,
    earnings_type: String,
    bank_info: String,
    status: String,
    approved_by: Option<String>,
    note: Option<String>,
    created_at: String,
    resolved_at: Option<String>,
}

impl RawWithdrawal {
    fn decode(self) -> Result<WithdrawalRequest, StoreError> {
        let status = RequestStatus::from_str(&self.status)
            .ok_or_else(|| StoreError::Corrupt(format!("request status {:?}", self.status)))?;
        let earnings_type = EarningsType::from_str(&self.earnings_type).ok_or_else(|| {
            StoreError::Corrupt(format!("earnings type {:?}", self.earnings_type))
        })?;
        Ok(WithdrawalRequest {
            id: self.id,
            member_id: self.member_id,
            amount: parse_decimal(&self.amount)?,
            fee: parse_decimal(&self.fee)?,
            net_amount: parse_decimal(&self.net_amount)?,
            earnings_type,
            bank_info: self.bank_info,
            status,
            approved_by: self.approved_by,
            note: self.note,
            created_at: parse_ts(&self.created_at)?,
            resolved_at: self.resolved_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

const WITHDRAWAL_COLUMNS: &str = "id, member_id, amount, fee, net_amount, earnings_type,
     bank_info, status, approved_by, note, created_at, resolved_at";

impl StoreTx<'_> {
    // === Deposits ===

    pub fn insert_deposit(&self, request: &DepositRequest) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO deposit_requests
             (id, member_id, amount, account_info, status, approved_by, note,
              created_at, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                request.id,
                request.member_id,
                request.amount.to_string(),
                request.account_info,
                request.status.as_str(),
                request.approved_by,
                request.note,
                fmt_ts(request.created_at),
                request.resolved_at.map(fmt_ts),
            ],
        )?;
        Ok(())
    }

    pub fn get_deposit(&self, id: &str) -> Result<DepositRequest, StoreError> {
        let mut stmt = self.tx.prepare(
            "SELECT id, member_id, amount, account_info, status, approved_by, note,
                    created_at, resolved_at
             FROM deposit_requests WHERE id = ?1",
        )?;
        let raw = stmt
            .query_row(params![id], deposit_from_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("deposit request", id),
                other => StoreError::Database(other),
            })?;
        raw.decode()
    }

    /// Does the member already have a PENDING deposit request?
    pub fn has_pending_deposit(&self, member_id: &str) -> Result<bool, StoreError> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM deposit_requests
             WHERE member_id = ?1 AND status = 'pending'",
            params![member_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record a deposit resolution. The caller has already verified the
    /// request is still PENDING inside this same transaction.
    pub fn resolve_deposit(
        &self,
        id: &str,
        status: RequestStatus,
        approver_id: &str,
        note: Option<&str>,
        resolved_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let rows = self.tx.execute(
            "UPDATE deposit_requests
             SET status = ?1, approved_by = ?2, note = ?3, resolved_at = ?4
             WHERE id = ?5",
            params![
                status.as_str(),
                approver_id,
                note,
                fmt_ts(resolved_at),
                id
            ],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("deposit request", id));
        }
        Ok(())
    }

    // === Withdrawals ===

    pub fn insert_withdrawal(&self, request: &WithdrawalRequest) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO withdrawal_requests
             (id, member_id, amount, fee, net_amount, earnings_type, bank_info,
              status, approved_by, note, created_at, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                request.id,
                request.member_id,
                request.amount.to_string(),
                request.fee.to_string(),
                request.net_amount.to_string(),
                request.earnings_type.as_str(),
                request.bank_info,
                request.status.as_str(),
                request.approved_by,
                request.note,
                fmt_ts(request.created_at),
                request.resolved_at.map(fmt_ts),
            ],
        )?;
        Ok(())
    }

    pub fn get_withdrawal(&self, id: &str) -> Result<WithdrawalRequest, StoreError> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests WHERE id = ?1"
        ))?;
        let raw = stmt
            .query_row(params![id], withdrawal_from_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::not_found("withdrawal request", id)
                }
                other => StoreError::Database(other),
            })?;
        raw.decode()
    }

    /// PENDING or APPROVED withdrawals of one earnings type created within
    /// `[from, to)`. RFC 3339 UTC strings compare lexicographically, so the
    /// range filter runs in SQL.
    pub fn withdrawals_in_window(
        &self,
        member_id: &str,
        earnings_type: EarningsType,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<WithdrawalRequest>, StoreError> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests
             WHERE member_id = ?1 AND earnings_type = ?2
               AND status IN ('pending', 'approved')
               AND created_at >= ?3 AND created_at < ?4
             ORDER BY created_at"
        ))?;
        let raws: Vec<RawWithdrawal> = stmt
            .query_map(
                params![member_id, earnings_type.as_str(), fmt_ts(from), fmt_ts(to)],
                withdrawal_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawWithdrawal::decode).collect()
    }

    /// How many withdrawals were assigned to an approver within `[from, to)`.
    /// Used for load-balanced assignment; a soft heuristic, so no locking
    /// subtleties apply.
    pub fn assigned_count_in_window(
        &self,
        approver_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM withdrawal_requests
             WHERE approved_by = ?1 AND created_at >= ?2 AND created_at < ?3",
            params![approver_id, fmt_ts(from), fmt_ts(to)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Record a withdrawal resolution. Pending-state gating happens in the
    /// workflow inside this same transaction.
    pub fn resolve_withdrawal(
        &self,
        id: &str,
        status: RequestStatus,
        approver_id: &str,
        note: Option<&str>,
        resolved_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let rows = self.tx.execute(
            "UPDATE withdrawal_requests
             SET status = ?1, approved_by = ?2, note = ?3, resolved_at = ?4
             WHERE id = ?5",
            params![
                status.as_str(),
                approver_id,
                note,
                fmt_ts(resolved_at),
                id
            ],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("withdrawal request", id));
        }
        Ok(())
    }
}
