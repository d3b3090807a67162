//! Append-only transaction and bounty logs

use crate::error::StoreError;
use crate::records::{BountyEntry, NewBounty, NewTransaction, TransactionEntry, TransactionKind};
use crate::store::{fmt_ts, parse_decimal, parse_ts, StoreTx};
use rusqlite::{params, Row};

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String, String, String)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode_transaction(
    raw: (i64, String, String, String, String, String),
) -> Result<TransactionEntry, StoreError> {
    let kind = TransactionKind::from_str(&raw.2)
        .ok_or_else(|| StoreError::Corrupt(format!("transaction kind {:?}", raw.2)))?;
    Ok(TransactionEntry {
        id: raw.0,
        member_id: raw.1,
        kind,
        amount: parse_decimal(&raw.3)?,
        note: raw.4,
        created_at: parse_ts(&raw.5)?,
    })
}

impl StoreTx<'_> {
    /// Append one transaction-log entry.
    pub fn append_transaction(&self, entry: &NewTransaction) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO transaction_log (member_id, kind, amount, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.member_id,
                entry.kind.as_str(),
                entry.amount.to_string(),
                entry.note,
                fmt_ts(entry.created_at),
            ],
        )?;
        Ok(())
    }

    /// Append a batch of transaction-log entries through one prepared
    /// statement.
    pub fn append_transactions(&self, entries: &[NewTransaction]) -> Result<(), StoreError> {
        let mut stmt = self.tx.prepare(
            "INSERT INTO transaction_log (member_id, kind, amount, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for entry in entries {
            stmt.execute(params![
                entry.member_id,
                entry.kind.as_str(),
                entry.amount.to_string(),
                entry.note,
                fmt_ts(entry.created_at),
            ])?;
        }
        Ok(())
    }

    /// A member's transaction history, newest first.
    pub fn list_transactions(
        &self,
        member_id: &str,
        limit: u32,
    ) -> Result<Vec<TransactionEntry>, StoreError> {
        let mut stmt = self.tx.prepare(
            "SELECT id, member_id, kind, amount, note, created_at
             FROM transaction_log
             WHERE member_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let raws: Vec<_> = stmt
            .query_map(params![member_id, limit], transaction_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(decode_transaction).collect()
    }

    /// Append a batch of bounty-log entries.
    pub fn append_bounties(&self, entries: &[NewBounty]) -> Result<(), StoreError> {
        let mut stmt = self.tx.prepare(
            "INSERT INTO bounty_log
             (earner_id, source_member_id, connection_id, level, percent, amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for entry in entries {
            stmt.execute(params![
                entry.earner_id,
                entry.source_member_id,
                entry.connection_id,
                entry.level as i64,
                entry.percent.to_string(),
                entry.amount.to_string(),
                fmt_ts(entry.created_at),
            ])?;
        }
        Ok(())
    }

    /// Bounties earned by a member, newest first.
    pub fn list_bounties(&self, earner_id: &str, limit: u32) -> Result<Vec<BountyEntry>, StoreError> {
        let mut stmt = self.tx.prepare(
            "SELECT id, earner_id, source_member_id, connection_id, level, percent,
                    amount, created_at
             FROM bounty_log
             WHERE earner_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let raws: Vec<(i64, String, String, String, i64, String, String, String)> = stmt
            .query_map(params![earner_id, limit], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter()
            .map(|raw| {
                Ok(BountyEntry {
                    id: raw.0,
                    earner_id: raw.1,
                    source_member_id: raw.2,
                    connection_id: raw.3,
                    level: raw.4 as usize,
                    percent: parse_decimal(&raw.5)?,
                    amount: parse_decimal(&raw.6)?,
                    created_at: parse_ts(&raw.7)?,
                })
            })
            .collect()
    }
}
