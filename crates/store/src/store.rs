//! SQLite store and transaction handle
//!
//! One `Store` owns one connection. Every mutating flow runs inside a
//! [`StoreTx`] opened with `BEGIN IMMEDIATE`, which takes SQLite's write
//! lock up front: balance reads inside the transaction cannot be
//! interleaved with another writer, which is how the exclusive-row-lock
//! requirement on member earnings is met. Commit makes everything in the
//! flow visible at once; dropping the handle rolls everything back.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

/// SQLite-backed persistence for members, packages, requests and logs.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a store at the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS members (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                role TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 0,
                restricted INTEGER NOT NULL DEFAULT 0,
                primary_earnings TEXT NOT NULL,
                package_earnings TEXT NOT NULL,
                referral_bounty TEXT NOT NULL,
                winning_earnings TEXT NOT NULL,
                combined_earnings TEXT NOT NULL,
                hierarchy_path TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS packages (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                percentage TEXT NOT NULL,
                duration_days INTEGER NOT NULL,
                disabled INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS package_connections (
                id TEXT PRIMARY KEY,
                member_id TEXT NOT NULL REFERENCES members(id),
                package_id TEXT NOT NULL REFERENCES packages(id),
                principal TEXT NOT NULL,
                yield_amount TEXT NOT NULL,
                status TEXT NOT NULL,
                ready_to_claim INTEGER NOT NULL DEFAULT 0,
                is_reinvestment INTEGER NOT NULL DEFAULT 0,
                matures_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_connections_member
                ON package_connections(member_id, status);

            CREATE TABLE IF NOT EXISTS transaction_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                member_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                amount TEXT NOT NULL,
                note TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_transaction_log_member
                ON transaction_log(member_id, created_at);

            CREATE TABLE IF NOT EXISTS bounty_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                earner_id TEXT NOT NULL,
                source_member_id TEXT NOT NULL,
                connection_id TEXT NOT NULL,
                level INTEGER NOT NULL,
                percent TEXT NOT NULL,
                amount TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_bounty_log_earner
                ON bounty_log(earner_id, created_at);

            CREATE TABLE IF NOT EXISTS deposit_requests (
                id TEXT PRIMARY KEY,
                member_id TEXT NOT NULL REFERENCES members(id),
                amount TEXT NOT NULL,
                account_info TEXT NOT NULL,
                status TEXT NOT NULL,
                approved_by TEXT,
                note TEXT,
                created_at TEXT NOT NULL,
                resolved_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_deposit_requests_member
                ON deposit_requests(member_id, status);

            CREATE TABLE IF NOT EXISTS withdrawal_requests (
                id TEXT PRIMARY KEY,
                member_id TEXT NOT NULL REFERENCES members(id),
                amount TEXT NOT NULL,
                fee TEXT NOT NULL,
                net_amount TEXT NOT NULL,
                earnings_type TEXT NOT NULL,
                bank_info TEXT NOT NULL,
                status TEXT NOT NULL,
                approved_by TEXT,
                note TEXT,
                created_at TEXT NOT NULL,
                resolved_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_withdrawal_requests_member
                ON withdrawal_requests(member_id, earnings_type, status);
            CREATE INDEX IF NOT EXISTS idx_withdrawal_requests_approver
                ON withdrawal_requests(approved_by, created_at);",
        )?;

        Ok(())
    }

    /// Begin a write transaction holding the database write lock.
    pub fn transaction(&mut self) -> Result<StoreTx<'_>, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(StoreTx { tx })
    }
}

/// An open store transaction. All reads and writes issued through it see
/// a consistent snapshot and become visible together on [`StoreTx::commit`].
pub struct StoreTx<'a> {
    pub(crate) tx: rusqlite::Transaction<'a>,
}

impl StoreTx<'_> {
    /// Commit everything written through this handle.
    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit()?;
        Ok(())
    }
}

// === Column codec helpers ===

pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {raw:?}: {e}")))
}

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw).map_err(|e| StoreError::Corrupt(format!("decimal {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes_in_memory() {
        let store = Store::in_memory().unwrap();
        let count: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(count >= 6);
    }

    #[test]
    fn test_schema_initializes_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refledger.db");
        {
            let _store = Store::new(&path).unwrap();
        }
        // Reopening is idempotent.
        let _store = Store::new(&path).unwrap();
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let mut store = Store::in_memory().unwrap();
        {
            let tx = store.transaction().unwrap();
            tx.tx
                .execute(
                    "INSERT INTO packages (id, name, percentage, duration_days, disabled)
                     VALUES ('PKG-1', 'Starter', '20', 30, 0)",
                    [],
                )
                .unwrap();
            // Dropped without commit.
        }
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_timestamp_codec_roundtrip() {
        let now = Utc::now();
        let parsed = parse_ts(&fmt_ts(now)).unwrap();
        assert_eq!(parsed, now);
    }

    #[test]
    fn test_corrupt_decimal_reported() {
        assert!(matches!(
            parse_decimal("not-a-number"),
            Err(StoreError::Corrupt(_))
        ));
    }
}
