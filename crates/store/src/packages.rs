//! Package templates and purchase connections

use crate::error::StoreError;
use crate::records::{ConnectionStatus, Package, PackageConnection};
use crate::store::{fmt_ts, parse_decimal, parse_ts, StoreTx};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

fn connection_from_row(row: &Row<'_>) -> rusqlite::Result<RawConnection> {
    Ok(RawConnection {
        id: row.get(0)?,
        member_id: row.get(1)?,
        package_id: row.get(2)?,
        principal: row.get(3)?,
        yield_amount: row.get(4)?,
        status: row.get(5)?,
        ready_to_claim: row.get(6)?,
        is_reinvestment: row.get(7)?,
        matures_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

struct RawConnection {
    id: String,
    member_id: String,
    package_id: String,
    principal: String,
    yield_amount: String,
    status: String,
    ready_to_claim: bool,
    is_reinvestment: bool,
    matures_at: String,
    created_at: String,
}

impl RawConnection {
    fn decode(self) -> Result<PackageConnection, StoreError> {
        let status = ConnectionStatus::from_str(&self.status)
            .ok_or_else(|| StoreError::Corrupt(format!("connection status {:?}", self.status)))?;
        Ok(PackageConnection {
            id: self.id,
            member_id: self.member_id,
            package_id: self.package_id,
            principal: parse_decimal(&self.principal)?,
            yield_amount: parse_decimal(&self.yield_amount)?,
            status,
            ready_to_claim: self.ready_to_claim,
            is_reinvestment: self.is_reinvestment,
            matures_at: parse_ts(&self.matures_at)?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

const CONNECTION_COLUMNS: &str = "id, member_id, package_id, principal, yield_amount,
     status, ready_to_claim, is_reinvestment, matures_at, created_at";

impl StoreTx<'_> {
    pub fn insert_package(&self, package: &Package) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO packages (id, name, percentage, duration_days, disabled)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                package.id,
                package.name,
                package.percentage.to_string(),
                package.duration_days,
                package.disabled,
            ],
        )?;
        Ok(())
    }

    pub fn get_package(&self, id: &str) -> Result<Package, StoreError> {
        let mut stmt = self.tx.prepare(
            "SELECT id, name, percentage, duration_days, disabled
             FROM packages WHERE id = ?1",
        )?;
        let raw: (String, String, String, i64, bool) = stmt
            .query_row(params![id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("package", id),
                other => StoreError::Database(other),
            })?;
        Ok(Package {
            id: raw.0,
            name: raw.1,
            percentage: parse_decimal(&raw.2)?,
            duration_days: raw.3,
            disabled: raw.4,
        })
    }

    pub fn insert_connection(&self, conn: &PackageConnection) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO package_connections
             (id, member_id, package_id, principal, yield_amount, status,
              ready_to_claim, is_reinvestment, matures_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                conn.id,
                conn.member_id,
                conn.package_id,
                conn.principal.to_string(),
                conn.yield_amount.to_string(),
                conn.status.as_str(),
                conn.ready_to_claim,
                conn.is_reinvestment,
                fmt_ts(conn.matures_at),
                fmt_ts(conn.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_connection(&self, id: &str) -> Result<PackageConnection, StoreError> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM package_connections WHERE id = ?1"
        ))?;
        let raw = stmt
            .query_row(params![id], connection_from_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("connection", id),
                other => StoreError::Database(other),
            })?;
        raw.decode()
    }

    /// All connections belonging to a member, newest first.
    pub fn list_connections(&self, member_id: &str) -> Result<Vec<PackageConnection>, StoreError> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM package_connections
             WHERE member_id = ?1 ORDER BY created_at DESC"
        ))?;
        let raws: Vec<RawConnection> = stmt
            .query_map(params![member_id], connection_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawConnection::decode).collect()
    }

    /// Flag ACTIVE connections whose maturity has passed as claimable.
    /// Returns the number of rows flagged.
    pub fn flag_matured_connections(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let rows = self.tx.execute(
            "UPDATE package_connections
             SET ready_to_claim = 1
             WHERE status = 'active' AND ready_to_claim = 0 AND matures_at <= ?1",
            params![fmt_ts(now)],
        )?;
        Ok(rows)
    }

    /// Transition a connection to ENDED once its payout has been claimed.
    pub fn end_connection(&self, id: &str) -> Result<(), StoreError> {
        let rows = self.tx.execute(
            "UPDATE package_connections
             SET status = 'ended', ready_to_claim = 0
             WHERE id = ?1",
            params![id],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("connection", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use chrono::{Duration, TimeZone};
    use refledger_core::Role;
    use rust_decimal_macros::dec;

    fn starter_package() -> Package {
        Package {
            id: "PKG-1".to_string(),
            name: "Starter".to_string(),
            percentage: dec!(20),
            duration_days: 30,
            disabled: false,
        }
    }

    #[test]
    fn test_package_roundtrip() {
        let mut store = Store::in_memory().unwrap();
        let tx = store.transaction().unwrap();
        tx.insert_package(&starter_package()).unwrap();

        let loaded = tx.get_package("PKG-1").unwrap();
        assert_eq!(loaded, starter_package());
        assert!(matches!(
            tx.get_package("PKG-9"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_connection_roundtrip() {
        let mut store = Store::in_memory().unwrap();
        let tx = store.transaction().unwrap();
        let package = starter_package();
        tx.insert_package(&package).unwrap();
        tx.register_member("MBR-A", "Alice", Role::Member, None, Utc::now())
            .unwrap();

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let conn = PackageConnection::new("MBR-A", &package, dec!(100), dec!(20), true, now);
        tx.insert_connection(&conn).unwrap();

        let loaded = tx.get_connection(&conn.id).unwrap();
        assert_eq!(loaded, conn);
        assert!(loaded.is_reinvestment);
    }

    #[test]
    fn test_flag_matured_connections() {
        let mut store = Store::in_memory().unwrap();
        let tx = store.transaction().unwrap();
        let package = starter_package();
        tx.insert_package(&package).unwrap();
        tx.register_member("MBR-A", "Alice", Role::Member, None, Utc::now())
            .unwrap();

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let conn = PackageConnection::new("MBR-A", &package, dec!(100), dec!(20), false, now);
        tx.insert_connection(&conn).unwrap();

        // Before maturity nothing is flagged.
        assert_eq!(tx.flag_matured_connections(now + Duration::days(29)).unwrap(), 0);
        // At maturity the connection becomes claimable.
        assert_eq!(tx.flag_matured_connections(now + Duration::days(30)).unwrap(), 1);
        assert!(tx.get_connection(&conn.id).unwrap().ready_to_claim);
    }

    #[test]
    fn test_end_connection() {
        let mut store = Store::in_memory().unwrap();
        let tx = store.transaction().unwrap();
        let package = starter_package();
        tx.insert_package(&package).unwrap();
        tx.register_member("MBR-A", "Alice", Role::Member, None, Utc::now())
            .unwrap();
        let conn = PackageConnection::new("MBR-A", &package, dec!(100), dec!(20), false, Utc::now());
        tx.insert_connection(&conn).unwrap();

        tx.end_connection(&conn.id).unwrap();
        let loaded = tx.get_connection(&conn.id).unwrap();
        assert_eq!(loaded.status, ConnectionStatus::Ended);
        assert!(!loaded.ready_to_claim);
    }
}
