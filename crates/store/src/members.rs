//! Member rows and earnings snapshots

use crate::error::StoreError;
use crate::store::{fmt_ts, parse_decimal, parse_ts, StoreTx};
use chrono::{DateTime, Utc};
use refledger_core::Role;
use refledger_referral::HierarchyPath;
use refledger_wallet::BucketSnapshot;
use rusqlite::{params, Row};

use crate::records::Member;

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<RawMember> {
    Ok(RawMember {
        id: row.get(0)?,
        display_name: row.get(1)?,
        role: row.get(2)?,
        active: row.get(3)?,
        restricted: row.get(4)?,
        primary_earnings: row.get(5)?,
        package_earnings: row.get(6)?,
        referral_bounty: row.get(7)?,
        winning_earnings: row.get(8)?,
        combined_earnings: row.get(9)?,
        hierarchy_path: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Raw TEXT columns before codec parsing.
struct RawMember {
    id: String,
    display_name: String,
    role: String,
    active: bool,
    restricted: bool,
    primary_earnings: String,
    package_earnings: String,
    referral_bounty: String,
    winning_earnings: String,
    combined_earnings: String,
    hierarchy_path: String,
    created_at: String,
}

impl RawMember {
    fn decode(self) -> Result<Member, StoreError> {
        let role = Role::from_str(&self.role)
            .ok_or_else(|| StoreError::Corrupt(format!("role {:?}", self.role)))?;
        let earnings = BucketSnapshot {
            primary: parse_decimal(&self.primary_earnings)?,
            package_earnings: parse_decimal(&self.package_earnings)?,
            referral_bounty: parse_decimal(&self.referral_bounty)?,
            winning_earnings: parse_decimal(&self.winning_earnings)?,
            combined: parse_decimal(&self.combined_earnings)?,
        };
        let hierarchy_path = HierarchyPath::parse(&self.hierarchy_path)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Member {
            id: self.id,
            display_name: self.display_name,
            role,
            active: self.active,
            restricted: self.restricted,
            earnings,
            hierarchy_path,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

const MEMBER_COLUMNS: &str = "id, display_name, role, active, restricted,
     primary_earnings, package_earnings, referral_bounty, winning_earnings,
     combined_earnings, hierarchy_path, created_at";

impl StoreTx<'_> {
    /// Insert a new member row with zeroed earnings.
    pub fn insert_member(&self, member: &Member) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO members
             (id, display_name, role, active, restricted,
              primary_earnings, package_earnings, referral_bounty,
              winning_earnings, combined_earnings, hierarchy_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                member.id,
                member.display_name,
                member.role.as_str(),
                member.active,
                member.restricted,
                member.earnings.primary.to_string(),
                member.earnings.package_earnings.to_string(),
                member.earnings.referral_bounty.to_string(),
                member.earnings.winning_earnings.to_string(),
                member.earnings.combined.to_string(),
                member.hierarchy_path.to_storage(),
                fmt_ts(member.created_at),
            ],
        )?;
        Ok(())
    }

    /// Register a member under an optional sponsor, materializing their
    /// hierarchy path from the sponsor's at creation time.
    pub fn register_member(
        &self,
        id: &str,
        display_name: &str,
        role: Role,
        sponsor_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Member, StoreError> {
        let path = match sponsor_id {
            Some(sponsor) => {
                let sponsor = self.get_member(sponsor)?;
                HierarchyPath::child_of(&sponsor.hierarchy_path, id)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?
            }
            None => HierarchyPath::root(id),
        };
        let member = Member::new(id, display_name, role, path, now);
        self.insert_member(&member)?;
        Ok(member)
    }

    /// Load a full member row.
    pub fn get_member(&self, id: &str) -> Result<Member, StoreError> {
        let mut stmt = self
            .tx
            .prepare(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"))?;
        let raw = stmt
            .query_row(params![id], member_from_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("member", id),
                other => StoreError::Database(other),
            })?;
        raw.decode()
    }

    /// Load just the earnings buckets for a member.
    ///
    /// Inside a write transaction this read is already serialized against
    /// other writers, so the snapshot cannot go stale before commit.
    pub fn load_earnings(&self, id: &str) -> Result<BucketSnapshot, StoreError> {
        let mut stmt = self.tx.prepare(
            "SELECT primary_earnings, package_earnings, referral_bounty,
                    winning_earnings, combined_earnings
             FROM members WHERE id = ?1",
        )?;
        let raw: (String, String, String, String, String) = stmt
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
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("member", id),
                other => StoreError::Database(other),
            })?;
        Ok(BucketSnapshot {
            primary: parse_decimal(&raw.0)?,
            package_earnings: parse_decimal(&raw.1)?,
            referral_bounty: parse_decimal(&raw.2)?,
            winning_earnings: parse_decimal(&raw.3)?,
            combined: parse_decimal(&raw.4)?,
        })
    }

    /// Write back a full earnings snapshot.
    pub fn save_earnings(&self, id: &str, snapshot: &BucketSnapshot) -> Result<(), StoreError> {
        let rows = self.tx.execute(
            "UPDATE members SET
                primary_earnings = ?1,
                package_earnings = ?2,
                referral_bounty = ?3,
                winning_earnings = ?4,
                combined_earnings = ?5
             WHERE id = ?6",
            params![
                snapshot.primary.to_string(),
                snapshot.package_earnings.to_string(),
                snapshot.referral_bounty.to_string(),
                snapshot.winning_earnings.to_string(),
                snapshot.combined.to_string(),
                id,
            ],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("member", id));
        }
        Ok(())
    }

    /// Mark a member active (first completed purchase).
    pub fn mark_active(&self, id: &str) -> Result<(), StoreError> {
        let rows = self
            .tx
            .execute("UPDATE members SET active = 1 WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::not_found("member", id));
        }
        Ok(())
    }

    /// Set or clear the restricted flag. Members are never deleted.
    pub fn set_restricted(&self, id: &str, restricted: bool) -> Result<(), StoreError> {
        let rows = self.tx.execute(
            "UPDATE members SET restricted = ?1 WHERE id = ?2",
            params![restricted, id],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("member", id));
        }
        Ok(())
    }

    /// All members holding the approver role, eligible for assignment.
    pub fn list_approvers(&self) -> Result<Vec<Member>, StoreError> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members
             WHERE role = ?1 AND restricted = 0
             ORDER BY id"
        ))?;
        let raws: Vec<RawMember> = stmt
            .query_map(params![Role::Approver.as_str()], member_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawMember::decode).collect()
    }
}
