//! Maturity sweep and claims
//!
//! Connections sit ACTIVE until their maturity timestamp. A sweep flags
//! matured ones as claimable; claiming pays principal plus yield into the
//! member's package-earnings bucket and ends the connection.

use crate::engine::CommissionEngine;
use crate::error::CommissionError;
use refledger_core::{round2, Bucket};
use refledger_store::records::{ConnectionStatus, NewTransaction, TransactionKind};
use refledger_store::Store;
use refledger_wallet::plan_credit;
use rust_decimal::Decimal;

/// The outcome of a successful claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimResult {
    pub connection_id: String,
    /// Principal plus yield, credited to package earnings.
    pub payout: Decimal,
}

impl CommissionEngine {
    /// Flag every ACTIVE connection past maturity as ready to claim.
    /// Returns how many were flagged.
    pub fn sweep_matured(&self, store: &mut Store) -> Result<usize, CommissionError> {
        let now = self.clock().now();
        let tx = store.transaction()?;
        let flagged = tx.flag_matured_connections(now)?;
        tx.commit()?;
        if flagged > 0 {
            tracing::debug!(flagged, "Flagged matured connections");
        }
        Ok(flagged)
    }

    /// Claim a fully matured connection.
    ///
    /// Transitions ACTIVE -> ENDED exactly once; a second claim fails with
    /// `AlreadyClaimed` and changes nothing.
    pub fn claim(
        &self,
        store: &mut Store,
        member_id: &str,
        connection_id: &str,
    ) -> Result<ClaimResult, CommissionError> {
        let now = self.clock().now();
        let tx = store.transaction()?;

        let connection = tx.get_connection(connection_id)?;
        if connection.member_id != member_id {
            return Err(CommissionError::NotOwner {
                connection_id: connection_id.to_string(),
                member_id: member_id.to_string(),
            });
        }
        if connection.status != ConnectionStatus::Active {
            return Err(CommissionError::AlreadyClaimed(connection_id.to_string()));
        }
        if now < connection.matures_at {
            return Err(CommissionError::NotMatured {
                connection_id: connection_id.to_string(),
                matures_at: connection.matures_at,
            });
        }

        let payout = round2(connection.principal + connection.yield_amount);
        let snapshot = tx.load_earnings(member_id)?;
        let deltas = plan_credit(Bucket::PackageEarnings, payout)?;
        tx.save_earnings(member_id, &snapshot.apply(&deltas))?;

        tx.end_connection(connection_id)?;
        tx.append_transaction(&NewTransaction::new(
            member_id,
            TransactionKind::PackageClaim,
            payout,
            format!("claim of {connection_id}"),
            now,
        ))?;
        tx.commit()?;

        tracing::info!(member = member_id, connection = connection_id, %payout, "Claim committed");

        Ok(ClaimResult {
            connection_id: connection_id.to_string(),
            payout,
        })
    }
}
