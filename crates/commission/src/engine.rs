//! Purchase processing
//!
//! A purchase deducts the principal through the wallet waterfall, opens a
//! package connection, and fans referral bounties out across the buyer's
//! ancestor chain. Everything runs inside one store transaction; any
//! failure rolls the whole purchase back, so partial commission
//! distribution is never visible.

use crate::error::CommissionError;
use refledger_core::{round2, Bucket, Clock};
use refledger_referral::{build_chain, BonusPolicy};
use refledger_store::records::{NewBounty, NewTransaction, PackageConnection, TransactionKind};
use refledger_store::Store;
use refledger_wallet::{plan_credit, plan_deduction, WalletError};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Ancestors are credited in fixed-size batches: bounded work per batch
/// and a stable crediting order, so two purchases sharing ancestors cannot
/// deadlock on lock ordering.
const BOUNTY_BATCH_SIZE: usize = 100;

/// The outcome of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseResult {
    pub connection_id: String,
    pub yield_amount: Decimal,
    /// True when the principal drew on earnings buckets beyond primary.
    pub is_reinvestment: bool,
    /// Number of ancestors credited a bounty.
    pub bounties_paid: usize,
}

/// Orchestrates purchases and connection claims.
pub struct CommissionEngine {
    policy: BonusPolicy,
    clock: Arc<dyn Clock>,
}

impl CommissionEngine {
    pub fn new(policy: BonusPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    pub fn policy(&self) -> &BonusPolicy {
        &self.policy
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Process a member's purchase of a package.
    ///
    /// Flow: package check, waterfall deduction, connection + purchase
    /// log, bounty fan-out, first-purchase activation, commit.
    pub fn process_purchase(
        &self,
        store: &mut Store,
        member_id: &str,
        package_id: &str,
        amount: Decimal,
    ) -> Result<PurchaseResult, CommissionError> {
        let amount = round2(amount);
        let now = self.clock.now();
        let tx = store.transaction()?;

        let package = tx.get_package(package_id)?;
        if package.disabled {
            return Err(CommissionError::PackageDisabled(package.id));
        }

        // The member row is read under the transaction's write lock.
        let member = tx.get_member(member_id)?;
        let snapshot = member.earnings;
        if amount > snapshot.combined {
            return Err(WalletError::InsufficientFunds {
                requested: amount,
                available: snapshot.combined,
            }
            .into());
        }

        let plan = plan_deduction(&snapshot, amount)?;
        tx.save_earnings(member_id, &snapshot.apply(&plan.deltas))?;

        let yield_amount = round2(amount * package.percentage / Decimal::ONE_HUNDRED);
        let connection = PackageConnection::new(
            member_id,
            &package,
            amount,
            yield_amount,
            plan.touched_non_primary,
            now,
        );
        tx.insert_connection(&connection)?;
        tx.append_transaction(&NewTransaction::new(
            member_id,
            TransactionKind::Purchase,
            amount,
            format!("purchase of {} ({})", package.name, connection.id),
            now,
        ))?;

        // Fan bounties out across the ancestor chain, nearest first.
        let chain = build_chain(&member.hierarchy_path, member_id, &self.policy)?;
        let mut bounties_paid = 0;
        for batch in chain.chunks(BOUNTY_BATCH_SIZE) {
            let mut bounty_rows = Vec::with_capacity(batch.len());
            let mut log_rows = Vec::with_capacity(batch.len());
            for share in batch {
                let bonus = round2(amount * share.bonus_percent / Decimal::ONE_HUNDRED);
                if bonus.is_zero() {
                    continue;
                }
                let ancestor = tx.load_earnings(&share.referrer_id)?;
                let deltas = plan_credit(Bucket::ReferralBounty, bonus)?;
                tx.save_earnings(&share.referrer_id, &ancestor.apply(&deltas))?;

                bounty_rows.push(NewBounty {
                    earner_id: share.referrer_id.clone(),
                    source_member_id: member_id.to_string(),
                    connection_id: connection.id.clone(),
                    level: share.level,
                    percent: share.bonus_percent,
                    amount: bonus,
                    created_at: now,
                });
                log_rows.push(NewTransaction::new(
                    &share.referrer_id,
                    TransactionKind::Bounty,
                    bonus,
                    format!("level {} bounty from {}", share.level, member_id),
                    now,
                ));
                bounties_paid += 1;
            }
            // Log writes land after all credits in the batch.
            tx.append_bounties(&bounty_rows)?;
            tx.append_transactions(&log_rows)?;
        }

        if !member.active {
            tx.mark_active(member_id)?;
        }

        tx.commit()?;

        tracing::info!(
            member = member_id,
            connection = %connection.id,
            %amount,
            bounties = bounties_paid,
            reinvestment = plan.touched_non_primary,
            "Purchase committed"
        );

        Ok(PurchaseResult {
            connection_id: connection.id,
            yield_amount,
            is_reinvestment: plan.touched_non_primary,
            bounties_paid,
        })
    }
}
