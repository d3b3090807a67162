//! Withdrawal requests: funds are reserved from the chosen earnings bucket
//! the moment the request is filed, and refunded only on rejection. Each
//! member may file at most one request per earnings type per business day.

use std::sync::Arc;

use refledger_core::{round2, Clock, EarningsType};
use refledger_store::records::{NewTransaction, TransactionKind, WithdrawalRequest};
use refledger_store::{Store, StoreTx};
use refledger_wallet::{plan_credit, LedgerDelta, WalletError};
use rust_decimal::Decimal;

use crate::error::WorkflowError;
use crate::request::{FeePolicy, Resolution};

pub struct WithdrawalWorkflow {
    clock: Arc<dyn Clock>,
    fees: FeePolicy,
}

impl WithdrawalWorkflow {
    pub fn new(fees: FeePolicy, clock: Arc<dyn Clock>) -> Self {
        Self { clock, fees }
    }

    pub fn fees(&self) -> &FeePolicy {
        &self.fees
    }

    /// Files a withdrawal against one earnings bucket. The gross amount is
    /// deducted immediately so the same funds cannot back two requests, and
    /// the least-loaded approver is assigned up front.
    pub fn create(
        &self,
        store: &mut Store,
        member_id: &str,
        amount: Decimal,
        earnings_type: EarningsType,
        bank_info: &str,
    ) -> Result<WithdrawalRequest, WorkflowError> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::NegativeAmount(amount).into());
        }
        let amount = round2(amount);
        let now = self.clock.now();
        let (day_start, day_end) = self.clock.business_day_bounds(now);

        let tx = store.transaction()?;
        tx.get_member(member_id)?;

        let todays = tx.withdrawals_in_window(member_id, earnings_type, day_start, day_end)?;
        if !todays.is_empty() {
            return Err(WorkflowError::DailyLimitReached {
                member_id: member_id.to_string(),
                earnings_type: earnings_type.as_str(),
            });
        }

        let snapshot = tx.load_earnings(member_id)?;
        let available = snapshot.get(earnings_type.bucket());
        if amount > available {
            return Err(WalletError::InsufficientFunds {
                requested: amount,
                available,
            }
            .into());
        }

        // Reserve the gross amount now; a rejection refunds it later.
        let deltas = [LedgerDelta::new(earnings_type.bucket(), -amount)];
        tx.save_earnings(member_id, &snapshot.apply(&deltas))?;

        let breakdown = self.fees.assess(earnings_type, amount);
        let approver = pick_approver(&tx, day_start, day_end)?;
        let request = WithdrawalRequest::new(
            member_id,
            amount,
            breakdown.fee,
            breakdown.net,
            earnings_type,
            bank_info,
            approver,
            now,
        );
        tx.insert_withdrawal(&request)?;
        tx.append_transaction(&NewTransaction::new(
            member_id,
            TransactionKind::WithdrawalRequested,
            amount,
            format!(
                "Withdrawal requested ({}): fee {}, net {}",
                request.id, breakdown.fee, breakdown.net
            ),
            now,
        ))?;
        tx.commit()?;

        tracing::info!(
            request_id = %request.id,
            member_id = %member_id,
            amount = %amount,
            earnings_type = earnings_type.as_str(),
            approver = request.approved_by.as_deref().unwrap_or("-"),
            "withdrawal requested"
        );
        Ok(request)
    }

    /// Resolves a pending withdrawal. Approvers may only act on requests
    /// assigned to them; admins may resolve any request. Approval changes
    /// no balances (the funds were reserved at creation); rejection refunds
    /// the gross amount to the originating bucket.
    pub fn resolve(
        &self,
        store: &mut Store,
        request_id: &str,
        resolver_id: &str,
        decision: Resolution,
        note: Option<&str>,
    ) -> Result<WithdrawalRequest, WorkflowError> {
        let now = self.clock.now();

        let tx = store.transaction()?;
        let resolver = tx.get_member(resolver_id)?;
        if !resolver.role.can_resolve() {
            return Err(WorkflowError::NotAuthorized(resolver_id.to_string()));
        }

        let mut request = tx.get_withdrawal(request_id)?;
        if request.status.is_terminal() {
            return Err(WorkflowError::AlreadyResolved {
                id: request_id.to_string(),
                status: request.status.as_str(),
            });
        }
        if resolver.role.is_restricted_resolver()
            && request.approved_by.as_deref() != Some(resolver_id)
        {
            return Err(WorkflowError::NotAssigned {
                resolver_id: resolver_id.to_string(),
                request_id: request_id.to_string(),
            });
        }

        let (kind, logged_amount) = match decision {
            Resolution::Approve => (TransactionKind::WithdrawalApproved, request.net_amount),
            Resolution::Reject => {
                let snapshot = tx.load_earnings(&request.member_id)?;
                let deltas = plan_credit(request.earnings_type.bucket(), request.amount)?;
                tx.save_earnings(&request.member_id, &snapshot.apply(&deltas))?;
                (TransactionKind::WithdrawalRejected, request.amount)
            }
        };

        tx.resolve_withdrawal(request_id, decision.status(), resolver_id, note, now)?;
        tx.append_transaction(&NewTransaction::new(
            &request.member_id,
            kind,
            logged_amount,
            format!(
                "Withdrawal {} ({})",
                decision.status().as_str(),
                request.id
            ),
            now,
        ))?;
        tx.commit()?;

        request.status = decision.status();
        request.approved_by = Some(resolver_id.to_string());
        request.note = note.map(str::to_string);
        request.resolved_at = Some(now);

        tracing::info!(
            request_id = %request.id,
            resolver_id = %resolver_id,
            status = request.status.as_str(),
            "withdrawal resolved"
        );
        Ok(request)
    }
}

/// Least-loaded assignment: among unrestricted approvers, pick the one with
/// the fewest requests assigned so far today. `list_approvers` orders by id,
/// so ties go to the lexicographically first approver.
fn pick_approver(
    tx: &StoreTx,
    day_start: chrono::DateTime<chrono::Utc>,
    day_end: chrono::DateTime<chrono::Utc>,
) -> Result<Option<String>, WorkflowError> {
    let mut best: Option<(String, u64)> = None;
    for approver in tx.list_approvers()? {
        let load = tx.assigned_count_in_window(&approver.id, day_start, day_end)?;
        match &best {
            Some((_, current)) if load >= *current => {}
            _ => best = Some((approver.id, load)),
        }
    }
    Ok(best.map(|(id, _)| id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use refledger_core::{Bucket, FixedClock, Role};
    use refledger_store::records::RequestStatus;
    use rust_decimal_macros::dec;

    fn clock() -> Arc<FixedClock> {
        // 09:00 UTC is 17:00 at the business offset, mid business day.
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap(),
        ))
    }

    fn workflow(clock: Arc<FixedClock>) -> WithdrawalWorkflow {
        WithdrawalWorkflow::new(FeePolicy::default(), clock)
    }

    fn seed_members(store: &mut Store) {
        let tx = store.transaction().unwrap();
        tx.register_member("MBR-A", "Alice", Role::Member, None, Utc::now())
            .unwrap();
        tx.register_member("APP-1", "Olga", Role::Approver, None, Utc::now())
            .unwrap();
        tx.register_member("APP-2", "Pavel", Role::Approver, None, Utc::now())
            .unwrap();
        tx.register_member("ADM-1", "Root", Role::Admin, None, Utc::now())
            .unwrap();
        tx.commit().unwrap();
    }

    fn fund(store: &mut Store, member_id: &str, bucket: Bucket, amount: Decimal) {
        let tx = store.transaction().unwrap();
        let snapshot = tx.load_earnings(member_id).unwrap();
        let deltas = plan_credit(bucket, amount).unwrap();
        tx.save_earnings(member_id, &snapshot.apply(&deltas)).unwrap();
        tx.commit().unwrap();
    }

    fn earnings(store: &mut Store, member_id: &str) -> refledger_wallet::BucketSnapshot {
        let tx = store.transaction().unwrap();
        tx.load_earnings(member_id).unwrap()
    }

    #[test]
    fn test_create_reserves_funds_immediately() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        fund(&mut store, "MBR-A", Bucket::PackageEarnings, dec!(300));
        let workflow = workflow(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(200), EarningsType::Package, "IBAN X")
            .unwrap();
        assert_eq!(request.fee, dec!(20));
        assert_eq!(request.net_amount, dec!(180));

        let snapshot = earnings(&mut store, "MBR-A");
        assert_eq!(snapshot.package_earnings, dec!(100));
        assert_eq!(snapshot.combined, dec!(100));
    }

    #[test]
    fn test_cannot_overdraw_the_typed_bucket() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        // Plenty of combined funds, but the referral bucket only holds 10.
        fund(&mut store, "MBR-A", Bucket::Primary, dec!(1000));
        fund(&mut store, "MBR-A", Bucket::ReferralBounty, dec!(10));
        let workflow = workflow(clock());

        let err = workflow
            .create(&mut store, "MBR-A", dec!(50), EarningsType::Referral, "IBAN X")
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Wallet(WalletError::InsufficientFunds { .. })
        ));
        assert_eq!(earnings(&mut store, "MBR-A").combined, dec!(1010));
    }

    #[test]
    fn test_one_request_per_type_per_business_day() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        fund(&mut store, "MBR-A", Bucket::PackageEarnings, dec!(500));
        fund(&mut store, "MBR-A", Bucket::ReferralBounty, dec!(500));
        let fixed = clock();
        let workflow = workflow(fixed.clone());

        workflow
            .create(&mut store, "MBR-A", dec!(100), EarningsType::Package, "IBAN X")
            .unwrap();
        let err = workflow
            .create(&mut store, "MBR-A", dec!(50), EarningsType::Package, "IBAN X")
            .unwrap_err();
        assert!(matches!(err, WorkflowError::DailyLimitReached { .. }));

        // A different earnings type is fine on the same day.
        workflow
            .create(&mut store, "MBR-A", dec!(50), EarningsType::Referral, "IBAN X")
            .unwrap();

        // And the same type is fine again the next business day.
        fixed.advance(Duration::days(1));
        workflow
            .create(&mut store, "MBR-A", dec!(50), EarningsType::Package, "IBAN X")
            .unwrap();
    }

    #[test]
    fn test_rejected_request_frees_the_daily_slot() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        fund(&mut store, "MBR-A", Bucket::PackageEarnings, dec!(500));
        let workflow = workflow(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(100), EarningsType::Package, "IBAN X")
            .unwrap();
        let assignee = request.approved_by.clone().unwrap();
        workflow
            .resolve(&mut store, &request.id, &assignee, Resolution::Reject, None)
            .unwrap();

        // Only pending and approved requests count against the limit, so a
        // rejected one can be retried the same day.
        workflow
            .create(&mut store, "MBR-A", dec!(100), EarningsType::Package, "IBAN X")
            .unwrap();
    }

    #[test]
    fn test_rejection_refunds_the_bucket() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        fund(&mut store, "MBR-A", Bucket::WinningEarnings, dec!(80));
        let workflow = workflow(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(80), EarningsType::Winning, "IBAN X")
            .unwrap();
        assert_eq!(earnings(&mut store, "MBR-A").winning_earnings, dec!(0));

        let assignee = request.approved_by.clone().unwrap();
        workflow
            .resolve(&mut store, &request.id, &assignee, Resolution::Reject, None)
            .unwrap();
        let snapshot = earnings(&mut store, "MBR-A");
        assert_eq!(snapshot.winning_earnings, dec!(80));
        assert_eq!(snapshot.combined, dec!(80));
    }

    #[test]
    fn test_resolution_is_final() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        fund(&mut store, "MBR-A", Bucket::PackageEarnings, dec!(300));
        let workflow = workflow(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(200), EarningsType::Package, "IBAN X")
            .unwrap();
        let assignee = request.approved_by.clone().unwrap();
        workflow
            .resolve(&mut store, &request.id, &assignee, Resolution::Reject, None)
            .unwrap();
        let refunded = earnings(&mut store, "MBR-A");
        assert_eq!(refunded.package_earnings, dec!(300));

        // A retried resolve fails before any ledger touch, so the earlier
        // refund cannot be applied a second time.
        let err = workflow
            .resolve(&mut store, &request.id, &assignee, Resolution::Reject, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyResolved { .. }));
        let err = workflow
            .resolve(&mut store, &request.id, "ADM-1", Resolution::Approve, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyResolved { .. }));
        assert_eq!(earnings(&mut store, "MBR-A"), refunded);
    }

    #[test]
    fn test_approval_changes_no_balances() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        fund(&mut store, "MBR-A", Bucket::PackageEarnings, dec!(300));
        let workflow = workflow(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(200), EarningsType::Package, "IBAN X")
            .unwrap();
        let before = earnings(&mut store, "MBR-A");

        let assignee = request.approved_by.clone().unwrap();
        let resolved = workflow
            .resolve(&mut store, &request.id, &assignee, Resolution::Approve, None)
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::Approved);
        assert_eq!(earnings(&mut store, "MBR-A"), before);
    }

    #[test]
    fn test_assignment_balances_load_across_approvers() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        fund(&mut store, "MBR-A", Bucket::PackageEarnings, dec!(500));
        fund(&mut store, "MBR-A", Bucket::ReferralBounty, dec!(500));
        let workflow = workflow(clock());

        let first = workflow
            .create(&mut store, "MBR-A", dec!(100), EarningsType::Package, "IBAN X")
            .unwrap();
        let second = workflow
            .create(&mut store, "MBR-A", dec!(100), EarningsType::Referral, "IBAN X")
            .unwrap();
        assert_eq!(first.approved_by.as_deref(), Some("APP-1"));
        assert_eq!(second.approved_by.as_deref(), Some("APP-2"));
    }

    #[test]
    fn test_approver_cannot_resolve_anothers_assignment() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        fund(&mut store, "MBR-A", Bucket::PackageEarnings, dec!(500));
        let workflow = workflow(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(100), EarningsType::Package, "IBAN X")
            .unwrap();
        assert_eq!(request.approved_by.as_deref(), Some("APP-1"));

        let err = workflow
            .resolve(&mut store, &request.id, "APP-2", Resolution::Approve, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotAssigned { .. }));

        // Admins bypass the assignment check.
        workflow
            .resolve(&mut store, &request.id, "ADM-1", Resolution::Approve, None)
            .unwrap();
    }
}
