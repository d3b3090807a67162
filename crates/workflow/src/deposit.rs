//! Deposit requests: a member reports an external payment, an approver or
//! admin later confirms it. The ledger is only touched at approval.

use std::sync::Arc;

use refledger_core::{round2, Bucket, Clock};
use refledger_store::records::{DepositRequest, NewTransaction, TransactionKind};
use refledger_store::Store;
use refledger_wallet::{plan_credit, WalletError};
use rust_decimal::Decimal;

use crate::error::WorkflowError;
use crate::request::Resolution;

pub struct DepositWorkflow {
    clock: Arc<dyn Clock>,
}

impl DepositWorkflow {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Files a new deposit request. At most one PENDING deposit may exist
    /// per member; no bucket changes until the request is approved.
    pub fn create(
        &self,
        store: &mut Store,
        member_id: &str,
        amount: Decimal,
        account_info: &str,
    ) -> Result<DepositRequest, WorkflowError> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::NegativeAmount(amount).into());
        }
        let amount = round2(amount);
        let now = self.clock.now();

        let tx = store.transaction()?;
        tx.get_member(member_id)?;
        if tx.has_pending_deposit(member_id)? {
            return Err(WorkflowError::PendingDepositExists(member_id.to_string()));
        }

        let request = DepositRequest::new(member_id, amount, account_info, now);
        tx.insert_deposit(&request)?;
        tx.append_transaction(&NewTransaction::new(
            member_id,
            TransactionKind::DepositRequested,
            amount,
            format!("Deposit requested ({})", request.id),
            now,
        ))?;
        tx.commit()?;

        tracing::info!(
            request_id = %request.id,
            member_id = %member_id,
            amount = %amount,
            "deposit requested"
        );
        Ok(request)
    }

    /// Resolves a pending deposit. Approval credits the full amount to the
    /// primary bucket; rejection leaves the ledger alone. Either way the
    /// outcome is final and logged.
    pub fn resolve(
        &self,
        store: &mut Store,
        request_id: &str,
        resolver_id: &str,
        decision: Resolution,
        note: Option<&str>,
    ) -> Result<DepositRequest, WorkflowError> {
        let now = self.clock.now();

        let tx = store.transaction()?;
        let resolver = tx.get_member(resolver_id)?;
        if !resolver.role.can_resolve() {
            return Err(WorkflowError::NotAuthorized(resolver_id.to_string()));
        }

        let mut request = tx.get_deposit(request_id)?;
        if request.status.is_terminal() {
            return Err(WorkflowError::AlreadyResolved {
                id: request_id.to_string(),
                status: request.status.as_str(),
            });
        }

        let kind = match decision {
            Resolution::Approve => {
                let snapshot = tx.load_earnings(&request.member_id)?;
                let deltas = plan_credit(Bucket::Primary, request.amount)?;
                tx.save_earnings(&request.member_id, &snapshot.apply(&deltas))?;
                TransactionKind::DepositApproved
            }
            Resolution::Reject => TransactionKind::DepositRejected,
        };

        tx.resolve_deposit(request_id, decision.status(), resolver_id, note, now)?;
        tx.append_transaction(&NewTransaction::new(
            &request.member_id,
            kind,
            request.amount,
            format!("Deposit {} ({})", decision.status().as_str(), request.id),
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
            "deposit resolved"
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use refledger_core::{FixedClock, Role};
    use refledger_store::records::RequestStatus;
    use rust_decimal_macros::dec;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap(),
        ))
    }

    fn seed_members(store: &mut Store) {
        let tx = store.transaction().unwrap();
        tx.register_member("MBR-A", "Alice", Role::Member, None, Utc::now())
            .unwrap();
        tx.register_member("APP-1", "Olga", Role::Approver, None, Utc::now())
            .unwrap();
        tx.commit().unwrap();
    }

    fn earnings(store: &mut Store, member_id: &str) -> refledger_wallet::BucketSnapshot {
        let tx = store.transaction().unwrap();
        tx.load_earnings(member_id).unwrap()
    }

    #[test]
    fn test_create_does_not_touch_ledger() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        let workflow = DepositWorkflow::new(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(500), "wire ref 123")
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(earnings(&mut store, "MBR-A").combined, dec!(0));
    }

    #[test]
    fn test_second_pending_deposit_conflicts() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        let workflow = DepositWorkflow::new(clock());

        workflow
            .create(&mut store, "MBR-A", dec!(500), "wire ref 123")
            .unwrap();
        let err = workflow
            .create(&mut store, "MBR-A", dec!(100), "wire ref 124")
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PendingDepositExists(_)));
    }

    #[test]
    fn test_approval_credits_primary() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        let workflow = DepositWorkflow::new(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(500), "wire ref 123")
            .unwrap();
        let resolved = workflow
            .resolve(&mut store, &request.id, "APP-1", Resolution::Approve, None)
            .unwrap();

        assert_eq!(resolved.status, RequestStatus::Approved);
        let snapshot = earnings(&mut store, "MBR-A");
        assert_eq!(snapshot.primary, dec!(500));
        assert_eq!(snapshot.combined, dec!(500));
    }

    #[test]
    fn test_rejection_leaves_ledger_alone() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        let workflow = DepositWorkflow::new(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(500), "wire ref 123")
            .unwrap();
        workflow
            .resolve(
                &mut store,
                &request.id,
                "APP-1",
                Resolution::Reject,
                Some("reference not found"),
            )
            .unwrap();
        assert_eq!(earnings(&mut store, "MBR-A").combined, dec!(0));
    }

    #[test]
    fn test_resolution_is_final() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        let workflow = DepositWorkflow::new(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(500), "wire ref 123")
            .unwrap();
        workflow
            .resolve(&mut store, &request.id, "APP-1", Resolution::Reject, None)
            .unwrap();
        let err = workflow
            .resolve(&mut store, &request.id, "APP-1", Resolution::Approve, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyResolved { .. }));
        // A rejected deposit never credits, even on a retried approval.
        assert_eq!(earnings(&mut store, "MBR-A").combined, dec!(0));
    }

    #[test]
    fn test_plain_members_cannot_resolve() {
        let mut store = Store::in_memory().unwrap();
        seed_members(&mut store);
        let workflow = DepositWorkflow::new(clock());

        let request = workflow
            .create(&mut store, "MBR-A", dec!(500), "wire ref 123")
            .unwrap();
        let err = workflow
            .resolve(&mut store, &request.id, "MBR-A", Resolution::Approve, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotAuthorized(_)));
    }
}
