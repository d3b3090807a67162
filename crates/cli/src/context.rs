//! Application context - wires everything together

use refledger_commission::CommissionEngine;
use refledger_core::{Clock, SystemClock};
use refledger_ratelimit::{MemoryCounterStore, RateLimiter};
use refledger_referral::BonusPolicy;
use refledger_store::Store;
use refledger_workflow::{DepositWorkflow, FeePolicy, WithdrawalWorkflow};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-member command admission: 30 mutating commands per minute.
const COMMAND_LIMIT: u64 = 30;
const COMMAND_WINDOW_SECS: i64 = 60;

/// Wires the engines and workflows over one shared store and clock.
pub struct AppContext {
    pub store: Store,
    pub commission: CommissionEngine,
    pub deposits: DepositWorkflow,
    pub withdrawals: WithdrawalWorkflow,
    limiter: RateLimiter,
    db_path: PathBuf,
}

impl AppContext {
    pub fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref();
        std::fs::create_dir_all(data_path)?;
        let db_path = data_path.join("refledger.db");

        let store = Store::new(&db_path)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let commission = CommissionEngine::new(BonusPolicy::standard(), clock.clone());
        let deposits = DepositWorkflow::new(clock.clone());
        let withdrawals = WithdrawalWorkflow::new(FeePolicy::default(), clock.clone());
        let counters = Arc::new(MemoryCounterStore::new(clock));
        let limiter = RateLimiter::new(counters);

        Ok(Self {
            store,
            commission,
            deposits,
            withdrawals,
            limiter,
            db_path,
        })
    }

    /// Admission gate run before every mutating command.
    pub fn admit(&self, actor_id: &str) -> Result<(), anyhow::Error> {
        self.limiter
            .check(&format!("cmd:{actor_id}"), COMMAND_LIMIT, COMMAND_WINDOW_SECS)?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
