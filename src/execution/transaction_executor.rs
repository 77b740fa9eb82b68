//! Executor boundary
//!
//! Turning actions and compensations into transactions, waiting for
//! confirmations and retrying all live behind this trait. The engine only
//! commits cooldowns and treasury debits after an `Ok` receipt.

use crate::logic::risk_policy::Action;
use crate::logic::types::{Amount, Compensation};
use alloy_primitives::Address;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("executor rejected the request: {0}")]
    Rejected(String),
    #[error("transaction reverted: {0}")]
    Reverted(String),
    #[error("confirmation timed out after {0}s")]
    Timeout(u64),
    #[error("nothing to execute")]
    NothingToExecute,
}

/// Proof that the executor carried out a request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionReceipt {
    /// Executor specific reference, e.g. a transaction hash
    pub reference: String,
    pub amount: Amount,
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute_action(&self, pool: Address, action: &Action) -> Result<ExecutionReceipt, ExecutionError>;

    async fn pay_compensation(&self, compensation: &Compensation) -> Result<ExecutionReceipt, ExecutionError>;
}

/// Logs every request and acknowledges it without touching a chain
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    refuse: bool,
    counter: AtomicU64,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor that rejects everything, handy for exercising failure paths
    pub fn refusing() -> Self {
        Self { refuse: true, counter: AtomicU64::new(0) }
    }

    pub fn executed_count(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    fn next_reference(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("dry-run-{prefix}-{n}")
    }
}

#[async_trait]
impl Executor for DryRunExecutor {
    async fn execute_action(&self, pool: Address, action: &Action) -> Result<ExecutionReceipt, ExecutionError> {
        if action.is_none() {
            return Err(ExecutionError::NothingToExecute);
        }
        if self.refuse {
            warn!("Dry run executor refusing {} on pool {}", action, pool);
            return Err(ExecutionError::Rejected(format!("refusing {}", action.kind())));
        }

        info!("Dry run: {} on pool {}", action, pool);
        Ok(ExecutionReceipt { reference: self.next_reference("action"), amount: action.amount() })
    }

    async fn pay_compensation(&self, compensation: &Compensation) -> Result<ExecutionReceipt, ExecutionError> {
        if self.refuse {
            warn!("Dry run executor refusing compensation to {}", compensation.recipient);
            return Err(ExecutionError::Rejected("refusing compensation".to_string()));
        }

        info!("Dry run: paying {} to {} for seq {}", compensation.amount, compensation.recipient, compensation.victim_seq);
        Ok(ExecutionReceipt { reference: self.next_reference("compensation"), amount: compensation.amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::types::SwapDirection;
    use alloy_primitives::U256;

    #[tokio::test]
    async fn test_dry_run_acknowledges() {
        let executor = DryRunExecutor::new();
        let action = Action::LocalRebalance { amount: U256::from(7), direction: SwapDirection::AtoB };

        let receipt = executor.execute_action(Address::ZERO, &action).await.unwrap();
        assert_eq!(receipt.amount, U256::from(7));
        assert_eq!(receipt.reference, "dry-run-action-0");

        let compensation = Compensation { recipient: Address::repeat_byte(2), amount: U256::from(3), victim_seq: 9 };
        let receipt = executor.pay_compensation(&compensation).await.unwrap();
        assert_eq!(receipt.reference, "dry-run-compensation-1");
        assert_eq!(executor.executed_count(), 2);
    }

    #[tokio::test]
    async fn test_none_action_is_not_executed() {
        let executor = DryRunExecutor::new();
        let result = executor.execute_action(Address::ZERO, &Action::None).await;
        assert!(matches!(result, Err(ExecutionError::NothingToExecute)));
    }

    #[tokio::test]
    async fn test_refusing_executor() {
        let executor = DryRunExecutor::refusing();
        let action = Action::ProtectiveWithdraw { amount: U256::from(1), token: crate::logic::types::PoolToken::A };
        assert!(executor.execute_action(Address::ZERO, &action).await.is_err());
        assert_eq!(executor.executed_count(), 0);
    }
}
