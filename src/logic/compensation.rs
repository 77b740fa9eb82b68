use super::config::DetectorConfig;
use super::types::{Amount, Compensation, LossAssessment};
use crate::utils::fixed_point::apply_bps;
use alloy_primitives::U256;
use tracing::{debug, info};

/// Bounded payout: insurance rate, treasury solvency and the per-event ceiling
/// always apply together.
pub fn compute_compensation(loss: Amount, treasury: Amount, refund_bps: u32, max_per_event: Amount) -> Amount {
    apply_bps(loss, refund_bps).min(treasury).min(max_per_event)
}

/// Operator-funded balance that compensations are paid from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Treasury {
    balance: Amount,
}

impl Treasury {
    pub fn new(balance: Amount) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn fund(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
        info!("Treasury funded with {}, balance now {}", amount, self.balance);
    }

    /// Proposes a payout for an assessment without touching the balance.
    ///
    /// Returns `None` when the bounded amount is zero (dust, empty treasury, zero rate).
    pub fn propose(&self, assessment: &LossAssessment, config: &DetectorConfig) -> Option<Compensation> {
        let amount = compute_compensation(assessment.loss, self.balance, config.refund_bps, config.max_per_event);
        if amount.is_zero() {
            debug!("No compensation for victim {} at seq {}: bounded amount is zero", assessment.victim, assessment.victim_seq);
            return None;
        }

        Some(Compensation { recipient: assessment.victim, amount, victim_seq: assessment.victim_seq })
    }

    /// Debits at most the current balance and returns what was actually removed
    pub fn debit(&mut self, amount: Amount) -> Amount {
        let debited = amount.min(self.balance);
        self.balance -= debited;
        debited
    }

    pub fn is_empty(&self) -> bool {
        self.balance == U256::ZERO
    }
}
