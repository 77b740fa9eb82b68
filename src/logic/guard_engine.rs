use super::compensation::Treasury;
use super::config::{DetectorConfig, RiskConfig};
use super::detector::Detector;
use super::risk_policy::{Action, Decision, RiskPolicy, RiskState};
use super::types::{Amount, Compensation, LossAssessment, ObservedEvent, PoolSnapshot, TradeRecord};
use crate::config::GuardConfig;
use crate::errors::GuardError;
use crate::execution::Executor;
use crate::utils::event_logger::{CompensationRecord, DecisionRecord, GuardEventLogger};
use alloy_primitives::{Address, U256};
use eyre::Result;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// GuardEngine is the core component of the Logic Layer
///
/// One engine watches one pool and is the only writer of its treasury,
/// price history and cooldown clock. Events are handled strictly in arrival
/// order:
/// 1. Trades feed the sandwich detector, detected losses are compensated
/// 2. Snapshots feed the risk policy, proposed actions go to the executor
/// 3. Funding credits the treasury
///
/// State is only committed after the executor confirms.
pub struct GuardEngine {
    pool: Address,
    detector: Detector,
    treasury: Treasury,
    risk: RiskPolicy,
    /// Most recent trades: the next victim to settle plus `window` trades on each side
    trades: VecDeque<TradeRecord>,
    /// Seq of the newest trade already settled as a potential victim
    settled_through: Option<u64>,
    last_seq: Option<u64>,
    stats: GuardEngineStats,
    event_logger: Option<GuardEventLogger>,
}

impl GuardEngine {
    pub fn new(pool: Address, detector_config: DetectorConfig, risk_config: RiskConfig, treasury: Treasury) -> Self {
        Self {
            pool,
            detector: Detector::new(detector_config),
            treasury,
            risk: RiskPolicy::new(risk_config),
            trades: VecDeque::new(),
            settled_through: None,
            last_seq: None,
            stats: GuardEngineStats { pool, ..Default::default() },
            event_logger: None,
        }
    }

    pub fn pool(&self) -> Address {
        self.pool
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    pub fn risk_policy(&self) -> &RiskPolicy {
        &self.risk
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Enables the CSV ledger of executed compensations and actions
    pub fn set_event_logger(&mut self, logger: GuardEventLogger) {
        info!("Guard ledger enabled: {}", logger.compensations_file().display());
        self.event_logger = Some(logger);
    }

    fn buffer_capacity(&self) -> usize {
        self.detector.window().saturating_mul(2).saturating_add(1)
    }

    /// Appends a trade and returns the sandwiches settled by it.
    ///
    /// A victim is settled once `window` trades have followed it, so the
    /// closest attacker pair is known before anything is paid. Trades for
    /// another pool or with a non-increasing seq are rejected and leave the
    /// engine untouched.
    pub fn ingest_trade(&mut self, trade: TradeRecord) -> Result<Vec<LossAssessment>, GuardError> {
        if trade.pool != self.pool {
            self.stats.trades_rejected += 1;
            return Err(GuardError::PoolMismatch { expected: self.pool, found: trade.pool });
        }
        if let Some(previous) = self.last_seq {
            if trade.seq <= previous {
                self.stats.trades_rejected += 1;
                return Err(GuardError::NonMonotonicSequence { previous, next: trade.seq });
            }
        }

        self.last_seq = Some(trade.seq);
        self.stats.trades_seen += 1;

        if self.trades.len() == self.buffer_capacity() {
            self.trades.pop_front();
        }
        self.trades.push_back(trade);

        let settled = match (self.trades.len() - 1).checked_sub(self.detector.window()) {
            Some(victim_idx) => self.settle(victim_idx).into_iter().collect(),
            None => Vec::new(),
        };
        Ok(settled)
    }

    /// Settles every buffered trade not yet settled, e.g. when the stream ends.
    ///
    /// Their reversal window may be incomplete; later trades never re-settle them.
    pub fn settle_pending(&mut self) -> Vec<LossAssessment> {
        let first_pending = self
            .trades
            .iter()
            .position(|t| self.settled_through.is_none_or(|settled| t.seq > settled))
            .unwrap_or(self.trades.len());

        (first_pending..self.trades.len()).filter_map(|victim_idx| self.settle(victim_idx)).collect()
    }

    fn settle(&mut self, victim_idx: usize) -> Option<LossAssessment> {
        let victim_seq = self.trades[victim_idx].seq;
        if self.settled_through.is_some_and(|settled| victim_seq <= settled) {
            return None;
        }
        self.settled_through = Some(victim_seq);

        let assessment = self.detector.assess_at(self.trades.make_contiguous(), victim_idx)?;
        self.stats.sandwiches_detected += 1;
        info!(
            "Sandwich detected on pool {}: attacker={} victim={} seq={} loss={}",
            self.pool, assessment.attacker, assessment.victim, assessment.victim_seq, assessment.loss
        );
        Some(assessment)
    }

    /// Bounded payout for an assessment. Nothing is debited until confirmed.
    pub fn propose_compensation(&self, assessment: &LossAssessment) -> Option<Compensation> {
        self.treasury.propose(assessment, self.detector.config())
    }

    /// Debits the treasury for a payout the executor confirmed, returns the debited amount
    pub fn confirm_compensation(&mut self, compensation: &Compensation) -> Amount {
        let debited = self.treasury.debit(compensation.amount);
        self.stats.compensations_paid += 1;
        self.stats.total_compensated = self.stats.total_compensated.saturating_add(debited);
        info!(
            "Compensated {} to {} for seq {}, treasury balance {}",
            debited,
            compensation.recipient,
            compensation.victim_seq,
            self.treasury.balance()
        );
        debited
    }

    pub fn fund_treasury(&mut self, amount: Amount) {
        self.treasury.fund(amount);
    }

    /// Records the snapshot in the price history and proposes an action
    pub fn ingest_snapshot(&mut self, snapshot: &PoolSnapshot) -> Result<(Decision, RiskState), GuardError> {
        if snapshot.pool != self.pool {
            return Err(GuardError::PoolMismatch { expected: self.pool, found: snapshot.pool });
        }

        let decision = self.risk.evaluate(snapshot);
        let state = self.risk.state_for(snapshot);

        self.stats.snapshots_seen += 1;
        *self.stats.decisions_by_kind.entry(decision.action.kind().to_string()).or_default() += 1;
        Ok((decision, state))
    }

    /// Starts the cooldown after a confirmed protective withdraw
    pub fn confirm_protective_withdraw(&mut self, executed_at: u64) {
        self.risk.confirm_protective_withdraw(executed_at);
    }

    /// Drives one observed event through detection, policy and execution
    pub async fn handle_event<E: Executor + ?Sized>(&mut self, event: ObservedEvent, executor: &E) -> Result<(), GuardError> {
        match event {
            ObservedEvent::Trade(trade) => {
                for assessment in self.ingest_trade(trade)? {
                    self.compensate(&assessment, executor).await;
                }
            }
            ObservedEvent::Snapshot(snapshot) => {
                let (decision, state) = self.ingest_snapshot(&snapshot)?;
                if !decision.action.is_none() {
                    self.execute(&snapshot, &decision, &state, executor).await;
                }
            }
            ObservedEvent::Funding(amount) => self.fund_treasury(amount),
        }
        Ok(())
    }

    async fn compensate<E: Executor + ?Sized>(&mut self, assessment: &LossAssessment, executor: &E) {
        let Some(compensation) = self.propose_compensation(assessment) else {
            return;
        };

        match executor.pay_compensation(&compensation).await {
            Ok(receipt) => {
                self.confirm_compensation(&compensation);
                if let Some(logger) = &self.event_logger {
                    let record = CompensationRecord::new(assessment, &compensation, &receipt.reference);
                    if let Err(e) = logger.log_compensation(&record).await {
                        warn!("Failed to write compensation ledger row: {}", e);
                    }
                }
            }
            Err(e) => {
                self.stats.failed_payouts += 1;
                error!("Compensation to {} for seq {} failed: {}", compensation.recipient, compensation.victim_seq, e);
            }
        }
    }

    async fn execute<E: Executor + ?Sized>(&mut self, snapshot: &PoolSnapshot, decision: &Decision, state: &RiskState, executor: &E) {
        match executor.execute_action(self.pool, &decision.action).await {
            Ok(receipt) => {
                self.stats.actions_executed += 1;
                if let Action::ProtectiveWithdraw { .. } = decision.action {
                    self.confirm_protective_withdraw(snapshot.timestamp);
                }
                debug!("Action {} confirmed as {}", decision.action, receipt.reference);

                if let Some(logger) = &self.event_logger {
                    let record = DecisionRecord::new(self.pool, snapshot.timestamp, decision, state, &receipt.reference);
                    if let Err(e) = logger.log_decision(&record).await {
                        warn!("Failed to write decision ledger row: {}", e);
                    }
                }
            }
            Err(e) => {
                self.stats.failed_actions += 1;
                error!("Action {} on pool {} failed: {}", decision.action, self.pool, e);
            }
        }
    }

    /// Consumes events until every sender is dropped, then settles the trades
    /// still waiting for their reversal window.
    ///
    /// Invalid records are logged and skipped; the loop only ends with the channel.
    pub async fn run<E: Executor + ?Sized>(
        &mut self,
        mut receiver: mpsc::Receiver<ObservedEvent>,
        executor: &E,
    ) -> Result<GuardEngineStats> {
        info!("Guard engine started for pool {}", self.pool);

        while let Some(event) = receiver.recv().await {
            if let Err(e) = self.handle_event(event, executor).await {
                if e.is_invalid_input() {
                    warn!("Skipping invalid event: {}", e);
                } else {
                    error!("Failed to handle event: {}", e);
                }
            }
        }

        for assessment in self.settle_pending() {
            self.compensate(&assessment, executor).await;
        }

        let stats = self.get_statistics();
        info!(
            "Guard engine stopped: {} trades, {} sandwiches, {} compensated, treasury {}",
            stats.trades_seen, stats.sandwiches_detected, stats.total_compensated, stats.treasury_balance
        );
        Ok(stats)
    }

    pub fn get_statistics(&self) -> GuardEngineStats {
        GuardEngineStats {
            treasury_balance: self.treasury.balance(),
            last_protective_action_at: self.risk.last_protective_action_at(),
            ..self.stats.clone()
        }
    }
}

/// Counters describing what the engine has seen and done
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuardEngineStats {
    pub pool: Address,
    pub trades_seen: u64,
    pub trades_rejected: u64,
    pub sandwiches_detected: u64,
    pub compensations_paid: u64,
    pub total_compensated: Amount,
    pub failed_payouts: u64,
    pub snapshots_seen: u64,
    pub decisions_by_kind: BTreeMap<String, u64>,
    pub actions_executed: u64,
    pub failed_actions: u64,
    pub treasury_balance: Amount,
    pub last_protective_action_at: Option<u64>,
}

/// Builder pattern for creating and configuring a GuardEngine
pub struct GuardEngineBuilder {
    pool: Option<Address>,
    detector_config: DetectorConfig,
    risk_config: RiskConfig,
    treasury: Amount,
}

impl GuardEngineBuilder {
    pub fn new() -> Self {
        Self {
            pool: None,
            detector_config: DetectorConfig::default(),
            risk_config: RiskConfig::default(),
            treasury: U256::ZERO,
        }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new()
            .with_pool(config.pool)
            .with_detector_config(config.detector.clone())
            .with_risk_config(config.risk.clone())
    }

    pub fn with_pool(mut self, pool: Address) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_detector_config(mut self, config: DetectorConfig) -> Self {
        self.detector_config = config;
        self
    }

    pub fn with_risk_config(mut self, config: RiskConfig) -> Self {
        self.risk_config = config;
        self
    }

    pub fn with_treasury(mut self, balance: Amount) -> Self {
        self.treasury = balance;
        self
    }

    pub fn build(self) -> Result<GuardEngine, GuardError> {
        let pool = self.pool.ok_or_else(|| GuardError::InvalidConfig("pool address is required".to_string()))?;
        self.detector_config.validate().map_err(|e| GuardError::InvalidConfig(e.to_string()))?;
        self.risk_config.validate().map_err(|e| GuardError::InvalidConfig(e.to_string()))?;

        Ok(GuardEngine::new(pool, self.detector_config, self.risk_config, Treasury::new(self.treasury)))
    }
}

impl Default for GuardEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
