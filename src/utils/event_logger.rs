use crate::logic::risk_policy::{Decision, RiskState};
use crate::logic::types::{Compensation, LossAssessment};
use alloy_primitives::Address;
use eyre::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

const COMPENSATION_HEADER: &str = "logged_at,pool,victim,attacker,victim_seq,loss,amount,reference\n";
const DECISION_HEADER: &str = "logged_at,pool,snapshot_timestamp,action,amount,imbalance_ratio,volatility,reference\n";

/// A compensation that the executor confirmed
#[derive(Debug, Clone, Serialize)]
pub struct CompensationRecord {
    pub logged_at: u64,
    pub pool: String,
    pub victim: String,
    pub attacker: String,
    pub victim_seq: u64,
    pub loss: String,
    pub amount: String,
    pub reference: String,
}

impl CompensationRecord {
    pub fn new(assessment: &LossAssessment, compensation: &Compensation, reference: &str) -> Self {
        Self {
            logged_at: unix_now(),
            pool: assessment.pool.to_string(),
            victim: compensation.recipient.to_string(),
            attacker: assessment.attacker.to_string(),
            victim_seq: compensation.victim_seq,
            loss: assessment.loss.to_string(),
            amount: compensation.amount.to_string(),
            reference: reference.to_string(),
        }
    }
}

/// A non-NONE decision that the executor confirmed
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub logged_at: u64,
    pub pool: String,
    pub snapshot_timestamp: u64,
    pub action: String,
    pub amount: String,
    pub imbalance_ratio: f64,
    pub volatility: f64,
    pub reference: String,
}

impl DecisionRecord {
    pub fn new(pool: Address, snapshot_timestamp: u64, decision: &Decision, state: &RiskState, reference: &str) -> Self {
        Self {
            logged_at: unix_now(),
            pool: pool.to_string(),
            snapshot_timestamp,
            action: decision.action.to_string(),
            amount: decision.action.amount().to_string(),
            imbalance_ratio: state.imbalance_ratio,
            volatility: state.volatility,
            reference: reference.to_string(),
        }
    }
}

/// Append-only CSV ledger of executed compensations and liquidity actions
pub struct GuardEventLogger {
    compensations_file: PathBuf,
    decisions_file: PathBuf,
}

impl GuardEventLogger {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        let timestamp = unix_now();
        let dir = output_dir.as_ref();

        Self {
            compensations_file: dir.join(format!("compensations_{}.csv", timestamp)),
            decisions_file: dir.join(format!("decisions_{}.csv", timestamp)),
        }
    }

    pub fn compensations_file(&self) -> &Path {
        &self.compensations_file
    }

    pub fn decisions_file(&self) -> &Path {
        &self.decisions_file
    }

    pub async fn log_compensation(&self, record: &CompensationRecord) -> Result<()> {
        let line = format!(
            "{},\"{}\",\"{}\",\"{}\",{},{},{},\"{}\"\n",
            record.logged_at,
            record.pool,
            record.victim,
            record.attacker,
            record.victim_seq,
            record.loss,
            record.amount,
            record.reference,
        );
        append_line(&self.compensations_file, COMPENSATION_HEADER, &line).await
    }

    pub async fn log_decision(&self, record: &DecisionRecord) -> Result<()> {
        let line = format!(
            "{},\"{}\",{},\"{}\",{},{:.6},{:.6},\"{}\"\n",
            record.logged_at,
            record.pool,
            record.snapshot_timestamp,
            record.action,
            record.amount,
            record.imbalance_ratio,
            record.volatility,
            record.reference,
        );
        append_line(&self.decisions_file, DECISION_HEADER, &line).await
    }
}

async fn append_line(path: &Path, header: &str, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let needs_header = !tokio::fs::try_exists(path).await.unwrap_or(false);
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;

    if needs_header {
        file.write_all(header.as_bytes()).await?;
        info!("Created ledger file: {}", path.display());
    }
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;

    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
