// Three-Layer Architecture
pub mod data_sync; // Data Layer: chain observation, interval polling
pub mod logic; // Logic Layer: sandwich detection, compensation, risk policy
pub mod execution; // Execution Layer: executor boundary for actions and payouts

// Shared configuration, errors and utilities
pub mod config;
pub mod errors;
pub mod utils;

// Re-export key components from each layer
pub use config::GuardConfig;
pub use data_sync::{ChainObserver, ObserverService, ObserverStats, ScriptedObserver, ServiceConfig};
pub use errors::GuardError;
pub use execution::{DryRunExecutor, ExecutionError, ExecutionReceipt, Executor};
pub use logic::{
    Action, Amount, Compensation, Decision, DetectorConfig, Detector, GuardEngine, GuardEngineBuilder, GuardEngineStats,
    LossAssessment, NoActionReason, ObservedEvent, PoolSnapshot, PoolToken, RiskConfig, RiskPolicy, RiskState,
    SandwichCandidate, SwapDirection, TradeRecord, Treasury, decide, is_sandwich, quote,
};
pub use utils::{GuardEventLogger, Price};
