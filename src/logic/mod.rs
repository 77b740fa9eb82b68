/// Logic Layer - Guard Engine
///
/// This layer is responsible for:
/// - Sandwich detection over the ordered trade stream
/// - Victim loss assessment and bounded compensation
/// - Volatility tracking and the liquidity risk policy
///
/// Everything here is synchronous and deterministic except the engine's event
/// loop, which hands proposals to the execution layer and commits on success.

pub mod compensation;
pub mod config;
pub mod detector;
pub mod guard_engine;
pub mod quote;
pub mod risk_policy;
pub mod types;
pub mod volatility;

// Re-export key components from the logic layer
pub use compensation::{Treasury, compute_compensation};
pub use config::{DetectorConfig, RiskConfig};
pub use detector::{Detector, is_sandwich};
pub use guard_engine::{GuardEngine, GuardEngineBuilder, GuardEngineStats};
pub use quote::quote;
pub use risk_policy::{Action, Decision, NoActionReason, RiskPolicy, RiskState, decide};
pub use types::{
    Amount, Compensation, LossAssessment, ObservedEvent, PoolSnapshot, PoolToken, SandwichCandidate, SwapDirection,
    TradeRecord,
};
pub use volatility::{PriceHistory, coefficient_of_variation};
