pub mod amount_serde;
pub mod config_loader;
pub mod event_logger;
pub mod fixed_point;

pub use config_loader::*;
pub use event_logger::{CompensationRecord, DecisionRecord, GuardEventLogger};
pub use fixed_point::{BPS_DENOMINATOR, Price, Q96, apply_bps, mul_div, u256_to_f64};
