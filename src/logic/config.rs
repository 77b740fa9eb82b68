use crate::utils::config_loader::{GuardConfigLoader, GuardConfigLoaderSync, LoadConfigError, load_from_file, load_from_file_sync};
use crate::utils::fixed_point::BPS_DENOMINATOR;
use alloy_primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 0.1 of an 18-decimal token
pub const DEFAULT_MAX_PER_EVENT: U256 = U256::from_limbs([100_000_000_000_000_000, 0, 0, 0]);

/// 0.01 of an 18-decimal token
pub const DEFAULT_MIN_TRADE_AMOUNT: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);

/// Sandwich detection and compensation caps
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// How many trades before and after a victim may hold the attacker legs
    pub window: usize,
    /// Absolute fair/execution price gap below which a loss is treated as drift
    pub min_price_move: f64,
    /// Insurance rate applied to the loss, in basis points
    pub refund_bps: u32,
    /// Absolute ceiling for one compensation, in base units
    #[serde(with = "crate::utils::amount_serde")]
    pub max_per_event: U256,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window: 1,
            min_price_move: 0.02,
            refund_bps: 3000,
            max_per_event: DEFAULT_MAX_PER_EVENT,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.window == 0 {
            return Err(eyre::eyre!("detector window must be at least 1"));
        }
        if self.refund_bps > BPS_DENOMINATOR {
            return Err(eyre::eyre!("refund_bps {} exceeds {}", self.refund_bps, BPS_DENOMINATOR));
        }
        if !self.min_price_move.is_finite() || self.min_price_move < 0.0 {
            return Err(eyre::eyre!("min_price_move must be a non-negative number"));
        }
        Ok(())
    }
}

/// Thresholds driving the rebalance / evacuate / withdraw policy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    pub imbalance_threshold_bps: u32,
    pub severe_threshold_bps: u32,
    pub target_residual_bps: u32,
    /// Coefficient of variation above which protective withdraws become eligible
    pub mev_volatility_threshold: f64,
    pub removal_step_bps: u32,
    pub cooldown_secs: u64,
    #[serde(with = "crate::utils::amount_serde")]
    pub min_trade_amount: U256,
    pub price_history_capacity: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            imbalance_threshold_bps: 1000,
            severe_threshold_bps: 2500,
            target_residual_bps: 900,
            mev_volatility_threshold: 0.15,
            removal_step_bps: 500,
            cooldown_secs: 300,
            min_trade_amount: DEFAULT_MIN_TRADE_AMOUNT,
            price_history_capacity: 20,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> eyre::Result<()> {
        let half = BPS_DENOMINATOR / 2;
        if self.severe_threshold_bps <= self.imbalance_threshold_bps {
            return Err(eyre::eyre!(
                "severe_threshold_bps ({}) must exceed imbalance_threshold_bps ({})",
                self.severe_threshold_bps,
                self.imbalance_threshold_bps
            ));
        }
        if self.severe_threshold_bps > half {
            return Err(eyre::eyre!("severe_threshold_bps cannot exceed {}", half));
        }
        if self.target_residual_bps >= half {
            return Err(eyre::eyre!("target_residual_bps must be below {}", half));
        }
        if self.removal_step_bps == 0 || self.removal_step_bps > half {
            return Err(eyre::eyre!("removal_step_bps must be within 1..={}", half));
        }
        if !self.mev_volatility_threshold.is_finite() || self.mev_volatility_threshold < 0.0 {
            return Err(eyre::eyre!("mev_volatility_threshold must be a non-negative number"));
        }
        if self.price_history_capacity < 2 {
            return Err(eyre::eyre!("price_history_capacity must be at least 2"));
        }
        Ok(())
    }
}

#[derive(Clone, Deserialize, Debug)]
struct DetectorConfigRoot {
    #[serde(default)]
    detector: DetectorConfig,
}

#[derive(Clone, Deserialize, Debug)]
struct RiskConfigRoot {
    #[serde(default)]
    risk: RiskConfig,
}

#[async_trait]
impl GuardConfigLoader for DetectorConfig {
    type SectionType = DetectorConfig;

    async fn load_section_from_file(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        let root: DetectorConfigRoot = load_from_file(file_name).await?;
        Ok(root.detector)
    }
}

impl GuardConfigLoaderSync for DetectorConfig {
    type SectionType = DetectorConfig;

    fn load_section_from_file_sync(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        let root: DetectorConfigRoot = load_from_file_sync(file_name)?;
        Ok(root.detector)
    }
}

#[async_trait]
impl GuardConfigLoader for RiskConfig {
    type SectionType = RiskConfig;

    async fn load_section_from_file(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        let root: RiskConfigRoot = load_from_file(file_name).await?;
        Ok(root.risk)
    }
}

impl GuardConfigLoaderSync for RiskConfig {
    type SectionType = RiskConfig;

    fn load_section_from_file_sync(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        let root: RiskConfigRoot = load_from_file_sync(file_name)?;
        Ok(root.risk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let detector = DetectorConfig::default();
        assert_eq!(detector.window, 1);
        assert_eq!(detector.refund_bps, 3000);
        assert_eq!(detector.max_per_event, U256::from(100_000_000_000_000_000u64));
        assert!(detector.validate().is_ok());

        let risk = RiskConfig::default();
        assert_eq!(risk.imbalance_threshold_bps, 1000);
        assert_eq!(risk.severe_threshold_bps, 2500);
        assert_eq!(risk.target_residual_bps, 900);
        assert_eq!(risk.cooldown_secs, 300);
        assert!(risk.validate().is_ok());
    }

    #[test]
    fn test_detector_validation() {
        let config = DetectorConfig { window: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = DetectorConfig { refund_bps: 10_001, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_risk_validation() {
        let config = RiskConfig { severe_threshold_bps: 1000, ..Default::default() };
        assert!(config.validate().is_err());

        let config = RiskConfig { price_history_capacity: 1, ..Default::default() };
        assert!(config.validate().is_err());

        let config = RiskConfig { target_residual_bps: 5000, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_section_falls_back_to_defaults() {
        let root: RiskConfigRoot = toml::from_str(
            r#"
            [risk]
            cooldown_secs = 60
            min_trade_amount = "5"
            "#,
        )
        .unwrap();
        assert_eq!(root.risk.cooldown_secs, 60);
        assert_eq!(root.risk.min_trade_amount, U256::from(5));
        assert_eq!(root.risk.severe_threshold_bps, 2500);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let parsed = toml::from_str::<DetectorConfigRoot>(
            r#"
            [detector]
            windw = 3
            "#,
        );
        assert!(parsed.is_err());
    }
}
