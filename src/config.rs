use crate::data_sync::config::ServiceConfig;
use crate::logic::config::{DetectorConfig, RiskConfig};
use crate::utils::config_loader::{GuardConfigLoader, GuardConfigLoaderSync, LoadConfigError, load_from_file, load_from_file_sync};
use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::info;

/// Complete configuration of one guarded pool
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    pub pool: Address,
    pub detector: DetectorConfig,
    pub risk: RiskConfig,
    pub service: ServiceConfig,
}

impl GuardConfig {
    /// Loads a TOML file, applies environment overrides and validates the result
    pub fn from_file(file_name: impl Into<String>) -> Result<Self> {
        let mut config = <Self as GuardConfigLoaderSync>::load_section_from_file_sync(file_name.into())?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides individual values from `lookup`, usually the process environment
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        override_value(&lookup, "POOL_ADDRESS", &mut self.pool)?;

        override_value(&lookup, "DETECTION_WINDOW", &mut self.detector.window)?;
        override_value(&lookup, "MIN_PRICE_MOVE", &mut self.detector.min_price_move)?;
        override_value(&lookup, "REFUND_BPS", &mut self.detector.refund_bps)?;
        override_value(&lookup, "MAX_PER_EVENT", &mut self.detector.max_per_event)?;

        override_value(&lookup, "IMBALANCE_THRESHOLD_BPS", &mut self.risk.imbalance_threshold_bps)?;
        override_value(&lookup, "SEVERE_THRESHOLD_BPS", &mut self.risk.severe_threshold_bps)?;
        override_value(&lookup, "TARGET_RESIDUAL_DEVIATION_BPS", &mut self.risk.target_residual_bps)?;
        override_value(&lookup, "MEV_VOLATILITY_THRESHOLD", &mut self.risk.mev_volatility_threshold)?;
        override_value(&lookup, "REMOVAL_STEP_BPS", &mut self.risk.removal_step_bps)?;
        override_value(&lookup, "COOLDOWN_DURATION_SECS", &mut self.risk.cooldown_secs)?;
        override_value(&lookup, "MIN_TRADE_AMOUNT", &mut self.risk.min_trade_amount)?;
        override_value(&lookup, "PRICE_HISTORY_CAPACITY", &mut self.risk.price_history_capacity)?;

        override_value(&lookup, "POLL_INTERVAL_SECS", &mut self.service.poll_interval_secs)?;
        override_value(&lookup, "CHANNEL_BUFFER_SIZE", &mut self.service.channel_buffer_size)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool == Address::ZERO {
            return Err(eyre!("pool address is not set"));
        }
        self.detector.validate()?;
        self.risk.validate()?;
        self.service.validate()?;
        Ok(())
    }
}

fn override_value<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|e| eyre!("Invalid {}: {}", key, e))?;
        info!("Config override {}={}", key, raw.trim());
    }
    Ok(())
}

#[async_trait]
impl GuardConfigLoader for GuardConfig {
    type SectionType = GuardConfig;

    async fn load_section_from_file(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        load_from_file(file_name).await
    }
}

impl GuardConfigLoaderSync for GuardConfig {
    type SectionType = GuardConfig;

    fn load_section_from_file_sync(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        load_from_file_sync(file_name)
    }
}
