// 11.0 config.rs: all sandbox settings in one place. fees, margin, support ratios, safety.
// 11.1 FeeConfig carries taker rates per category. the sandbox only ever takes liquidity.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::hedge::{SupportBracket, SupportRatioConfig};
use crate::symbol::Category;
use crate::types::{Leverage, MAX_LEVERAGE, MIN_LEVERAGE};

/** 11.2: commission rates as fractions. 0.00055 = 0.055% */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeConfig {
    // USDT/USDC perpetuals and futures
    pub linear_taker_rate: Decimal,
    // coin-margined contracts
    pub inverse_taker_rate: Decimal,
    pub spot_taker_rate: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            linear_taker_rate: dec!(0.00055),
            inverse_taker_rate: dec!(0.00055),
            spot_taker_rate: dec!(0.001),
        }
    }
}

impl FeeConfig {
    pub fn taker_rate(&self, category: Category) -> Decimal {
        match category {
            Category::Linear => self.linear_taker_rate,
            Category::Inverse => self.inverse_taker_rate,
            Category::Spot => self.spot_taker_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginParams {
    // leverage used for positions opened inside the sandbox
    pub default_leverage: u32,
    // fraction of position value kept as maintenance margin
    pub maintenance_margin_rate: Decimal,
}

impl Default for MarginParams {
    fn default() -> Self {
        Self {
            default_leverage: 100,
            maintenance_margin_rate: dec!(0.005),
        }
    }
}

impl MarginParams {
    pub fn leverage(&self) -> Result<Leverage, ConfigError> {
        Leverage::new(self.default_leverage).map_err(|e| ConfigError::InvalidMargin {
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    // liquidation closer to mark than this (percent of mark) is unsafe
    pub min_liquidation_distance_percent: Decimal,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            min_liquidation_distance_percent: dec!(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub fees: FeeConfig,
    pub margin: MarginParams,
    pub support: SupportRatioConfig,
    pub safety: SafetyConfig,
    /// Log a summary line for every processed run.
    pub verbose: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            fees: FeeConfig::default(),
            margin: MarginParams::default(),
            support: SupportRatioConfig::default(),
            safety: SafetyConfig::default(),
            verbose: false,
        }
    }
}

impl SandboxConfig {
    // wider safety margin, lower sandbox leverage, stricter support
    pub fn conservative() -> Self {
        let mut config = Self::default();
        config.margin.default_leverage = 50;
        config.safety.min_liquidation_distance_percent = dec!(8);
        config.support.default_percent = dec!(40);
        config.support.min_percent = dec!(25);
        config.support.brackets = vec![
            SupportBracket::new(dec!(-100), dec!(55)),
            SupportBracket::new(dec!(-200), dec!(70)),
            SupportBracket::new(dec!(-300), dec!(85)),
        ];
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_LEVERAGE..=MAX_LEVERAGE).contains(&self.margin.default_leverage) {
            return Err(ConfigError::InvalidMargin {
                reason: format!("default leverage {} out of range", self.margin.default_leverage),
            });
        }

        // mm must stay below im at the highest leverage, otherwise a fresh position
        // would be liquidatable at entry
        let max_im_fraction = Decimal::ONE / Decimal::from(MAX_LEVERAGE);
        if self.margin.maintenance_margin_rate <= Decimal::ZERO
            || self.margin.maintenance_margin_rate > max_im_fraction
        {
            return Err(ConfigError::InvalidMargin {
                reason: "MM rate must be in (0, 1/max leverage]".to_string(),
            });
        }

        for rate in [
            self.fees.linear_taker_rate,
            self.fees.inverse_taker_rate,
            self.fees.spot_taker_rate,
        ] {
            if rate < Decimal::ZERO || rate > dec!(0.01) {
                return Err(ConfigError::InvalidFees {
                    reason: format!("taker rate {} outside [0, 1%]", rate),
                });
            }
        }

        self.support.validate()?;

        if self.safety.min_liquidation_distance_percent < Decimal::ZERO {
            return Err(ConfigError::InvalidSafety {
                reason: "liquidation distance must not be negative".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid margin config: {reason}")]
    InvalidMargin { reason: String },

    #[error("invalid fee config: {reason}")]
    InvalidFees { reason: String },

    #[error("invalid support config: {reason}")]
    InvalidSupport { reason: String },

    #[error("invalid safety config: {reason}")]
    InvalidSafety { reason: String },
}
