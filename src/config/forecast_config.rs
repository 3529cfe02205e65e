//! Forecast configuration parsing from environment variables.
//!
//! This module handles loading indicator periods and model hyperparameters.

use crate::application::market_data::indicators::IndicatorSettings;
use crate::application::ml::ModelKind;
use crate::application::ml::mlp_predictor::MlpParams;
use crate::application::ml::smartcore_predictor::ForestParams;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Forecast environment configuration
#[derive(Debug, Clone)]
pub struct ForecastEnvConfig {
    pub indicators: IndicatorSettings,
    pub model: ModelKind,
    pub forest: ForestParams,
    pub mlp: MlpParams,
}

impl ForecastEnvConfig {
    pub fn from_env() -> Result<Self> {
        let indicators = IndicatorSettings {
            ema_period: Self::parse_usize("EMA_PERIOD", 10)?,
            rsi_period: Self::parse_usize("RSI_PERIOD", 14)?,
            macd_fast_period: Self::parse_usize("MACD_FAST_PERIOD", 12)?,
            macd_slow_period: Self::parse_usize("MACD_SLOW_PERIOD", 26)?,
            macd_signal_period: Self::parse_usize("MACD_SIGNAL_PERIOD", 9)?,
        };
        indicators
            .validate()
            .context("Indicator periods must all be >= 1")?;
        if indicators.macd_fast_period >= indicators.macd_slow_period {
            anyhow::bail!(
                "MACD_FAST_PERIOD ({}) must be below MACD_SLOW_PERIOD ({})",
                indicators.macd_fast_period,
                indicators.macd_slow_period
            );
        }

        let model_str = env::var("FORECAST_MODEL").unwrap_or_else(|_| "mlp".to_string());
        let model = ModelKind::from_str(&model_str)?;

        let forest = ForestParams {
            n_trees: Self::parse_usize("FOREST_N_TREES", 50)?,
            max_depth: env::var("FOREST_MAX_DEPTH")
                .unwrap_or_else(|_| "8".to_string())
                .parse::<u16>()
                .context("Failed to parse FOREST_MAX_DEPTH")?,
            min_split: Self::parse_usize("FOREST_MIN_SPLIT", 2)?,
        };

        let mlp = MlpParams {
            epochs: Self::parse_usize("MLP_EPOCHS", 25)?,
            learning_rate: Self::parse_f64("MLP_LEARNING_RATE", 0.01)?,
            seed: match env::var("MLP_SEED") {
                Ok(s) => Some(s.parse::<u64>().context("Failed to parse MLP_SEED")?),
                Err(_) => None,
            },
            ..MlpParams::default()
        };

        Ok(Self {
            indicators,
            model,
            forest,
            mlp,
        })
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}
