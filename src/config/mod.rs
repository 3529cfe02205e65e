//! Configuration module for pricecast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by domain: market data provider and forecasting.

mod broker_config;
mod forecast_config;

pub use broker_config::BinanceConfig;
pub use forecast_config::ForecastEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Where observations come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Mock,
    Binance,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Mode::Mock),
            "binance" => Ok(Mode::Binance),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'mock' or 'binance'", s),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub binance: BinanceConfig,
    pub forecast: ForecastEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let mode_str = env::var("MODE").unwrap_or_else(|_| "binance".to_string());
        let mode = Mode::from_str(&mode_str)?;

        let binance = BinanceConfig::from_env().context("Failed to load Binance config")?;
        let forecast = ForecastEnvConfig::from_env().context("Failed to load forecast config")?;

        let required = forecast.indicators.min_observations();
        if mode == Mode::Binance && usize::from(binance.kline_limit) < required {
            anyhow::bail!(
                "BINANCE_KLINE_LIMIT ({}) is below the {} bars needed for indicator warm-up",
                binance.kline_limit,
                required
            );
        }

        Ok(Self {
            mode,
            binance,
            forecast,
        })
    }
}
