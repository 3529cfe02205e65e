//! Market data provider configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Binance public market data configuration
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    pub symbol: String,
    pub interval: String,
    pub kline_limit: u16,
    pub max_retries: u32,
}

impl BinanceConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env::var("BINANCE_BASE_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            symbol: env::var("BINANCE_SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string()),
            interval: env::var("BINANCE_INTERVAL").unwrap_or_else(|_| "1m".to_string()),
            kline_limit: env::var("BINANCE_KLINE_LIMIT")
                .unwrap_or_else(|_| "100".to_string())
                .parse::<u16>()
                .context("Failed to parse BINANCE_KLINE_LIMIT")?,
            max_retries: env::var("BINANCE_MAX_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse::<u32>()
                .context("Failed to parse BINANCE_MAX_RETRIES")?,
        })
    }
}
