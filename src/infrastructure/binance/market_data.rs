//! Binance Market Data Service
//!
//! Fetches the recent kline window (`/api/v3/klines`) used as the forecasting
//! history. One request per call; nothing is cached between prediction requests.

use crate::domain::market::observation::Observation;
use crate::domain::ports::MarketDataService;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use tracing::{info, warn};

/// Binance caps a single klines request at 1000 rows.
const MAX_KLINE_LIMIT: u16 = 1000;

pub struct BinanceMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
    symbol: String,
    interval: String,
    limit: u16,
}

impl BinanceMarketDataService {
    pub fn builder() -> BinanceMarketDataServiceBuilder {
        BinanceMarketDataServiceBuilder::default()
    }
}

#[derive(Default)]
pub struct BinanceMarketDataServiceBuilder {
    base_url: Option<String>,
    symbol: Option<String>,
    interval: Option<String>,
    limit: Option<u16>,
    max_retries: Option<u32>,
}

impl BinanceMarketDataServiceBuilder {
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn symbol(mut self, symbol: String) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn interval(mut self, interval: String) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn limit(mut self, limit: u16) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn build(self) -> Result<BinanceMarketDataService> {
        let base_url = self.base_url.context("base_url is required")?;
        let symbol = self.symbol.context("symbol is required")?.to_uppercase();
        let interval = self.interval.unwrap_or_else(|| "1m".to_string());
        // Both go into the query string verbatim
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            anyhow::bail!("symbol must be alphanumeric, got '{}'", symbol);
        }
        if interval.is_empty() || !interval.chars().all(|c| c.is_ascii_alphanumeric()) {
            anyhow::bail!("interval must be alphanumeric, got '{}'", interval);
        }
        let limit = self.limit.unwrap_or(100);
        if limit == 0 || limit > MAX_KLINE_LIMIT {
            anyhow::bail!("kline limit must be within 1..={}, got {}", MAX_KLINE_LIMIT, limit);
        }

        Ok(BinanceMarketDataService {
            client: HttpClientFactory::create_client(self.max_retries.unwrap_or(2))?,
            base_url: base_url.trim_end_matches('/').to_string(),
            symbol,
            interval,
            limit,
        })
    }
}

impl BinanceMarketDataService {
    /// Public endpoint; no API key or signature.
    fn klines_url(&self) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, self.symbol, self.interval, self.limit
        )
    }
}

#[async_trait]
impl MarketDataService for BinanceMarketDataService {
    async fn fetch_observations(&self) -> Result<Vec<Observation>> {
        let response = self
            .client
            .get(self.klines_url())
            .send()
            .await
            .context("Failed to fetch klines from Binance")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance klines fetch failed ({}): {}", status, error_text);
        }

        let klines: Vec<Value> = response
            .json()
            .await
            .context("Failed to parse Binance klines response")?;

        let observations = parse_klines(&klines);
        if observations.is_empty() {
            anyhow::bail!("Binance returned no usable klines for {}", self.symbol);
        }

        let last_bar = observations
            .last()
            .and_then(Observation::time)
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            "BinanceMarketDataService: Fetched {} bars for {} (last bar {})",
            observations.len(),
            self.symbol,
            last_bar
        );
        Ok(observations)
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// Maps raw kline rows to observations.
///
/// Row layout: `[openTime, open, high, low, close, volume, ...]` with prices and
/// volumes encoded as strings. Malformed rows are skipped.
pub fn parse_klines(klines: &[Value]) -> Vec<Observation> {
    let observations: Vec<Observation> = klines.iter().filter_map(parse_kline).collect();
    let skipped = klines.len() - observations.len();
    if skipped > 0 {
        warn!("Skipped {} malformed kline rows", skipped);
    }
    observations
}

fn parse_kline(k: &Value) -> Option<Observation> {
    let arr = k.as_array()?;
    if arr.len() < 6 {
        return None;
    }

    let timestamp = arr[0].as_i64()?;
    let close = number_field(&arr[4])?;
    let volume = number_field(&arr[5])?;

    Some(Observation {
        timestamp,
        close,
        volume,
    })
}

fn number_field(v: &Value) -> Option<f64> {
    match v {
        Value::String(s) => s.parse::<f64>().ok(),
        other => other.as_f64(),
    }
}
