use crate::domain::market::observation::Observation;
use crate::domain::ports::MarketDataService;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

const ONE_MINUTE_MS: i64 = 60_000;

/// In-memory market data source serving a fixed window.
#[derive(Clone)]
pub struct MockMarketDataService {
    observations: Arc<Vec<Observation>>,
    symbol: String,
    fetch_count: Arc<AtomicUsize>,
}

impl MockMarketDataService {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self {
            observations: Arc::new(observations),
            symbol: "MOCK".to_string(),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Linear closes `start, start + step, ...` with constant volume, one minute apart.
    pub fn linear(start: f64, step: f64, count: usize, volume: f64) -> Self {
        let observations = (0..count)
            .map(|i| {
                Observation::new(i as i64 * ONE_MINUTE_MS, start + step * i as f64, volume)
            })
            .collect();
        Self::new(observations)
    }

    /// Deterministic trending series with a superimposed oscillation.
    pub fn synthetic(count: usize) -> Self {
        let observations = (0..count)
            .map(|i| {
                let t = i as f64;
                let close = 60_000.0 + t * 4.0 + (t / 6.0).sin() * 35.0;
                let volume = 12.0 + (t / 4.0).cos().abs() * 8.0;
                Observation::new(i as i64 * ONE_MINUTE_MS, close, volume)
            })
            .collect();
        Self::new(observations)
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = symbol.to_string();
        self
    }

    /// Number of `fetch_observations` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn fetch_observations(&self) -> Result<Vec<Observation>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        info!(
            "MockMarketDataService: Serving {} bars for {}",
            self.observations.len(),
            self.symbol
        );
        Ok(self.observations.as_ref().clone())
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }
}
