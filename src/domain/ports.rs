use crate::domain::market::observation::Observation;
use anyhow::Result;
use async_trait::async_trait;

/// Source of the recent observation window.
///
/// Implementations return a chronologically ordered window and must be safe to
/// query independently per request.
#[async_trait]
pub trait MarketDataService: Send + Sync {
    async fn fetch_observations(&self) -> Result<Vec<Observation>>;

    /// Human-readable name of the instrument being forecast.
    fn symbol(&self) -> &str;
}
