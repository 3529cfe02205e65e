use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Indicator output aligned index-for-index with the observation window.
/// `None` marks warm-up positions where the indicator has no value yet.
pub type IndicatorSeries = Vec<Option<f64>>;

/// One closed bar of market data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Open time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub close: f64,
    pub volume: f64,
}

impl Observation {
    pub fn new(timestamp: i64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            close,
            volume,
        }
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Splits a window into its close and volume columns.
pub fn closes_and_volumes(observations: &[Observation]) -> (Vec<f64>, Vec<f64>) {
    observations.iter().map(|o| (o.close, o.volume)).unzip()
}

/// True when timestamps never go backwards.
pub fn is_chronological(observations: &[Observation]) -> bool {
    observations
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp)
}
