// Forecast pipeline: dataset, rollout, scoring, orchestration
pub mod forecasting;

// Market data processing
pub mod market_data;

// Regression backends
pub mod ml;
