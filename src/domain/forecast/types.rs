use crate::domain::errors::PredictionError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Model input for one timestep. Field order is the model's column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub price: f64,
    pub moving_average: f64,
    pub volume: f64,
    pub oscillator_line: f64,
    pub oscillator_signal: f64,
}

impl FeatureVector {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.price,
            self.moving_average,
            self.volume,
            self.oscillator_line,
            self.oscillator_signal,
        ]
    }

    /// Copy of this vector with only the price slot replaced.
    pub fn with_price(&self, price: f64) -> Self {
        Self { price, ..*self }
    }
}

/// A one-step-ahead training example.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupervisedPair {
    pub input: FeatureVector,
    pub next_price: f64,
}

/// State of the rollout after `index` predictions (1-based).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastStep {
    pub index: u32,
    pub vector: FeatureVector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Above,
    Below,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Above => write!(f, "Above"),
            Direction::Below => write!(f, "Below"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub predicted_price: f64,
    pub direction: Direction,
    /// Heuristic display score in [55, 95]. Not a statistical confidence level.
    pub confidence_pct: f64,
}

/// Number of one-minute steps to roll forward. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Horizon(u32);

impl Horizon {
    pub fn from_minutes(minutes: u32) -> Result<Self, PredictionError> {
        if minutes == 0 {
            return Err(PredictionError::invalid_input(
                "forecast horizon must be at least one minute",
            ));
        }
        Ok(Self(minutes))
    }

    /// `floor((target - now) / 1 minute)`; fails unless the result is positive.
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Result<Self, PredictionError> {
        let delta_ms = (target - now).num_milliseconds();
        let minutes = delta_ms.div_euclid(MILLIS_PER_MINUTE);
        if minutes <= 0 {
            return Err(PredictionError::invalid_input(format!(
                "target time {} is not at least one minute in the future",
                target.format("%Y-%m-%d %H:%M:%S")
            )));
        }
        let minutes = u32::try_from(minutes).map_err(|_| {
            PredictionError::invalid_input(format!("horizon of {} minutes is too far", minutes))
        })?;
        Self::from_minutes(minutes)
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }
}

/// A user's question: will the price be above `target_price` at `target_time`?
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub target_price: f64,
    pub target_time: DateTime<Utc>,
}

impl PredictionRequest {
    pub fn new(target_price: f64, target_time: DateTime<Utc>) -> Result<Self, PredictionError> {
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(PredictionError::invalid_input(format!(
                "target price must be a positive number, got {}",
                target_price
            )));
        }
        Ok(Self {
            target_price,
            target_time,
        })
    }

    /// Parses raw text fields. Naive times are read as UTC.
    ///
    /// Accepted time formats: RFC 3339, `YYYY-MM-DD HH:MM` and `YYYY-MM-DDTHH:MM`.
    pub fn parse(price: &str, time: &str) -> Result<Self, PredictionError> {
        let price = price.trim();
        let time = time.trim();
        if price.is_empty() || time.is_empty() {
            return Err(PredictionError::invalid_input(
                "both target price and target time are required",
            ));
        }

        let target_price = price.parse::<f64>().map_err(|_| {
            PredictionError::invalid_input(format!("unparseable target price '{}'", price))
        })?;
        let target_time = parse_instant(time).ok_or_else(|| {
            PredictionError::invalid_input(format!(
                "unparseable target time '{}' (use YYYY-MM-DD HH:MM)",
                time
            ))
        })?;

        Self::new(target_price, target_time)
    }

    pub fn horizon(&self, now: DateTime<Utc>) -> Result<Horizon, PredictionError> {
        Horizon::until(self.target_time, now)
    }
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Everything the caller needs to render a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub direction: Direction,
    pub predicted_price: f64,
    pub current_price: f64,
    pub current_moving_average: f64,
    pub current_oscillator_value: f64,
    /// Momentum over the most recent window; absent only for degenerate windows.
    pub latest_oscillator_value: Option<f64>,
    pub current_oscillator_line: f64,
    pub current_oscillator_signal: f64,
    pub confidence_pct: f64,
    pub target_price: f64,
    pub target_time: DateTime<Utc>,
    pub minutes_ahead: u32,
    pub model: String,
}
