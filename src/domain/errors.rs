use thiserror::Error;

/// Errors raised by the indicator functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("Invalid period: {period} (must be >= 1)")]
    InvalidPeriod { period: usize },

    #[error("Insufficient data: need {required} values, got {available}")]
    InsufficientData { required: usize, available: usize },
}

/// Errors surfaced by a prediction request.
///
/// `InvalidInput` and `InsufficientHistory` are always raised before any model
/// training starts. Training and rollout failures abort the request; no partial
/// result is ever returned.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Insufficient history: need {required} samples, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Market data unavailable: {reason}")]
    MarketData { reason: String },

    #[error("Model training failed: {reason}")]
    ModelTrainingFailure { reason: String },

    /// `step` is 1-based; 0 marks a final forecast rejected after the rollout.
    #[error("Forecast failed at step {step}: {reason}")]
    ForecastFailure { step: u32, reason: String },
}

impl PredictionError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        PredictionError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn market_data(err: anyhow::Error) -> Self {
        PredictionError::MarketData {
            reason: format!("{:#}", err),
        }
    }

    /// True for failures detected before any model work began.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PredictionError::InvalidInput { .. } | PredictionError::InsufficientHistory { .. }
        )
    }
}

impl From<IndicatorError> for PredictionError {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::InvalidPeriod { period } => {
                PredictionError::invalid_input(format!("indicator period {} is invalid", period))
            }
            IndicatorError::InsufficientData {
                required,
                available,
            } => PredictionError::InsufficientHistory {
                required,
                available,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_history_formatting() {
        let error = PredictionError::InsufficientHistory {
            required: 35,
            available: 20,
        };

        let msg = error.to_string();
        assert!(msg.contains("35"));
        assert!(msg.contains("20"));
        assert!(error.is_validation());
    }

    #[test]
    fn test_indicator_error_conversion() {
        let err: PredictionError = IndicatorError::InsufficientData {
            required: 26,
            available: 10,
        }
        .into();
        assert!(matches!(
            err,
            PredictionError::InsufficientHistory {
                required: 26,
                available: 10
            }
        ));

        let err: PredictionError = IndicatorError::InvalidPeriod { period: 0 }.into();
        assert!(matches!(err, PredictionError::InvalidInput { .. }));
    }

    #[test]
    fn test_forecast_failure_is_not_validation() {
        let err = PredictionError::ForecastFailure {
            step: 3,
            reason: "NaN output".to_string(),
        };
        assert!(!err.is_validation());
        assert!(err.to_string().contains("step 3"));
    }
}
