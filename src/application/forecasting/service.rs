//! Prediction request orchestration.
//!
//! Stage order is fixed: validate the request, fetch the window, check warm-up,
//! derive indicators, build the dataset, fit, roll out, score. Validation
//! failures surface before any data fetch or training. Fitting and the rollout
//! run on the blocking pool so the async caller stays responsive.

use crate::application::forecasting::dataset::Dataset;
use crate::application::forecasting::rollout::RolloutForecaster;
use crate::application::forecasting::scoring;
use crate::application::market_data::indicators::{IndicatorSet, IndicatorSettings};
use crate::application::ml::predictor::ModelTrainer;
use crate::domain::errors::PredictionError;
use crate::domain::forecast::types::{PredictionRequest, PredictionResponse};
use crate::domain::market::observation::{Observation, closes_and_volumes, is_chronological};
use crate::domain::ports::MarketDataService;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

pub struct PredictionService {
    market_data: Arc<dyn MarketDataService>,
    trainer: Arc<dyn ModelTrainer>,
    settings: IndicatorSettings,
}

impl PredictionService {
    pub fn new(
        market_data: Arc<dyn MarketDataService>,
        trainer: Arc<dyn ModelTrainer>,
        settings: IndicatorSettings,
    ) -> Self {
        Self {
            market_data,
            trainer,
            settings,
        }
    }

    /// Runs independent requests concurrently. Each one fetches its own window
    /// and trains its own model.
    pub async fn predict_all(
        &self,
        requests: &[PredictionRequest],
    ) -> Vec<Result<PredictionResponse, PredictionError>> {
        let now = Utc::now();
        join_all(requests.iter().map(|r| self.predict_at(r, now))).await
    }

    /// Runs one request against an explicit clock.
    pub async fn predict_at(
        &self,
        request: &PredictionRequest,
        now: DateTime<Utc>,
    ) -> Result<PredictionResponse, PredictionError> {
        let span = info_span!(
            "prediction",
            request_id = %Uuid::new_v4(),
            symbol = self.market_data.symbol(),
            target_price = request.target_price,
        );
        self.run(request, now).instrument(span).await
    }

    async fn run(
        &self,
        request: &PredictionRequest,
        now: DateTime<Utc>,
    ) -> Result<PredictionResponse, PredictionError> {
        let horizon = request.horizon(now)?;
        self.settings.validate()?;
        info!("Forecasting {} minutes ahead", horizon.minutes());

        let observations = self
            .market_data
            .fetch_observations()
            .await
            .map_err(PredictionError::market_data)?;
        self.check_window(&observations)?;

        let (closes, _) = closes_and_volumes(&observations);
        let indicators = IndicatorSet::compute(&closes, &self.settings)?;
        let dataset = Dataset::build(&observations, &indicators)?;
        debug!(
            "Dataset: {} observations -> {} vectors -> {} pairs",
            observations.len(),
            dataset.vectors().len(),
            dataset.pairs().len()
        );

        let trainer = Arc::clone(&self.trainer);
        let inputs = dataset.inputs();
        let labels = dataset.labels();
        let model = tokio::task::spawn_blocking(move || trainer.fit(&inputs, &labels))
            .await
            .map_err(|e| PredictionError::ModelTrainingFailure {
                reason: format!("training task aborted: {}", e),
            })?
            .map_err(|reason| PredictionError::ModelTrainingFailure { reason })?;
        let model_name = model.name().to_string();
        info!("Model trained: {}", model_name);

        let start = dataset.last_vector();
        let outcome = tokio::task::spawn_blocking(move || {
            RolloutForecaster::new(model.as_ref(), start, horizon).run()
        })
        .await
        .map_err(|e| PredictionError::ForecastFailure {
            step: 0,
            reason: format!("rollout task aborted: {}", e),
        })??;

        let result = scoring::evaluate(outcome.final_price(), request.target_price)?;
        info!(
            "Prediction: {} {:.2} (target {:.2}, confidence {:.1}%)",
            result.direction, result.predicted_price, request.target_price, result.confidence_pct
        );

        Ok(PredictionResponse {
            direction: result.direction,
            predicted_price: result.predicted_price,
            current_price: start.price,
            current_moving_average: start.moving_average,
            current_oscillator_value: indicators.momentum,
            latest_oscillator_value: indicators.latest_momentum,
            current_oscillator_line: start.oscillator_line,
            current_oscillator_signal: start.oscillator_signal,
            confidence_pct: result.confidence_pct,
            target_price: request.target_price,
            target_time: request.target_time,
            minutes_ahead: horizon.minutes(),
            model: model_name,
        })
    }

    fn check_window(&self, observations: &[Observation]) -> Result<(), PredictionError> {
        let required = self.settings.min_observations();
        if observations.len() < required {
            warn!(
                "Observation window too short: {} < {}",
                observations.len(),
                required
            );
            return Err(PredictionError::InsufficientHistory {
                required,
                available: observations.len(),
            });
        }
        if !is_chronological(observations) {
            return Err(PredictionError::MarketData {
                reason: "observation window is not in chronological order".to_string(),
            });
        }
        if let Some(bad) = observations
            .iter()
            .find(|o| !o.close.is_finite() || o.close <= 0.0 || !o.volume.is_finite())
        {
            return Err(PredictionError::MarketData {
                reason: format!("invalid observation at {}: {:?}", bad.timestamp, bad),
            });
        }
        Ok(())
    }
}
