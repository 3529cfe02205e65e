//! Recursive multi-step forecasting.
//!
//! A one-step model is applied to its own output `horizon` times. Only the price
//! slot is fed back; moving average, volume and oscillator values stay frozen at
//! the last observed bar. Error can compound with horizon length; that is the
//! accepted cost of this scheme.

use crate::application::ml::predictor::MLPredictor;
use crate::domain::errors::PredictionError;
use crate::domain::forecast::types::{FeatureVector, ForecastStep, Horizon};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RolloutState {
    Running { completed: u32, current: FeatureVector },
    Finished { current: FeatureVector },
    Failed { step: u32 },
}

/// Drives exactly `horizon` sequential `predict_one` calls.
pub struct RolloutForecaster<'m> {
    model: &'m dyn MLPredictor,
    horizon: Horizon,
    state: RolloutState,
}

impl<'m> RolloutForecaster<'m> {
    pub fn new(model: &'m dyn MLPredictor, start: FeatureVector, horizon: Horizon) -> Self {
        Self {
            model,
            horizon,
            state: RolloutState::Running {
                completed: 0,
                current: start,
            },
        }
    }

    pub fn state(&self) -> RolloutState {
        self.state
    }

    /// Advances one step. Returns `Ok(None)` once the horizon is reached.
    pub fn step(&mut self) -> Result<Option<ForecastStep>, PredictionError> {
        let (completed, current) = match self.state {
            RolloutState::Running { completed, current } => (completed, current),
            RolloutState::Finished { .. } | RolloutState::Failed { .. } => return Ok(None),
        };

        let index = completed + 1;
        let predicted = match self.model.predict_one(&current) {
            Ok(p) if p.is_finite() && p > 0.0 => p,
            Ok(p) => {
                self.state = RolloutState::Failed { step: index };
                return Err(PredictionError::ForecastFailure {
                    step: index,
                    reason: format!("model returned invalid price {}", p),
                });
            }
            Err(reason) => {
                self.state = RolloutState::Failed { step: index };
                return Err(PredictionError::ForecastFailure {
                    step: index,
                    reason,
                });
            }
        };

        let next = current.with_price(predicted);
        debug!(step = index, predicted, "rollout step");

        self.state = if index >= self.horizon.minutes() {
            RolloutState::Finished { current: next }
        } else {
            RolloutState::Running {
                completed: index,
                current: next,
            }
        };

        Ok(Some(ForecastStep {
            index,
            vector: next,
        }))
    }

    /// Runs to completion. Only the working vector is kept, so memory does not
    /// grow with the horizon.
    pub fn run(mut self) -> Result<RolloutOutcome, PredictionError> {
        while self.step()?.is_some() {}
        self.outcome()
    }

    /// Runs to completion and also returns every intermediate step.
    pub fn run_collecting(
        mut self,
    ) -> Result<(RolloutOutcome, Vec<ForecastStep>), PredictionError> {
        let mut steps = Vec::new();
        while let Some(step) = self.step()? {
            steps.push(step);
        }
        Ok((self.outcome()?, steps))
    }

    fn outcome(&self) -> Result<RolloutOutcome, PredictionError> {
        match self.state {
            RolloutState::Finished { current } => Ok(RolloutOutcome {
                steps: self.horizon.minutes(),
                final_vector: current,
            }),
            // step() only stops cleanly in the Finished state
            RolloutState::Running { completed, .. } => Err(PredictionError::ForecastFailure {
                step: completed,
                reason: "rollout stopped before the horizon".to_string(),
            }),
            RolloutState::Failed { step } => Err(PredictionError::ForecastFailure {
                step,
                reason: "rollout already failed".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolloutOutcome {
    /// Number of predictions made; always the horizon length.
    pub steps: u32,
    pub final_vector: FeatureVector,
}

impl RolloutOutcome {
    pub fn final_price(&self) -> f64 {
        self.final_vector.price
    }
}
