pub mod mlp_predictor;
pub mod predictor;
pub mod smartcore_predictor;

use mlp_predictor::{MlpParams, MlpTrainer};
use predictor::ModelTrainer;
use smartcore_predictor::{ForestParams, SmartCoreTrainer};
use std::str::FromStr;
use std::sync::Arc;

/// Regression backend used for one-step forecasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Linear,
    Forest,
    Mlp,
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(ModelKind::Linear),
            "forest" | "random_forest" => Ok(ModelKind::Forest),
            "mlp" => Ok(ModelKind::Mlp),
            _ => anyhow::bail!(
                "Invalid FORECAST_MODEL: {}. Must be 'linear', 'forest', or 'mlp'",
                s
            ),
        }
    }
}

/// Builds the trainer for `kind`; unused parameter sets are ignored.
pub fn build_trainer(
    kind: ModelKind,
    forest: ForestParams,
    mlp: MlpParams,
) -> Arc<dyn ModelTrainer> {
    match kind {
        ModelKind::Linear => Arc::new(SmartCoreTrainer::Linear),
        ModelKind::Forest => Arc::new(SmartCoreTrainer::RandomForest(forest)),
        ModelKind::Mlp => Arc::new(MlpTrainer::new(mlp)),
    }
}
