use super::predictor::{MLPredictor, ModelTrainer, check_training_shape};
use crate::domain::forecast::types::FeatureVector;
use crate::domain::ml::feature_registry::{features_to_f64_vector, features_to_rows};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use tracing::debug;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;
type Linear = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 8,
            min_split: 2,
        }
    }
}

/// Regressors backed by smartcore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartCoreTrainer {
    /// Ordinary least squares.
    Linear,
    RandomForest(ForestParams),
}

impl ModelTrainer for SmartCoreTrainer {
    fn fit(&self, inputs: &[FeatureVector], labels: &[f64]) -> Result<Box<dyn MLPredictor>, String> {
        check_training_shape(inputs, labels)?;

        let x = DenseMatrix::from_2d_vec(&features_to_rows(inputs))
            .map_err(|e| format!("Matrix error: {}", e))?;
        let y = labels.to_vec();

        let model = match self {
            SmartCoreTrainer::Linear => {
                let model = LinearRegression::fit(&x, &y, LinearRegressionParameters::default())
                    .map_err(|e| format!("Training error: {}", e))?;
                FittedModel::Linear(model)
            }
            SmartCoreTrainer::RandomForest(params) => {
                let parameters = RandomForestRegressorParameters::default()
                    .with_n_trees(params.n_trees)
                    .with_max_depth(params.max_depth)
                    .with_min_samples_split(params.min_split);
                let model = RandomForestRegressor::fit(&x, &y, parameters)
                    .map_err(|e| format!("Training error: {}", e))?;
                FittedModel::Forest(model)
            }
        };

        debug!("{} fitted on {} samples", self.name(), inputs.len());
        Ok(Box::new(SmartCorePredictor {
            model,
            name: self.name().to_string(),
        }))
    }

    fn name(&self) -> &str {
        match self {
            SmartCoreTrainer::Linear => "SmartCore Linear Regression",
            SmartCoreTrainer::RandomForest(_) => "SmartCore Random Forest",
        }
    }
}

enum FittedModel {
    Linear(Linear),
    Forest(Forest),
}

pub struct SmartCorePredictor {
    model: FittedModel,
    name: String,
}

impl MLPredictor for SmartCorePredictor {
    fn predict_one(&self, features: &FeatureVector) -> Result<f64, String> {
        let input_matrix = DenseMatrix::from_2d_vec(&vec![features_to_f64_vector(features)])
            .map_err(|e| format!("Matrix creation failed: {}", e))?;

        let predictions = match &self.model {
            FittedModel::Linear(model) => model.predict(&input_matrix),
            FittedModel::Forest(model) => model.predict(&input_matrix),
        }
        .map_err(|e| format!("Prediction failed: {}", e))?;

        match predictions.first() {
            Some(pred) if pred.is_finite() => Ok(*pred),
            Some(pred) => Err(format!("Non-finite prediction: {}", pred)),
            None => Err("No prediction returned".to_string()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// next = 0.5 * price + 0.3 * ema + 0.1 * volume + 2 * line - signal + 4
    fn synthetic(n: usize) -> (Vec<FeatureVector>, Vec<f64>) {
        let inputs: Vec<FeatureVector> = (0..n)
            .map(|i| {
                let t = i as f64;
                FeatureVector {
                    price: 100.0 + t + (t * 0.7).sin() * 3.0,
                    moving_average: 99.0 + t * 0.9 + (t * 0.3).cos(),
                    volume: 10.0 + (t * 1.3).sin() * 4.0 + (i % 3) as f64,
                    oscillator_line: (t * 0.5).sin(),
                    oscillator_signal: (t * 0.2).cos() * 0.5,
                }
            })
            .collect();
        let labels = inputs
            .iter()
            .map(|v| {
                0.5 * v.price + 0.3 * v.moving_average + 0.1 * v.volume + 2.0 * v.oscillator_line
                    - v.oscillator_signal
                    + 4.0
            })
            .collect();
        (inputs, labels)
    }

    #[test]
    fn test_linear_recovers_linear_relation() {
        let (inputs, labels) = synthetic(60);
        let model = SmartCoreTrainer::Linear.fit(&inputs, &labels).unwrap();
        for (v, y) in inputs.iter().zip(labels.iter()).take(5) {
            let pred = model.predict_one(v).unwrap();
            assert!((pred - y).abs() < 1e-6, "pred {} vs {}", pred, y);
        }
        assert_eq!(model.name(), "SmartCore Linear Regression");
    }

    #[test]
    fn test_forest_predicts_within_label_range() {
        let (inputs, labels) = synthetic(60);
        let trainer = SmartCoreTrainer::RandomForest(ForestParams {
            n_trees: 10,
            max_depth: 5,
            min_split: 2,
        });
        let model = trainer.fit(&inputs, &labels).unwrap();
        let min = labels.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = labels.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let pred = model.predict_one(&inputs[10]).unwrap();
        assert!(pred >= min && pred <= max);
    }

    #[test]
    fn test_fit_rejects_bad_shapes() {
        let (inputs, labels) = synthetic(10);
        assert!(SmartCoreTrainer::Linear.fit(&inputs, &labels[..5]).is_err());
        assert!(SmartCoreTrainer::Linear.fit(&[], &[]).is_err());
    }
}
