use crate::domain::forecast::types::FeatureVector;

/// Interface for a trained one-step price regressor
pub trait MLPredictor: Send + Sync {
    /// Predict the next price for one feature vector
    fn predict_one(&self, features: &FeatureVector) -> Result<f64, String>;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// Fits a fresh [`MLPredictor`] on one-step supervised data.
///
/// Each call returns an independent model; trainers hold configuration only,
/// so one trainer can serve concurrent requests.
pub trait ModelTrainer: Send + Sync {
    fn fit(&self, inputs: &[FeatureVector], labels: &[f64]) -> Result<Box<dyn MLPredictor>, String>;

    fn name(&self) -> &str;
}

pub(crate) fn check_training_shape(inputs: &[FeatureVector], labels: &[f64]) -> Result<(), String> {
    if inputs.is_empty() {
        return Err("no training samples".to_string());
    }
    if inputs.len() != labels.len() {
        return Err(format!(
            "input/label length mismatch: {} vs {}",
            inputs.len(),
            labels.len()
        ));
    }
    if inputs
        .iter()
        .flat_map(|v| v.as_array())
        .chain(labels.iter().copied())
        .any(|x| !x.is_finite())
    {
        return Err("training data contains non-finite values".to_string());
    }
    Ok(())
}
