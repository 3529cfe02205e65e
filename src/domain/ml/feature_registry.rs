use crate::domain::forecast::types::FeatureVector;

/// Ordered list of feature names.
/// Must match `FeatureVector::as_array`; every model is trained on this column order.
pub const FEATURE_NAMES: &[&str] = &[
    "price",
    "moving_average",
    "volume",
    "oscillator_line",
    "oscillator_signal",
];

/// Index of the price column, the only slot rewritten during a rollout.
pub const PRICE_INDEX: usize = 0;

pub const FEATURE_COUNT: usize = 5;

/// Converts one vector into a model input row.
pub fn features_to_f64_vector(fv: &FeatureVector) -> Vec<f64> {
    fv.as_array().to_vec()
}

/// Row-major training matrix, one row per vector.
pub fn features_to_rows(vectors: &[FeatureVector]) -> Vec<Vec<f64>> {
    vectors.iter().map(features_to_f64_vector).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_length() {
        let fv = FeatureVector {
            price: 1.0,
            moving_average: 2.0,
            volume: 3.0,
            oscillator_line: 4.0,
            oscillator_signal: 5.0,
        };
        let vec = features_to_f64_vector(&fv);
        assert_eq!(vec.len(), FEATURE_NAMES.len());
        assert_eq!(vec.len(), FEATURE_COUNT);
        assert_eq!(vec[PRICE_INDEX], 1.0);
        // Signal is the last column
        assert_eq!(vec[4], 5.0);
    }
}
