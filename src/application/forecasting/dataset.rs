use crate::application::market_data::indicators::IndicatorSet;
use crate::domain::errors::PredictionError;
use crate::domain::forecast::types::{FeatureVector, SupervisedPair};
use crate::domain::market::observation::Observation;

/// Complete feature vectors in chronological order, plus the one-step-ahead
/// pairs derived from them.
#[derive(Debug, Clone)]
pub struct Dataset {
    vectors: Vec<FeatureVector>,
    pairs: Vec<SupervisedPair>,
}

impl Dataset {
    /// Aligns observations with their indicators and pairs each vector with its
    /// successor's price. Fails when fewer than two complete vectors exist.
    pub fn build(
        observations: &[Observation],
        indicators: &IndicatorSet,
    ) -> Result<Self, PredictionError> {
        let vectors = build_feature_vectors(observations, indicators);
        let pairs = build_supervised_pairs(&vectors)?;
        Ok(Self { vectors, pairs })
    }

    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    pub fn pairs(&self) -> &[SupervisedPair] {
        &self.pairs
    }

    pub fn inputs(&self) -> Vec<FeatureVector> {
        self.pairs.iter().map(|p| p.input).collect()
    }

    pub fn labels(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.next_price).collect()
    }

    /// Most recent observed vector; the rollout starts here.
    pub fn last_vector(&self) -> FeatureVector {
        // `build` guarantees at least two vectors
        self.vectors[self.vectors.len() - 1]
    }
}

/// One vector per timestep where the moving average and both oscillator lines
/// are defined. Incomplete timesteps are skipped, never imputed.
pub fn build_feature_vectors(
    observations: &[Observation],
    indicators: &IndicatorSet,
) -> Vec<FeatureVector> {
    let cd = &indicators.convergence_divergence;
    observations
        .iter()
        .enumerate()
        .filter_map(|(i, obs)| {
            let moving_average = (*indicators.moving_average.get(i)?)?;
            let oscillator_line = (*cd.line.get(i)?)?;
            let oscillator_signal = (*cd.signal.get(i)?)?;
            Some(FeatureVector {
                price: obs.close,
                moving_average,
                volume: obs.volume,
                oscillator_line,
                oscillator_signal,
            })
        })
        .collect()
}

/// Pairs `vectors[i]` with the price of `vectors[i + 1]`.
pub fn build_supervised_pairs(
    vectors: &[FeatureVector],
) -> Result<Vec<SupervisedPair>, PredictionError> {
    if vectors.len() < 2 {
        return Err(PredictionError::InsufficientHistory {
            required: 2,
            available: vectors.len(),
        });
    }

    Ok(vectors
        .windows(2)
        .map(|w| SupervisedPair {
            input: w[0],
            next_price: w[1].price,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::market_data::indicators::{
        ConvergenceDivergence, IndicatorSettings,
    };
    use crate::domain::market::observation::closes_and_volumes;

    fn linear_window(n: usize) -> Vec<Observation> {
        (0..n)
            .map(|i| Observation::new(i as i64 * 60_000, 100.0 + i as f64, 10.0))
            .collect()
    }

    fn dataset_for(observations: &[Observation]) -> Result<Dataset, PredictionError> {
        let (closes, _) = closes_and_volumes(observations);
        let indicators = IndicatorSet::compute(&closes, &IndicatorSettings::default())?;
        Dataset::build(observations, &indicators)
    }

    #[test]
    fn test_dataset_pairs_count() {
        let obs = linear_window(36);
        let ds = dataset_for(&obs).unwrap();
        // First complete vector at index 33
        assert_eq!(ds.vectors().len(), 3);
        assert_eq!(ds.pairs().len(), ds.vectors().len() - 1);
        assert_eq!(ds.inputs().len(), ds.labels().len());
        assert_eq!(ds.last_vector().price, 135.0);
    }

    #[test]
    fn test_labels_are_successor_prices() {
        let obs = linear_window(50);
        let ds = dataset_for(&obs).unwrap();
        for (pair, next) in ds.pairs().iter().zip(ds.vectors()[1..].iter()) {
            assert_eq!(pair.next_price, next.price);
            assert_eq!(pair.next_price, pair.input.price + 1.0);
        }
    }

    #[test]
    fn test_vectors_never_partial() {
        let obs = linear_window(60);
        let ds = dataset_for(&obs).unwrap();
        for v in ds.vectors() {
            assert!(v.as_array().iter().all(|x| x.is_finite()));
            assert_eq!(v.volume, 10.0);
        }
    }

    #[test]
    fn test_gaps_are_dropped_not_imputed() {
        let obs = linear_window(4);
        let indicators = IndicatorSet {
            moving_average: vec![Some(1.0), None, Some(1.0), Some(1.0)],
            momentum: 50.0,
            latest_momentum: Some(50.0),
            convergence_divergence: ConvergenceDivergence {
                line: vec![Some(0.1), Some(0.1), Some(0.1), Some(0.1)],
                signal: vec![None, Some(0.2), Some(0.2), Some(0.2)],
            },
        };
        let vectors = build_feature_vectors(&obs, &indicators);
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].price, 102.0);
        assert_eq!(vectors[1].price, 103.0);
    }

    #[test]
    fn test_single_vector_is_insufficient() {
        let obs = linear_window(34);
        let err = dataset_for(&obs).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::InsufficientHistory {
                required: 2,
                available: 1
            }
        ));
    }
}
