use crate::domain::errors::PredictionError;
use crate::domain::forecast::types::{Direction, ForecastResult};

pub const BASELINE_CONFIDENCE: f64 = 80.0;
pub const MIN_CONFIDENCE: f64 = 55.0;
pub const MAX_CONFIDENCE: f64 = 95.0;

/// Scores a final forecast against the user's target price.
///
/// The confidence is a display heuristic, not a statistical interval: it starts
/// at 80%, drops one point per percent of relative error and is clamped to
/// [55, 95].
///
/// A bad target is the caller's input and fails as `InvalidInput`. A bad
/// prediction can only come from the model, so it fails as `ForecastFailure`
/// with step 0 (after the rollout).
pub fn evaluate(predicted_price: f64, target_price: f64) -> Result<ForecastResult, PredictionError> {
    if !target_price.is_finite() || target_price <= 0.0 {
        return Err(PredictionError::invalid_input(format!(
            "target price must be a positive number, got {}",
            target_price
        )));
    }
    if !predicted_price.is_finite() || predicted_price <= 0.0 {
        return Err(PredictionError::ForecastFailure {
            step: 0,
            reason: format!("final forecast {} is not a positive price", predicted_price),
        });
    }

    let relative_error_pct = (predicted_price - target_price).abs() / target_price * 100.0;
    let confidence_pct =
        (BASELINE_CONFIDENCE - relative_error_pct).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

    let direction = if predicted_price > target_price {
        Direction::Above
    } else {
        Direction::Below
    };

    Ok(ForecastResult {
        predicted_price,
        direction,
        confidence_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        let result = evaluate(140.0, 150.0).unwrap();
        assert_eq!(result.direction, Direction::Below);
        let expected = 80.0 - (10.0 / 150.0) * 100.0;
        assert!((result.confidence_pct - expected).abs() < 1e-9);
        assert!((result.confidence_pct - 73.33).abs() < 0.01);
    }

    #[test]
    fn test_confidence_floor() {
        // 50% relative error
        let result = evaluate(150.0, 100.0).unwrap();
        assert_eq!(result.confidence_pct, MIN_CONFIDENCE);
        assert_eq!(result.direction, Direction::Above);
    }

    #[test]
    fn test_exact_hit_is_baseline_and_below() {
        let result = evaluate(100.0, 100.0).unwrap();
        assert_eq!(result.confidence_pct, BASELINE_CONFIDENCE);
        // Ties are not above
        assert_eq!(result.direction, Direction::Below);
    }

    #[test]
    fn test_confidence_always_bounded() {
        let prices = [1e-6, 0.5, 1.0, 99.0, 100.0, 101.0, 1e4, 1e9];
        for &p in &prices {
            for &t in &prices {
                let c = evaluate(p, t).unwrap().confidence_pct;
                assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&c), "{} vs {}: {}", p, t, c);
            }
        }
    }

    #[test]
    fn test_bad_target_is_invalid_input() {
        for target in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                evaluate(100.0, target),
                Err(PredictionError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_bad_prediction_is_forecast_failure() {
        for predicted in [0.0, -5.0, f64::NAN] {
            let err = evaluate(predicted, 100.0).unwrap_err();
            assert!(matches!(err, PredictionError::ForecastFailure { step: 0, .. }));
            assert!(!err.is_validation());
        }
    }
}
