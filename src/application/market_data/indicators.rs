//! Technical indicators over a closed price window
//!
//! This module provides:
//! - Exponential moving average (SMA-seeded)
//! - Momentum oscillator (RSI-style, single window and rolling)
//! - Convergence/divergence oscillator (MACD-style line + signal)
//!
//! Every series output is aligned index-for-index with its input, with `None`
//! in the warm-up prefix.

use crate::domain::errors::IndicatorError;
use crate::domain::market::observation::IndicatorSeries;

/// Indicator periods used to build the feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSettings {
    pub ema_period: usize,
    pub rsi_period: usize,
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            ema_period: 10,
            rsi_period: 14,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
        }
    }
}

impl IndicatorSettings {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        for period in [
            self.ema_period,
            self.rsi_period,
            self.macd_fast_period,
            self.macd_slow_period,
            self.macd_signal_period,
        ] {
            if period == 0 {
                return Err(IndicatorError::InvalidPeriod { period });
            }
        }
        Ok(())
    }

    /// Index of the first observation where every feature is defined.
    pub fn warmup(&self) -> usize {
        let macd = self.macd_fast_period.max(self.macd_slow_period) + self.macd_signal_period - 1;
        self.ema_period.max(macd).max(self.rsi_period + 1) - 1
    }

    /// Smallest window that yields at least two complete feature vectors,
    /// i.e. at least one supervised pair.
    pub fn min_observations(&self) -> usize {
        self.warmup() + 2
    }
}

/// Exponential moving average with smoothing `k = 2 / (period + 1)`.
///
/// The seed at index `period - 1` is the arithmetic mean of the first `period`
/// values; later values follow `ema_i = x_i * k + ema_{i-1} * (1 - k)`.
pub fn moving_average(series: &[f64], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { period });
    }
    if series.len() < period {
        return Err(IndicatorError::InsufficientData {
            required: period,
            available: series.len(),
        });
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = series[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(series.len());
    out.resize(period - 1, None);
    out.push(Some(ema));
    for &x in &series[period..] {
        ema = x * k + ema * (1.0 - k);
        out.push(Some(ema));
    }
    Ok(out)
}

/// Momentum oscillator over the first `period` deltas of `closes` only.
///
/// Gains and losses are plain sums (no smoothing). A window without losses
/// divides by 1 instead of 0. The result lies in `[0, 100]`.
pub fn momentum_oscillator(closes: &[f64], period: usize) -> Result<f64, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { period });
    }
    if closes.len() <= period {
        return Err(IndicatorError::InsufficientData {
            required: period + 1,
            available: closes.len(),
        });
    }

    let (gains, losses) = closes[..=period]
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(gains, losses), diff| {
            if diff >= 0.0 {
                (gains + diff, losses)
            } else {
                (gains, losses - diff)
            }
        });

    let divisor = if losses == 0.0 { 1.0 } else { losses };
    let rs = gains / divisor;
    Ok(100.0 - 100.0 / (1.0 + rs))
}

/// Rolling form of [`momentum_oscillator`]: the same single-window formula applied
/// to each trailing window of `period + 1` closes.
pub fn momentum_series(closes: &[f64], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { period });
    }
    if closes.len() <= period {
        return Err(IndicatorError::InsufficientData {
            required: period + 1,
            available: closes.len(),
        });
    }

    let mut out: IndicatorSeries = vec![None; period];
    for window in closes.windows(period + 1) {
        out.push(Some(momentum_oscillator(window, period)?));
    }
    Ok(out)
}

/// Primary and signal lines of the convergence/divergence oscillator.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceDivergence {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
}

impl ConvergenceDivergence {
    pub fn last_line(&self) -> Option<f64> {
        self.line.last().copied().flatten()
    }

    pub fn last_signal(&self) -> Option<f64> {
        self.signal.last().copied().flatten()
    }
}

/// Difference of a short and a long EMA, plus an EMA of that difference.
///
/// The signal EMA runs over the defined primary values only and is then
/// left-padded back to the input length.
pub fn convergence_divergence(
    prices: &[f64],
    short: usize,
    long: usize,
    signal_period: usize,
) -> Result<ConvergenceDivergence, IndicatorError> {
    if signal_period == 0 {
        return Err(IndicatorError::InvalidPeriod {
            period: signal_period,
        });
    }

    let ema_short = moving_average(prices, short)?;
    let ema_long = moving_average(prices, long)?;

    let line: IndicatorSeries = ema_short
        .iter()
        .zip(ema_long.iter())
        .map(|(s, l)| match (s, l) {
            (Some(s), Some(l)) => Some(s - l),
            _ => None,
        })
        .collect();

    let compacted: Vec<f64> = line.iter().flatten().copied().collect();
    let smoothed = moving_average(&compacted, signal_period).map_err(|err| match err {
        IndicatorError::InsufficientData { .. } => IndicatorError::InsufficientData {
            required: short.max(long) + signal_period - 1,
            available: prices.len(),
        },
        other => other,
    })?;

    let mut signal: IndicatorSeries = vec![None; line.len() - smoothed.len()];
    signal.extend(smoothed);

    Ok(ConvergenceDivergence { line, signal })
}

/// All indicators computed for one observation window.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub moving_average: IndicatorSeries,
    /// Single-window momentum over the first `rsi_period` deltas.
    pub momentum: f64,
    /// Same formula over the trailing `rsi_period` deltas of the window.
    pub latest_momentum: Option<f64>,
    pub convergence_divergence: ConvergenceDivergence,
}

impl IndicatorSet {
    pub fn compute(closes: &[f64], settings: &IndicatorSettings) -> Result<Self, IndicatorError> {
        settings.validate()?;
        Ok(Self {
            moving_average: moving_average(closes, settings.ema_period)?,
            momentum: momentum_oscillator(closes, settings.rsi_period)?,
            latest_momentum: momentum_series(closes, settings.rsi_period)?
                .last()
                .copied()
                .flatten(),
            convergence_divergence: convergence_divergence(
                closes,
                settings.macd_fast_period,
                settings.macd_slow_period,
                settings.macd_signal_period,
            )?,
        })
    }

    pub fn last_moving_average(&self) -> Option<f64> {
        self.moving_average.last().copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_moving_average_alignment() {
        for period in 1..=12 {
            let series = ramp(30);
            let ema = moving_average(&series, period).unwrap();
            assert_eq!(ema.len(), series.len());
            assert!(ema[..period - 1].iter().all(Option::is_none));
            assert!(ema[period - 1..].iter().all(Option::is_some));
        }
    }

    #[test]
    fn test_moving_average_seed_and_recurrence() {
        let series = [2.0, 4.0, 6.0, 8.0];
        let ema = moving_average(&series, 3).unwrap();
        // Seed = mean(2, 4, 6) = 4, k = 0.5
        assert_eq!(ema[2], Some(4.0));
        assert_eq!(ema[3], Some(8.0 * 0.5 + 4.0 * 0.5));
    }

    #[test]
    fn test_moving_average_period_one_is_identity() {
        let series = [3.0, 1.0, 4.0];
        let ema = moving_average(&series, 1).unwrap();
        assert_eq!(ema, vec![Some(3.0), Some(1.0), Some(4.0)]);
    }

    #[test]
    fn test_moving_average_rejects_short_input_and_zero_period() {
        assert_eq!(
            moving_average(&[1.0, 2.0], 3),
            Err(IndicatorError::InsufficientData {
                required: 3,
                available: 2
            })
        );
        assert_eq!(
            moving_average(&[1.0], 0),
            Err(IndicatorError::InvalidPeriod { period: 0 })
        );
    }

    #[test]
    fn test_momentum_oscillator_bounds() {
        let rising = ramp(20);
        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        let flat = vec![50.0; 20];
        let choppy: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 100.0 } else { 97.5 })
            .collect();

        for closes in [&rising, &falling, &flat, &choppy] {
            let rsi = momentum_oscillator(closes, 14).unwrap();
            assert!((0.0..=100.0).contains(&rsi), "rsi out of range: {}", rsi);
        }
        assert_eq!(momentum_oscillator(&falling, 14).unwrap(), 0.0);
        assert_eq!(momentum_oscillator(&flat, 14).unwrap(), 0.0);
    }

    #[test]
    fn test_momentum_oscillator_zero_loss_guard() {
        // 14 gains of 1 and no losses: rs = 14 / 1
        let rsi = momentum_oscillator(&ramp(15), 14).unwrap();
        assert!((rsi - (100.0 - 100.0 / 15.0)).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_oscillator_uses_first_window_only() {
        let mut closes = ramp(15);
        // Later crash must not affect the reading
        closes.extend([10.0, 5.0, 1.0]);
        let a = momentum_oscillator(&ramp(15), 14).unwrap();
        let b = momentum_oscillator(&closes, 14).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_momentum_oscillator_balanced_window() {
        let closes = [10.0, 12.0, 10.0];
        // gains 2, losses 2 -> rs 1 -> 50
        assert_eq!(momentum_oscillator(&closes, 2).unwrap(), 50.0);
        assert!(momentum_oscillator(&closes, 3).is_err());
    }

    #[test]
    fn test_momentum_series_alignment() {
        let closes = ramp(20);
        let series = momentum_series(&closes, 14).unwrap();
        assert_eq!(series.len(), closes.len());
        assert!(series[..14].iter().all(Option::is_none));
        assert_eq!(series[14], Some(momentum_oscillator(&closes, 14).unwrap()));
        assert!(series[14..].iter().all(Option::is_some));
    }

    #[test]
    fn test_convergence_divergence_alignment() {
        let prices = ramp(60);
        let cd = convergence_divergence(&prices, 12, 26, 9).unwrap();
        assert_eq!(cd.line.len(), prices.len());
        assert_eq!(cd.signal.len(), prices.len());

        // Line warms up with the long EMA, signal compounds the signal EMA warm-up
        assert!(cd.line[..25].iter().all(Option::is_none));
        assert!(cd.line[25..].iter().all(Option::is_some));
        assert!(cd.signal[..33].iter().all(Option::is_none));
        assert!(cd.signal[33..].iter().all(Option::is_some));
    }

    #[test]
    fn test_convergence_divergence_line_value() {
        let prices = ramp(40);
        let cd = convergence_divergence(&prices, 12, 26, 9).unwrap();
        let short = moving_average(&prices, 12).unwrap();
        let long = moving_average(&prices, 26).unwrap();
        let i = 30;
        let expected = short[i].unwrap() - long[i].unwrap();
        assert!((cd.line[i].unwrap() - expected).abs() < 1e-12);
        // Rising prices: the short EMA leads
        assert!(cd.last_line().unwrap() > 0.0);
    }

    #[test]
    fn test_convergence_divergence_insufficient_for_signal() {
        // Enough for the long EMA but not for the signal EMA
        let prices = ramp(30);
        assert_eq!(
            convergence_divergence(&prices, 12, 26, 9),
            Err(IndicatorError::InsufficientData {
                required: 34,
                available: 30
            })
        );
    }

    #[test]
    fn test_default_settings_warmup() {
        let settings = IndicatorSettings::default();
        assert_eq!(settings.warmup(), 33);
        assert_eq!(settings.min_observations(), 35);
    }

    #[test]
    fn test_indicator_set_compute() {
        let closes = ramp(40);
        let set = IndicatorSet::compute(&closes, &IndicatorSettings::default()).unwrap();
        assert_eq!(set.moving_average.len(), 40);
        assert!(set.last_moving_average().is_some());
        assert!(set.convergence_divergence.last_signal().is_some());
        assert!(set.momentum > 90.0);
        // Every delta of a ramp is a gain, so both windows agree
        assert_eq!(set.latest_momentum, Some(set.momentum));
    }

    #[test]
    fn test_latest_momentum_tracks_window_end() {
        // Rising first half, falling second half
        let mut closes = ramp(20);
        closes.extend((0..20).map(|i| 119.0 - i as f64));
        let set = IndicatorSet::compute(&closes, &IndicatorSettings::default()).unwrap();
        assert!(set.momentum > 90.0);
        assert!(set.latest_momentum.unwrap() < 10.0);
    }
}
