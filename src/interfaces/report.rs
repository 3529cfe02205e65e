use crate::domain::forecast::types::{Direction, PredictionResponse};
use std::fmt::Write;

/// Renders a prediction as terminal text.
pub fn render_report(symbol: &str, response: &PredictionResponse) -> String {
    let arrow = match response.direction {
        Direction::Above => "▲",
        Direction::Below => "▼",
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} at {} ({} min ahead)",
        symbol,
        response.target_time.format("%Y-%m-%d %H:%M UTC"),
        response.minutes_ahead
    );
    let _ = writeln!(
        out,
        "  Predicted:        {} {} ${:.2}",
        arrow, response.direction, response.target_price
    );
    let _ = writeln!(out, "  Predicted Price:  ${:.2}", response.predicted_price);
    let _ = writeln!(out, "  Current Price:    ${:.2}", response.current_price);
    let _ = writeln!(out, "  EMA:              ${:.2}", response.current_moving_average);
    let _ = writeln!(out, "  RSI:              {:.2}", response.current_oscillator_value);
    if let Some(latest) = response.latest_oscillator_value {
        let _ = writeln!(out, "  RSI (latest):     {:.2}", latest);
    }
    let _ = writeln!(
        out,
        "  MACD:             {:.2} | Signal: {:.2}",
        response.current_oscillator_line, response.current_oscillator_signal
    );
    let _ = writeln!(out, "  Confidence:       {:.1}%", response.confidence_pct);
    let _ = write!(out, "  Model:            {}", response.model);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_report() {
        let response = PredictionResponse {
            direction: Direction::Below,
            predicted_price: 140.0,
            current_price: 135.0,
            current_moving_average: 130.5,
            current_oscillator_value: 93.333,
            latest_oscillator_value: Some(40.0),
            current_oscillator_line: 7.0,
            current_oscillator_signal: 7.0,
            confidence_pct: 73.333,
            target_price: 150.0,
            target_time: Utc.with_ymd_and_hms(2026, 10, 16, 12, 5, 0).unwrap(),
            minutes_ahead: 5,
            model: "stub".to_string(),
        };

        let text = render_report("BTCUSDT", &response);
        assert!(text.starts_with("BTCUSDT at 2026-10-16 12:05 UTC (5 min ahead)"));
        assert!(text.contains("Below $150.00"));
        assert!(text.contains("Predicted Price:  $140.00"));
        assert!(text.contains("RSI:              93.33"));
        assert!(text.contains("RSI (latest):     40.00"));
        assert!(text.contains("Confidence:       73.3%"));
    }
}
