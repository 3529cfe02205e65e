use crate::application::forecasting::service::PredictionService;
use crate::application::ml::{ModelKind, build_trainer};
use crate::config::{Config, Mode};
use crate::domain::ports::MarketDataService;
use crate::infrastructure::binance::BinanceMarketDataService;
use crate::infrastructure::mock::MockMarketDataService;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

const MOCK_WINDOW: usize = 100;

pub struct ServiceFactory;

impl ServiceFactory {
    pub fn create_market_data(config: &Config) -> Result<Arc<dyn MarketDataService>> {
        match config.mode {
            Mode::Mock => Ok(Arc::new(
                MockMarketDataService::synthetic(MOCK_WINDOW).with_symbol(&config.binance.symbol),
            )),
            Mode::Binance => {
                let service = BinanceMarketDataService::builder()
                    .base_url(config.binance.base_url.clone())
                    .symbol(config.binance.symbol.clone())
                    .interval(config.binance.interval.clone())
                    .limit(config.binance.kline_limit)
                    .max_retries(config.binance.max_retries)
                    .build()?;
                Ok(Arc::new(service))
            }
        }
    }

    /// Wires a prediction service from configuration, with an optional model override.
    pub fn create_prediction_service(
        config: &Config,
        model_override: Option<ModelKind>,
    ) -> Result<PredictionService> {
        let market_data = Self::create_market_data(config)?;
        let kind = model_override.unwrap_or(config.forecast.model);
        let trainer = build_trainer(kind, config.forecast.forest, config.forecast.mlp);
        info!(
            "Prediction service: mode={:?}, symbol={}, model={}",
            config.mode,
            market_data.symbol(),
            trainer.name()
        );
        Ok(PredictionService::new(
            market_data,
            trainer,
            config.forecast.indicators,
        ))
    }
}
