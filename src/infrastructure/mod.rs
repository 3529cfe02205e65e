pub mod binance;
pub mod core;
pub mod factory;
pub mod mock;

pub use mock::MockMarketDataService;
