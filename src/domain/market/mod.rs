// Market analysis domain
pub mod observation;
