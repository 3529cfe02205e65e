// Domain-specific error types
pub mod errors;

// Forecast request, feature and result types
pub mod forecast;

// Market observations
pub mod market;

// Feature layout shared by the regressors
pub mod ml;

// Port interfaces
pub mod ports;
