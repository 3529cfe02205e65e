// Supervised dataset construction
pub mod dataset;

// Recursive multi-step rollout
pub mod rollout;

// Confidence and direction scoring
pub mod scoring;

// Request orchestration
pub mod service;
