// Market structure analysis domain
pub mod analysis;

// Market data domain
pub mod market;

// Domain-specific error types
pub mod errors;
