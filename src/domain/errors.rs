use thiserror::Error;

/// Errors produced by the market structure analysis components.
///
/// Each engine validates its own preconditions and fails with a typed error
/// instead of returning a partial numeric result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Insufficient data for {what}: need {required} bars, have {actual}")]
    InsufficientData {
        what: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Malformed series for {symbol}: {reason}")]
    MalformedSeries { symbol: String, reason: String },

    #[error("Volume profile for {symbol} is degenerate: total volume is zero")]
    ZeroVolume { symbol: String },
}
