use crate::domain::analysis::correlation::CorrelationMatrix;
use crate::domain::analysis::regime::Regime;
use crate::domain::analysis::volatility::VolatilityLevels;
use crate::domain::analysis::volume_profile::VolumeProfile;
use crate::domain::market::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Finished market-structure description for one primary instrument.
///
/// Built once per pipeline run, immutable, and handed to the synthesis or
/// notification collaborator. Each section is exclusively owned by the
/// report.
#[derive(Debug, Clone, Serialize)]
pub struct MarketStructureReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub generated_at: DateTime<Utc>,
    pub bars_analyzed: usize,
    pub latest_close: f64,
    pub daily_change_pct: f64,
    pub volume_profile: VolumeProfile,
    pub volatility: VolatilityLevels,
    pub average_true_range: f64,
    pub correlations: CorrelationMatrix,
    pub regime: Regime,
}
