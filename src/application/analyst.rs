use crate::config::AnalysisConfig;
use crate::domain::analysis::correlation::CorrelationEngine;
use crate::domain::analysis::regime::RegimeClassifier;
use crate::domain::analysis::report::MarketStructureReport;
use crate::domain::analysis::volatility::{VolatilityEngine, average_true_range};
use crate::domain::analysis::volume_profile::VolumeProfileBuilder;
use crate::domain::errors::AnalysisError;
use crate::domain::market::bar::PriceSeries;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use tracing::info;

/// Runs the four analysis engines over one primary series plus its
/// correlation set and assembles the report.
///
/// Stateless and synchronous: independent reports (other instruments, other
/// runs) can be computed concurrently without coordination. Failures on the
/// primary series abort with the typed error; correlation failures are scoped
/// to their pair and only logged.
pub struct MarketAnalyst {
    config: AnalysisConfig,
}

impl MarketAnalyst {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(
        &self,
        primary: &PriceSeries,
        auxiliaries: &[PriceSeries],
    ) -> Result<MarketStructureReport, AnalysisError> {
        info!(
            symbol = primary.symbol(),
            bars = primary.len(),
            auxiliaries = auxiliaries.len(),
            "analyzing market structure"
        );

        let profile_builder = VolumeProfileBuilder::new(
            self.config.volume_bucket_count,
            self.config.value_area_threshold,
        );
        let volume_profile = profile_builder.build(primary)?;

        let volatility = VolatilityEngine::new(self.config.volatility_lookback).compute(primary)?;
        let atr = average_true_range(primary, self.config.atr_period)?;

        let regime = RegimeClassifier::new(
            self.config.trend_persistence_bars,
            self.config.trend_subwindows,
            self.config.compressed_va_atr_ratio,
            self.config.compressed_sigma_pct,
            profile_builder,
        )
        .classify(primary, &volume_profile, &volatility, atr);

        let correlation_engine = CorrelationEngine::new(
            self.config.correlation_lookback,
            self.config.correlation_min_samples,
        );
        let all_series: Vec<&PriceSeries> =
            std::iter::once(primary).chain(auxiliaries.iter()).collect();
        let correlations = correlation_engine.matrix(&all_series);

        let closes = primary.closes_f64();
        let latest_close = primary
            .latest_close()
            .and_then(|c| c.to_f64())
            .unwrap_or(0.0);
        let daily_change_pct = match closes.len().checked_sub(2).map(|i| closes[i]) {
            Some(prev) if prev > 0.0 => (latest_close - prev) / prev * 100.0,
            _ => 0.0,
        };

        info!(
            symbol = primary.symbol(),
            regime = %regime.regime_type,
            confidence = regime.confidence,
            vpoc = volume_profile.vpoc_price,
            pairs = correlations.pairs.len(),
            "market structure analysis complete"
        );

        Ok(MarketStructureReport {
            symbol: primary.symbol().to_string(),
            timeframe: primary.timeframe(),
            generated_at: Utc::now(),
            bars_analyzed: primary.len(),
            latest_close,
            daily_change_pct,
            volume_profile,
            volatility,
            average_true_range: atr,
            correlations,
            regime,
        })
    }
}
