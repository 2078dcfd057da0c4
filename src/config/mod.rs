//! Configuration for the market structure analysis pipeline.
//!
//! Every numeric tunable the engines consume lives here, loaded from
//! environment variables with in-code defaults. Components receive the
//! values explicitly; nothing reads process-wide state at analysis time.

use anyhow::{Context, Result};
use std::env;

/// Tunables for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Number of equal-width price buckets in the volume profile
    pub volume_bucket_count: usize,
    /// Volume share the value area must reach, in (0, 1]
    pub value_area_threshold: f64,
    /// Bars in the volatility lookback window
    pub volatility_lookback: usize,
    /// Trailing bars for the average true range reference
    pub atr_period: usize,
    /// Aligned bars in the correlation window
    pub correlation_lookback: usize,
    /// Minimum aligned overlap for a correlation pair
    pub correlation_min_samples: usize,
    /// Closes that must sit outside the value area for a Trend call
    pub trend_persistence_bars: usize,
    /// Sub-windows whose VPOCs must move monotonically for a Trend call
    pub trend_subwindows: usize,
    /// Compressed when value-area width < ratio * ATR
    pub compressed_va_atr_ratio: f64,
    /// Compressed when sigma1 width / pivot < this fraction
    pub compressed_sigma_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            volume_bucket_count: 24,
            value_area_threshold: 0.70,
            volatility_lookback: 20,
            atr_period: 14,
            correlation_lookback: 30,
            correlation_min_samples: 10,
            trend_persistence_bars: 3,
            trend_subwindows: 3,
            compressed_va_atr_ratio: 1.0,
            compressed_sigma_pct: 0.02,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            volume_bucket_count: Self::parse_usize("VOLUME_BUCKET_COUNT", 24)?,
            value_area_threshold: Self::parse_f64("VALUE_AREA_THRESHOLD", 0.70)?,
            volatility_lookback: Self::parse_usize("VOLATILITY_LOOKBACK", 20)?,
            atr_period: Self::parse_usize("ATR_PERIOD", 14)?,
            correlation_lookback: Self::parse_usize("CORRELATION_LOOKBACK", 30)?,
            correlation_min_samples: Self::parse_usize("CORRELATION_MIN_SAMPLES", 10)?,
            trend_persistence_bars: Self::parse_usize("TREND_PERSISTENCE_BARS", 3)?,
            trend_subwindows: Self::parse_usize("TREND_SUBWINDOWS", 3)?,
            compressed_va_atr_ratio: Self::parse_f64("COMPRESSED_VA_ATR_RATIO", 1.0)?,
            compressed_sigma_pct: Self::parse_f64("COMPRESSED_SIGMA_PCT", 0.02)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.volume_bucket_count == 0 {
            anyhow::bail!("VOLUME_BUCKET_COUNT must be at least 1");
        }
        if !(self.value_area_threshold > 0.0 && self.value_area_threshold <= 1.0) {
            anyhow::bail!(
                "VALUE_AREA_THRESHOLD must be in (0, 1], got {}",
                self.value_area_threshold
            );
        }
        if self.volatility_lookback < 2 {
            anyhow::bail!("VOLATILITY_LOOKBACK must be at least 2");
        }
        if self.atr_period == 0 {
            anyhow::bail!("ATR_PERIOD must be at least 1");
        }
        if self.correlation_min_samples < 2 {
            anyhow::bail!("CORRELATION_MIN_SAMPLES must be at least 2");
        }
        if self.correlation_lookback < self.correlation_min_samples {
            anyhow::bail!(
                "CORRELATION_LOOKBACK ({}) must be at least CORRELATION_MIN_SAMPLES ({})",
                self.correlation_lookback,
                self.correlation_min_samples
            );
        }
        if self.trend_subwindows < 2 {
            anyhow::bail!("TREND_SUBWINDOWS must be at least 2");
        }
        if self.compressed_va_atr_ratio <= 0.0 || self.compressed_sigma_pct <= 0.0 {
            anyhow::bail!("Compressed thresholds must be positive");
        }
        Ok(())
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.volume_bucket_count, 24);
        assert_eq!(config.value_area_threshold, 0.70);
        assert_eq!(config.correlation_min_samples, 10);
    }

    #[test]
    fn test_rejects_threshold_above_one() {
        let config = AnalysisConfig {
            value_area_threshold: 1.2,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_buckets() {
        let config = AnalysisConfig {
            volume_bucket_count: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_lookback_below_min_samples() {
        let config = AnalysisConfig {
            correlation_lookback: 5,
            correlation_min_samples: 10,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_single_subwindow() {
        let config = AnalysisConfig {
            trend_subwindows: 1,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
