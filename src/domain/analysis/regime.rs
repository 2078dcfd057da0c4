use crate::domain::analysis::volatility::VolatilityLevels;
use crate::domain::analysis::volume_profile::{VolumeProfile, VolumeProfileBuilder};
use crate::domain::market::bar::PriceSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete market-state classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeType {
    Trend,
    Balance,
    Compressed,
}

impl fmt::Display for RegimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegimeType::Trend => write!(f, "Trend"),
            RegimeType::Balance => write!(f, "Balance"),
            RegimeType::Compressed => write!(f, "Compressed"),
        }
    }
}

/// Regime plus the confidence of the classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regime {
    pub regime_type: RegimeType,
    pub confidence: f64,
}

impl Regime {
    pub fn new(regime_type: RegimeType, confidence: f64) -> Self {
        Self {
            regime_type,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Rule-based Trend / Balance / Compressed classifier.
///
/// Deliberately memoryless: every call is a pure function of the current
/// window's volume geometry and volatility. A "regime change" between runs is
/// only an artifact of different input.
pub struct RegimeClassifier {
    persistence_bars: usize,
    subwindows: usize,
    compressed_va_atr_ratio: f64,
    compressed_sigma_pct: f64,
    profile_builder: VolumeProfileBuilder,
}

impl RegimeClassifier {
    pub fn new(
        persistence_bars: usize,
        subwindows: usize,
        compressed_va_atr_ratio: f64,
        compressed_sigma_pct: f64,
        profile_builder: VolumeProfileBuilder,
    ) -> Self {
        Self {
            persistence_bars: persistence_bars.max(1),
            subwindows: subwindows.max(2),
            compressed_va_atr_ratio,
            compressed_sigma_pct,
            profile_builder,
        }
    }

    /// Classifies the current window.
    ///
    /// Compressed: value-area width below its ATR-relative threshold AND
    /// sigma1 band width below its pivot-relative threshold.
    /// Trend: the last `persistence_bars` closes all strictly outside the
    /// value area on one side AND sub-window VPOCs strictly monotone in that
    /// direction. Balance otherwise.
    pub fn classify(
        &self,
        series: &PriceSeries,
        profile: &VolumeProfile,
        levels: &VolatilityLevels,
        atr: f64,
    ) -> Regime {
        let width_ratio = if atr > 0.0 {
            profile.value_area_width() / (atr * self.compressed_va_atr_ratio)
        } else {
            f64::INFINITY
        };
        let sigma_ratio = if levels.pivot > 0.0 {
            (levels.sigma1.width() / levels.pivot) / self.compressed_sigma_pct
        } else {
            f64::INFINITY
        };

        if width_ratio < 1.0 && sigma_ratio < 1.0 {
            // Margin of the binding metric, the one closest to its threshold
            let confidence = 1.0 - width_ratio.max(sigma_ratio);
            return Regime::new(RegimeType::Compressed, confidence);
        }

        let closes = series.closes_f64();
        let (streak, direction) = Self::outside_streak(
            &closes,
            profile.value_area_low,
            profile.value_area_high,
        );

        if streak >= self.persistence_bars && self.subwindow_vpocs_monotone(series, direction) {
            let confidence = streak as f64 / (2 * self.persistence_bars) as f64;
            return Regime::new(RegimeType::Trend, confidence);
        }

        // Balance confidence grows with the distance from both competing
        // thresholds
        let compressed_distance = (width_ratio.max(sigma_ratio) - 1.0).min(1.0);
        let trend_distance = 1.0 - streak as f64 / self.persistence_bars as f64;
        Regime::new(RegimeType::Balance, compressed_distance.min(trend_distance))
    }

    /// Consecutive closes, counted from the latest bar backwards, strictly
    /// outside the value area on one side. Returns (streak, direction) with
    /// direction +1 above and -1 below.
    fn outside_streak(closes: &[f64], area_low: f64, area_high: f64) -> (usize, i8) {
        let last = match closes.last() {
            Some(&c) => c,
            None => return (0, 0),
        };

        let direction = if last > area_high {
            1
        } else if last < area_low {
            -1
        } else {
            return (0, 0);
        };

        let streak = closes
            .iter()
            .rev()
            .take_while(|&&c| {
                if direction > 0 {
                    c > area_high
                } else {
                    c < area_low
                }
            })
            .count();

        (streak, direction)
    }

    /// True when the VPOCs of successive equal sub-windows move strictly in
    /// `direction`. A sub-window without volume cannot confirm a trend.
    fn subwindow_vpocs_monotone(&self, series: &PriceSeries, direction: i8) -> bool {
        let bars = series.bars();
        if bars.len() < self.subwindows {
            return false;
        }

        let mut previous: Option<f64> = None;
        for w in 0..self.subwindows {
            let start = w * bars.len() / self.subwindows;
            let end = (w + 1) * bars.len() / self.subwindows;

            let vpoc = match self
                .profile_builder
                .build_bars(series.symbol(), &bars[start..end])
            {
                Ok(profile) => profile.vpoc_price,
                Err(_) => return false,
            };

            if let Some(prev) = previous {
                let advancing = if direction > 0 { vpoc > prev } else { vpoc < prev };
                if !advancing {
                    return false;
                }
            }
            previous = Some(vpoc);
        }

        true
    }
}
