use crate::domain::analysis::stats;
use crate::domain::errors::AnalysisError;
use crate::domain::market::bar::PriceSeries;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Absolute price envelope [lower, upper].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBand {
    pub lower: f64,
    pub upper: f64,
}

impl PriceBand {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Sigma-based volatility levels anchored to the latest close.
///
/// Returns are log returns, so the bands are multiplicative:
/// level(k) = pivot * exp(mean ± k * sigma).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityLevels {
    pub lookback: usize,
    pub mean_return: f64,
    pub std_dev: f64,
    pub pivot: f64,
    pub sigma1: PriceBand,
    pub sigma2: PriceBand,
    pub annualized_volatility: f64,
}

/// Computes mean/sigma of log returns over a lookback window and projects
/// sigma bands around the latest close. Pure function of its input; every
/// call recomputes from scratch.
pub struct VolatilityEngine {
    lookback: usize,
}

impl VolatilityEngine {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    pub fn compute(&self, series: &PriceSeries) -> Result<VolatilityLevels, AnalysisError> {
        let closes = series.closes_f64();
        let window_start = closes.len().saturating_sub(self.lookback);
        let window = &closes[window_start..];

        if window.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                what: "volatility window",
                required: 2,
                actual: window.len(),
            });
        }

        let returns = stats::log_returns(window);
        let mean_return = stats::mean(&returns);
        let std_dev = stats::sample_std_dev(&returns);

        let pivot = *window.last().expect("window verified non-empty");
        let band = |k: f64| PriceBand {
            lower: pivot * (mean_return - k * std_dev).exp(),
            upper: pivot * (mean_return + k * std_dev).exp(),
        };

        Ok(VolatilityLevels {
            lookback: window.len(),
            mean_return,
            std_dev,
            pivot,
            sigma1: band(1.0),
            sigma2: band(2.0),
            annualized_volatility: std_dev * TRADING_DAYS_PER_YEAR.sqrt(),
        })
    }
}

/// Mean true range over the trailing `period` bars.
///
/// True range per bar is max(high - low, |high - prev close|,
/// |low - prev close|). Needs period + 1 bars for the first previous close.
pub fn average_true_range(series: &PriceSeries, period: usize) -> Result<f64, AnalysisError> {
    let bars = series.bars();
    if bars.len() < period + 1 {
        return Err(AnalysisError::InsufficientData {
            what: "average true range",
            required: period + 1,
            actual: bars.len(),
        });
    }

    let start = bars.len() - period;
    let mut sum = 0.0;
    for i in start..bars.len() {
        let high = bars[i].high.to_f64().unwrap_or(0.0);
        let low = bars[i].low.to_f64().unwrap_or(0.0);
        let prev_close = bars[i - 1].close.to_f64().unwrap_or(0.0);

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        sum += tr;
    }

    Ok(sum / period as f64)
}
