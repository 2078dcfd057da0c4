use crate::domain::analysis::stats;
use crate::domain::errors::AnalysisError;
use crate::domain::market::bar::PriceSeries;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// One instrument pair's Pearson coefficient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairCorrelation {
    pub first: String,
    pub second: String,
    pub coefficient: f64,
}

/// Symmetric correlation matrix over an aligned lookback window. Pairs that
/// failed their own precondition are simply absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub lookback: usize,
    pub pairs: Vec<PairCorrelation>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.pairs
            .iter()
            .find(|p| {
                (p.first == a && p.second == b) || (p.first == b && p.second == a)
            })
            .map(|p| p.coefficient)
    }
}

/// Pairwise Pearson correlation of log returns over timestamp-aligned closes.
pub struct CorrelationEngine {
    lookback: usize,
    min_samples: usize,
}

impl CorrelationEngine {
    pub fn new(lookback: usize, min_samples: usize) -> Self {
        Self {
            lookback,
            min_samples,
        }
    }

    /// Correlation for one pair. Inner-joins the two series by timestamp,
    /// keeps the last `lookback` aligned bars, and correlates their log
    /// returns. Fails with `InsufficientData` when the aligned overlap is
    /// below the minimum sample count.
    pub fn pair_correlation(
        &self,
        a: &PriceSeries,
        b: &PriceSeries,
    ) -> Result<f64, AnalysisError> {
        let b_closes: HashMap<i64, f64> = b
            .bars()
            .iter()
            .map(|bar| (bar.timestamp, bar.close.to_f64().unwrap_or(0.0)))
            .collect();

        let mut aligned: Vec<(f64, f64)> = a
            .bars()
            .iter()
            .filter_map(|bar| {
                b_closes
                    .get(&bar.timestamp)
                    .map(|&close_b| (bar.close.to_f64().unwrap_or(0.0), close_b))
            })
            .collect();

        if aligned.len() < self.min_samples {
            return Err(AnalysisError::InsufficientData {
                what: "aligned correlation overlap",
                required: self.min_samples,
                actual: aligned.len(),
            });
        }

        let window_start = aligned.len().saturating_sub(self.lookback);
        aligned.drain(..window_start);

        let (closes_a, closes_b): (Vec<f64>, Vec<f64>) = aligned.into_iter().unzip();
        let returns_a = stats::log_returns(&closes_a);
        let returns_b = stats::log_returns(&closes_b);

        Ok(stats::pearson_correlation(&returns_a, &returns_b))
    }

    /// Full matrix over the given series. Failures are scoped per pair: a
    /// pair without enough overlap is skipped with a warning and the rest of
    /// the matrix is still produced.
    pub fn matrix(&self, series: &[&PriceSeries]) -> CorrelationMatrix {
        let mut pairs = Vec::new();

        for i in 0..series.len() {
            for j in (i + 1)..series.len() {
                match self.pair_correlation(series[i], series[j]) {
                    Ok(coefficient) => pairs.push(PairCorrelation {
                        first: series[i].symbol().to_string(),
                        second: series[j].symbol().to_string(),
                        coefficient,
                    }),
                    Err(err) => warn!(
                        first = series[i].symbol(),
                        second = series[j].symbol(),
                        error = %err,
                        "skipping correlation pair"
                    ),
                }
            }
        }

        CorrelationMatrix {
            lookback: self.lookback,
            pairs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::bar::Bar;
    use crate::domain::market::timeframe::Timeframe;
    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;

    fn series_with(symbol: &str, points: &[(i64, f64)]) -> PriceSeries {
        let bars = points
            .iter()
            .map(|&(timestamp, close)| Bar {
                timestamp,
                open: Decimal::from_f64(close).unwrap(),
                high: Decimal::from_f64(close + 1.0).unwrap(),
                low: Decimal::from_f64(close - 1.0).unwrap(),
                close: Decimal::from_f64(close).unwrap(),
                volume: Decimal::from(1000),
            })
            .collect();
        PriceSeries::new(symbol, Timeframe::OneDay, bars).unwrap()
    }

    fn wavy(symbol: &str, count: i64, base: f64) -> PriceSeries {
        let points: Vec<(i64, f64)> = (0..count)
            .map(|i| (i, base + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1))
            .collect();
        series_with(symbol, &points)
    }

    #[test]
    fn test_self_correlation_is_one() {
        let engine = CorrelationEngine::new(30, 10);
        let a = wavy("GC=F", 40, 1900.0);
        let b = a.clone();

        let corr = engine.pair_correlation(&a, &b).unwrap();
        assert!((corr - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_series_fully_anti_correlated() {
        let engine = CorrelationEngine::new(30, 10);
        // Mirror-image log walks: returns of one are exactly the negation
        // of the other's
        let walk: Vec<f64> = (0..20).map(|i| (i as f64 * 0.7).sin() * 0.05).collect();
        let points_up: Vec<(i64, f64)> = walk
            .iter()
            .enumerate()
            .map(|(i, s)| (i as i64, 100.0 * s.exp()))
            .collect();
        let points_down: Vec<(i64, f64)> = walk
            .iter()
            .enumerate()
            .map(|(i, s)| (i as i64, 100.0 * (-s).exp()))
            .collect();

        let up = series_with("GC=F", &points_up);
        let down = series_with("DX-Y.NYB", &points_down);

        let corr = engine.pair_correlation(&up, &down).unwrap();
        assert!((corr + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_overlap_fails_pair() {
        let engine = CorrelationEngine::new(30, 10);
        // Only 5 shared timestamps
        let a = series_with(
            "GC=F",
            &[(0, 10.0), (1, 11.0), (2, 12.0), (3, 13.0), (4, 14.0)],
        );
        let b = series_with(
            "^TNX",
            &[(0, 10.0), (1, 11.0), (2, 12.0), (3, 13.0), (4, 14.0), (10, 15.0)],
        );

        let result = engine.pair_correlation(&a, &b);
        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientData {
                required: 10,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_matrix_scopes_failures_per_pair() {
        let engine = CorrelationEngine::new(30, 10);
        let primary = wavy("GC=F", 40, 1900.0);
        let good_aux = wavy("DX-Y.NYB", 40, 104.0);
        // Shares only 5 timestamps with the others
        let sparse_aux = series_with("^TNX", &[(0, 4.0), (1, 4.1), (2, 4.2), (3, 4.1), (4, 4.0)]);

        let matrix = engine.matrix(&[&primary, &good_aux, &sparse_aux]);

        assert!(matrix.get("GC=F", "DX-Y.NYB").is_some());
        assert!(matrix.get("GC=F", "^TNX").is_none());
        assert!(matrix.get("DX-Y.NYB", "^TNX").is_none());
    }

    #[test]
    fn test_matrix_lookup_is_symmetric() {
        let engine = CorrelationEngine::new(30, 10);
        let a = wavy("GC=F", 40, 1900.0);
        let b = wavy("DX-Y.NYB", 40, 104.0);

        let matrix = engine.matrix(&[&a, &b]);
        assert_eq!(matrix.get("GC=F", "DX-Y.NYB"), matrix.get("DX-Y.NYB", "GC=F"));
    }

    #[test]
    fn test_coefficients_within_unit_interval() {
        let engine = CorrelationEngine::new(30, 10);
        let a = wavy("GC=F", 40, 1900.0);
        let b = wavy("DX-Y.NYB", 40, 104.0);
        let c = wavy("^TNX", 40, 50.0);

        let matrix = engine.matrix(&[&a, &b, &c]);
        for pair in &matrix.pairs {
            assert!(pair.coefficient >= -1.0 - 1e-12);
            assert!(pair.coefficient <= 1.0 + 1e-12);
        }
    }
}
