use crate::domain::errors::AnalysisError;
use crate::domain::market::timeframe::Timeframe;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A single OHLCV bar. Prices and volume use `Decimal` as delivered by the
/// fetch collaborator; the analysis engines convert to `f64` at their own
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// Typical price (high + low + close) / 3, used for volume bucketing.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }

    fn check(&self) -> Result<(), String> {
        if self.open <= Decimal::ZERO
            || self.high <= Decimal::ZERO
            || self.low <= Decimal::ZERO
            || self.close <= Decimal::ZERO
        {
            return Err("non-positive price component".to_string());
        }
        if self.low > self.high {
            return Err(format!("low {} > high {}", self.low, self.high));
        }
        if self.high < self.open.max(self.close) {
            return Err(format!("high {} below max(open, close)", self.high));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!("low {} above min(open, close)", self.low));
        }
        if self.volume < Decimal::ZERO {
            return Err(format!("negative volume {}", self.volume));
        }
        Ok(())
    }
}

/// Validated, strictly timestamp-ordered bar sequence for one instrument.
///
/// Immutable once constructed: the constructor rejects malformed input so the
/// engines never have to re-check OHLC geometry or ordering. Deliberately not
/// Deserialize; construction must go through `new`.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, AnalysisError> {
        let symbol = symbol.into();

        for (i, bar) in bars.iter().enumerate() {
            bar.check().map_err(|reason| AnalysisError::MalformedSeries {
                symbol: symbol.clone(),
                reason: format!("bar {}: {}", i, reason),
            })?;
        }

        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(AnalysisError::MalformedSeries {
                    symbol,
                    reason: format!(
                        "timestamps not strictly increasing at bar {}: {} -> {}",
                        i + 1,
                        pair[0].timestamp,
                        pair[1].timestamp
                    ),
                });
            }
        }

        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest_close(&self) -> Option<Decimal> {
        self.bars.last().map(|bar| bar.close)
    }

    /// Close prices as f64, in bar order.
    pub fn closes_f64(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|bar| bar.close.to_f64().unwrap_or(0.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn bar(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar {
            timestamp,
            open: Decimal::from_f64(open).unwrap(),
            high: Decimal::from_f64(high).unwrap(),
            low: Decimal::from_f64(low).unwrap(),
            close: Decimal::from_f64(close).unwrap(),
            volume: Decimal::from_f64(volume).unwrap(),
        }
    }

    #[test]
    fn test_valid_series() {
        let series = PriceSeries::new(
            "GC=F",
            Timeframe::OneDay,
            vec![
                bar(1, 1900.0, 1905.0, 1898.0, 1903.0, 1000.0),
                bar(2, 1903.0, 1910.0, 1902.0, 1908.0, 1200.0),
            ],
        )
        .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "GC=F");
        assert_eq!(
            series.latest_close().unwrap(),
            Decimal::from_f64(1908.0).unwrap()
        );
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        let result = PriceSeries::new(
            "GC=F",
            Timeframe::OneDay,
            vec![
                bar(5, 1900.0, 1905.0, 1898.0, 1903.0, 1000.0),
                bar(5, 1903.0, 1910.0, 1902.0, 1908.0, 1200.0),
            ],
        );
        assert!(matches!(
            result,
            Err(AnalysisError::MalformedSeries { .. })
        ));
    }

    #[test]
    fn test_rejects_low_above_high() {
        let result = PriceSeries::new(
            "GC=F",
            Timeframe::OneDay,
            vec![bar(1, 1900.0, 1901.0, 1902.0, 1901.0, 1000.0)],
        );
        assert!(matches!(
            result,
            Err(AnalysisError::MalformedSeries { .. })
        ));
    }

    #[test]
    fn test_rejects_high_below_close() {
        let result = PriceSeries::new(
            "GC=F",
            Timeframe::OneDay,
            vec![bar(1, 1900.0, 1901.0, 1899.0, 1905.0, 1000.0)],
        );
        assert!(matches!(
            result,
            Err(AnalysisError::MalformedSeries { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_volume() {
        let result = PriceSeries::new(
            "GC=F",
            Timeframe::OneDay,
            vec![bar(1, 1900.0, 1905.0, 1898.0, 1903.0, -1.0)],
        );
        assert!(matches!(
            result,
            Err(AnalysisError::MalformedSeries { .. })
        ));
    }

    #[test]
    fn test_typical_price() {
        let b = bar(1, 1900.0, 1906.0, 1897.0, 1903.0, 1000.0);
        assert_eq!(b.typical_price(), Decimal::from_f64(1902.0).unwrap());
    }
}
