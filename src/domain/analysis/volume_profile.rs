use crate::domain::errors::AnalysisError;
use crate::domain::market::bar::{Bar, PriceSeries};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// One contiguous price interval of the profile: [lower, upper).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBucket {
    pub lower: f64,
    pub upper: f64,
    pub volume: f64,
}

impl PriceBucket {
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Volume-by-price distribution over a profiling window.
///
/// The VPOC is the bucket with the highest accumulated volume; the value area
/// is the contiguous range anchored at the VPOC holding at least the
/// configured share of total volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub buckets: Vec<PriceBucket>,
    pub vpoc_index: usize,
    pub vpoc_price: f64,
    pub value_area_low: f64,
    pub value_area_high: f64,
    pub value_area_volume_share: f64,
    pub total_volume: f64,
}

impl VolumeProfile {
    pub fn value_area_width(&self) -> f64 {
        self.value_area_high - self.value_area_low
    }
}

/// Bucketizes a series by volume at typical price.
///
/// Each bar's entire volume is assigned to the single bucket containing its
/// typical price (high + low + close) / 3. No range-proportional splitting.
pub struct VolumeProfileBuilder {
    bucket_count: usize,
    value_area_threshold: f64,
}

impl VolumeProfileBuilder {
    pub fn new(bucket_count: usize, value_area_threshold: f64) -> Self {
        Self {
            bucket_count: bucket_count.max(1),
            value_area_threshold,
        }
    }

    pub fn build(&self, series: &PriceSeries) -> Result<VolumeProfile, AnalysisError> {
        self.build_bars(series.symbol(), series.bars())
    }

    /// Profiles an arbitrary bar slice. Used by the regime classifier for
    /// sub-window VPOC tracking; tie-breaks anchor to the slice's last close.
    pub(crate) fn build_bars(
        &self,
        symbol: &str,
        bars: &[Bar],
    ) -> Result<VolumeProfile, AnalysisError> {
        if bars.is_empty() {
            return Err(AnalysisError::InsufficientData {
                what: "volume profile",
                required: 1,
                actual: 0,
            });
        }

        let min_low = bars
            .iter()
            .map(|b| b.low.to_f64().unwrap_or(0.0))
            .fold(f64::INFINITY, f64::min);
        let max_high = bars
            .iter()
            .map(|b| b.high.to_f64().unwrap_or(0.0))
            .fold(f64::NEG_INFINITY, f64::max);
        let latest_close = bars
            .last()
            .expect("bars verified non-empty above")
            .close
            .to_f64()
            .unwrap_or(0.0);

        // A flat price range collapses to one effective bucket.
        let effective_count = if max_high > min_low {
            self.bucket_count
        } else {
            1
        };
        let width = (max_high - min_low) / effective_count as f64;

        let mut buckets: Vec<PriceBucket> = (0..effective_count)
            .map(|i| PriceBucket {
                lower: min_low + width * i as f64,
                upper: if i + 1 == effective_count {
                    max_high
                } else {
                    min_low + width * (i + 1) as f64
                },
                volume: 0.0,
            })
            .collect();

        let mut total_volume = 0.0;
        for bar in bars {
            let typical = bar.typical_price().to_f64().unwrap_or(0.0);
            let volume = bar.volume.to_f64().unwrap_or(0.0);
            let index = if width > 0.0 {
                (((typical - min_low) / width).floor() as usize).min(effective_count - 1)
            } else {
                0
            };
            buckets[index].volume += volume;
            total_volume += volume;
        }

        if total_volume <= 0.0 {
            return Err(AnalysisError::ZeroVolume {
                symbol: symbol.to_string(),
            });
        }

        let vpoc_index = Self::select_vpoc(&buckets, latest_close);
        let (area_low_index, area_high_index, area_volume) =
            self.expand_value_area(&buckets, vpoc_index, total_volume, latest_close);

        Ok(VolumeProfile {
            vpoc_price: buckets[vpoc_index].midpoint(),
            vpoc_index,
            value_area_low: buckets[area_low_index].lower,
            value_area_high: buckets[area_high_index].upper,
            value_area_volume_share: area_volume / total_volume,
            total_volume,
            buckets,
        })
    }

    /// Max-volume bucket; ties resolve to the bucket nearest the latest close.
    fn select_vpoc(buckets: &[PriceBucket], latest_close: f64) -> usize {
        let mut best = 0;
        for (i, bucket) in buckets.iter().enumerate().skip(1) {
            let closer = (bucket.midpoint() - latest_close).abs()
                < (buckets[best].midpoint() - latest_close).abs();
            if bucket.volume > buckets[best].volume
                || (bucket.volume == buckets[best].volume && closer)
            {
                best = i;
            }
        }
        best
    }

    /// Grows the area from the VPOC, absorbing the heavier adjacent bucket
    /// each step (ties to the side nearer the latest close), until the
    /// absorbed share reaches the threshold or the range is exhausted.
    fn expand_value_area(
        &self,
        buckets: &[PriceBucket],
        vpoc_index: usize,
        total_volume: f64,
        latest_close: f64,
    ) -> (usize, usize, f64) {
        let mut low = vpoc_index;
        let mut high = vpoc_index;
        let mut area_volume = buckets[vpoc_index].volume;

        while area_volume / total_volume < self.value_area_threshold
            && (low > 0 || high + 1 < buckets.len())
        {
            let below = low.checked_sub(1).map(|i| &buckets[i]);
            let above = if high + 1 < buckets.len() {
                Some(&buckets[high + 1])
            } else {
                None
            };

            let take_below = match (below, above) {
                (Some(b), Some(a)) => {
                    if b.volume != a.volume {
                        b.volume > a.volume
                    } else {
                        (b.midpoint() - latest_close).abs() <= (a.midpoint() - latest_close).abs()
                    }
                }
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };

            if take_below {
                low -= 1;
                area_volume += buckets[low].volume;
            } else {
                high += 1;
                area_volume += buckets[high].volume;
            }
        }

        (low, high, area_volume)
    }
}
