//! Shared statistics utilities for the analysis engines.
//!
//! All dispersion estimators use the sample (N-1) form. This is a fixed
//! choice: the engines compare band widths against configured thresholds, so
//! the estimator must not silently change between call sites.

/// Per-step log returns ln(p[i] / p[i-1]). Non-positive prices are skipped.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    if prices.len() < 2 {
        return Vec::new();
    }

    let mut returns = Vec::with_capacity(prices.len() - 1);
    for i in 1..prices.len() {
        if prices[i - 1] > 0.0 && prices[i] > 0.0 {
            returns.push((prices[i] / prices[i - 1]).ln());
        }
    }
    returns
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N-1 denominator). Returns 0.0 for fewer than
/// two values, where the estimator is undefined.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Pearson correlation coefficient over two equally-indexed samples.
/// Returns 0.0 when either sample is degenerate (constant or too short).
pub fn pearson_correlation(v1: &[f64], v2: &[f64]) -> f64 {
    let len = v1.len().min(v2.len());
    if len < 2 {
        return 0.0;
    }

    let v1 = &v1[..len];
    let v2 = &v2[..len];

    let mean1 = mean(v1);
    let mean2 = mean(v2);

    let mut numer = 0.0;
    let mut denom1 = 0.0;
    let mut denom2 = 0.0;

    for i in 0..len {
        let diff1 = v1[i] - mean1;
        let diff2 = v2[i] - mean2;
        numer += diff1 * diff2;
        denom1 += diff1 * diff1;
        denom2 += diff2 * diff2;
    }

    if denom1 == 0.0 || denom2 == 0.0 {
        return 0.0;
    }

    numer / (denom1.sqrt() * denom2.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_returns() {
        let prices = vec![100.0, 110.0, 99.0];
        let returns = log_returns(&prices);

        assert_eq!(returns.len(), 2);
        assert!((returns[0] - (1.1f64).ln()).abs() < 1e-12);
        assert!((returns[1] - (0.9f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_returns_short_input() {
        assert!(log_returns(&[100.0]).is_empty());
        assert!(log_returns(&[]).is_empty());
    }

    #[test]
    fn test_mean_and_std_dev() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        // Sample std dev of this classic set is sqrt(32/7)
        assert!((sample_std_dev(&values) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_undefined_below_two() {
        assert_eq!(sample_std_dev(&[1.0]), 0.0);
        assert_eq!(sample_std_dev(&[]), 0.0);
    }

    #[test]
    fn test_pearson_perfectly_correlated() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![2.0, 4.0, 6.0, 8.0];
        assert!((pearson_correlation(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_anti_correlated() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![4.0, 3.0, 2.0, 1.0];
        assert!((pearson_correlation(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate_sample() {
        let a = vec![1.0, 1.0, 1.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(pearson_correlation(&a, &b), 0.0);
    }
}
