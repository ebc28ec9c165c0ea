use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Distribution statistics of the lightness channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LuminanceStats {
    /// 99th percentile, a robust stand-in for the maximum.
    pub p99: f64,
    /// 1st percentile, a robust stand-in for the minimum.
    pub p1: f64,
    pub mean: f64,
    pub variance: f64,
    pub skewness: f64,
    /// Excess kurtosis (normal distribution is 0).
    pub kurtosis: f64,
}

pub fn compute_luminance_stats(lightness: ArrayView2<f64>) -> LuminanceStats {
    let mut values: Vec<f64> = lightness.iter().copied().collect();
    if values.is_empty() {
        return LuminanceStats {
            p99: 0.0,
            p1: 0.0,
            mean: 0.0,
            variance: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
        };
    }
    values.sort_by(f64::total_cmp);
    let p99 = percentile_sorted(&values, 99.0);
    let p1 = percentile_sorted(&values, 1.0);

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values[0] == values[values.len() - 1] {
        return LuminanceStats {
            p99,
            p1,
            mean: values[0],
            variance: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
        };
    }

    let (mut m2, mut m3, mut m4) = (0.0_f64, 0.0_f64, 0.0_f64);
    for &v in &values {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    let variance = m2 / n;
    let (skewness, kurtosis) = if variance > 0.0 {
        (
            (m3 / n) / variance.powf(1.5),
            (m4 / n) / (variance * variance) - 3.0,
        )
    } else {
        (0.0, 0.0)
    };
    LuminanceStats {
        p99,
        p1,
        mean,
        variance,
        skewness,
        kurtosis,
    }
}

/// Linear-interpolated percentile of an ascending slice (numpy's default method).
fn percentile_sorted(sorted: &[f64], percent: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (percent / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
