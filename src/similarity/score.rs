//! Blended correlation / L1 similarity between two vectors.

use super::error::SimilarityError;

/// Weight of the correlation term.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// `alpha · pearson(a, b) + (1 − alpha) · (1 − ‖a − b‖₁ / 2n)`.
///
/// Symmetric in `a` and `b`. Identical non-constant vectors score 1.
pub fn similarity(a: &[f64], b: &[f64], alpha: f64) -> Result<f64, SimilarityError> {
    check_lengths(a, b)?;
    let n = a.len() as f64;
    let corr = pearson_unchecked(a, b);
    let distance = l1_unchecked(a, b);
    Ok(alpha * corr + (1.0 - alpha) * (1.0 - distance / (2.0 * n)))
}

/// Pearson correlation coefficient; 0 when either vector is constant.
pub fn pearson(a: &[f64], b: &[f64]) -> Result<f64, SimilarityError> {
    check_lengths(a, b)?;
    Ok(pearson_unchecked(a, b))
}

pub fn l1_distance(a: &[f64], b: &[f64]) -> Result<f64, SimilarityError> {
    check_lengths(a, b)?;
    Ok(l1_unchecked(a, b))
}

fn check_lengths(a: &[f64], b: &[f64]) -> Result<(), SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(SimilarityError::EmptyVector);
    }
    Ok(())
}

fn pearson_unchecked(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a <= 0.0 || var_b <= 0.0 {
        return 0.0;
    }
    (cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0)
}

fn l1_unchecked(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}
