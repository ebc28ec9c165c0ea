use std::sync::Arc;

use ndarray::{Array2, ArrayView2};
use rustfft::{Fft, FftPlanner, num_complex::Complex};

use super::error::AnalysisError;

/// Planned forward FFT for square fields of a fixed side length.
pub(crate) struct FftPlan2d {
    len: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl FftPlan2d {
    pub(crate) fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            len,
            fft: planner.plan_fft_forward(len),
        }
    }

    /// Squared magnitude of the 2D DFT of `field`, in unshifted layout.
    pub(crate) fn power_spectrum(&self, field: ArrayView2<f64>) -> Result<Array2<f64>, AnalysisError> {
        let (rows, cols) = field.dim();
        if rows != self.len || cols != self.len {
            return Err(AnalysisError::DimensionMismatch {
                expected: self.len * self.len,
                actual: rows * cols,
            });
        }
        let n = self.len;
        let mut data: Vec<Complex<f64>> = field.iter().map(|&v| Complex::new(v, 0.0)).collect();
        for row in data.chunks_exact_mut(n) {
            self.fft.process(row);
        }
        let mut column = vec![Complex::new(0.0, 0.0); n];
        for col in 0..n {
            for row in 0..n {
                column[row] = data[row * n + col];
            }
            self.fft.process(&mut column);
            for row in 0..n {
                data[row * n + col] = column[row];
            }
        }
        let power = data.iter().map(|c| c.norm_sqr()).collect();
        Array2::from_shape_vec((n, n), power).map_err(|_| AnalysisError::DimensionMismatch {
            expected: n * n,
            actual: data.len(),
        })
    }
}

/// Move the zero-frequency term to the center (numpy `fftshift`).
pub(crate) fn fft_shift(spectrum: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = spectrum.dim();
    let (half_r, half_c) = (rows / 2, cols / 2);
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        spectrum[((r + rows - half_r) % rows, (c + cols - half_c) % cols)]
    })
}
