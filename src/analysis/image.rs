//! Conversion of 8-bit RGB photos into CIE Lab / LCh planes.

use image::RgbImage;
use ndarray::{Array2, ArrayView2, s};
use palette::{FromColor, Lab, Lch, Srgb};

use super::error::AnalysisError;

/// A photo in perceptual coordinates (D65 white point), one plane per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptualImage {
    lightness: Array2<f64>,
    a: Array2<f64>,
    b: Array2<f64>,
    chroma: Array2<f64>,
}

impl PerceptualImage {
    /// Convert an sRGB image pixel by pixel.
    pub fn from_rgb(image: &RgbImage) -> Result<Self, AnalysisError> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        if width == 0 || height == 0 {
            return Err(AnalysisError::EmptyImage);
        }
        let mut lightness = Array2::<f64>::zeros((height, width));
        let mut a = Array2::<f64>::zeros((height, width));
        let mut b = Array2::<f64>::zeros((height, width));
        let mut chroma = Array2::<f64>::zeros((height, width));
        for (x, y, pixel) in image.enumerate_pixels() {
            let rgb = Srgb::new(pixel[0], pixel[1], pixel[2]).into_format::<f32>();
            let lab: Lab = Lab::from_color(rgb);
            let lch: Lch = Lch::from_color(lab);
            let idx = (y as usize, x as usize);
            lightness[idx] = f64::from(lab.l);
            a[idx] = f64::from(lab.a);
            b[idx] = f64::from(lab.b);
            chroma[idx] = f64::from(lch.chroma);
        }
        Ok(Self {
            lightness,
            a,
            b,
            chroma,
        })
    }

    /// Build from precomputed Lab planes; chroma is derived as `√(a² + b²)`.
    pub fn from_lab_planes(
        lightness: Array2<f64>,
        a: Array2<f64>,
        b: Array2<f64>,
    ) -> Result<Self, AnalysisError> {
        let dim = lightness.dim();
        if dim.0 == 0 || dim.1 == 0 {
            return Err(AnalysisError::EmptyImage);
        }
        for plane in [&a, &b] {
            if plane.dim() != dim {
                return Err(AnalysisError::DimensionMismatch {
                    expected: dim.0 * dim.1,
                    actual: plane.len(),
                });
            }
        }
        let chroma = Array2::from_shape_fn(dim, |idx| a[idx].hypot(b[idx]));
        Ok(Self {
            lightness,
            a,
            b,
            chroma,
        })
    }

    /// `(height, width)` in pixels.
    pub fn dim(&self) -> (usize, usize) {
        self.lightness.dim()
    }

    pub fn lightness(&self) -> ArrayView2<'_, f64> {
        self.lightness.view()
    }

    /// Green–red opponent channel.
    pub fn a(&self) -> ArrayView2<'_, f64> {
        self.a.view()
    }

    /// Blue–yellow opponent channel.
    pub fn b(&self) -> ArrayView2<'_, f64> {
        self.b.view()
    }

    pub fn chroma(&self) -> ArrayView2<'_, f64> {
        self.chroma.view()
    }

    /// Square center crop of the lightness plane.
    ///
    /// Images smaller than `size` in either dimension are rejected; padding is
    /// split with the extra pixel going to the bottom/right.
    pub fn center_crop_lightness(&self, size: usize) -> Result<ArrayView2<'_, f64>, AnalysisError> {
        let (height, width) = self.dim();
        if height < size || width < size {
            return Err(AnalysisError::InvalidImageSize {
                width,
                height,
                required: size,
            });
        }
        let top = (height - size) / 2;
        let left = (width - size) / 2;
        Ok(self
            .lightness
            .slice(s![top..top + size, left..left + size]))
    }
}
