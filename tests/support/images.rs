use image::{Rgb, RgbImage};

pub fn solid(size: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(size, size, Rgb(color))
}

/// Diagonal sinusoidal stripes around mid grey.
pub fn stripes(size: u32, period: f32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        let phase = (x as f32 + 0.5 * y as f32) * std::f32::consts::TAU / period;
        let v = (128.0 + 100.0 * phase.sin()).round() as u8;
        Rgb([v, v, v])
    })
}

/// Left half one color, right half another.
pub fn two_tone(size: u32, left: [u8; 3], right: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(size, size, |x, _| {
        if x < size / 2 { Rgb(left) } else { Rgb(right) }
    })
}
