//! Kernels and the weighted neighbourhood mean shared by the filter stages.
//!
//! Filtering runs through `imageproc::filter::separable_filter_equal` on an
//! `f32` copy of the frame, so sums are rounded once instead of truncated per
//! pass. Out-of-frame taps replicate the nearest edge pixel.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;

/// Single-channel image of unrounded filter sums.
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Normalised 1-D Gaussian weights of odd length `size`.
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let half = (size / 2) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Uniform 1-D weights of length `size`.
pub fn box_kernel(size: u32) -> Vec<f32> {
    vec![1.0 / size as f32; size as usize]
}

/// Apply `kernel` along x, then along y, returning unrounded sums.
pub fn weighted_mean(image: &GrayImage, kernel: &[f32]) -> FloatImage {
    let float: FloatImage = ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        Luma([f32::from(image.get_pixel(x, y)[0])])
    });
    separable_filter_equal(&float, kernel)
}

/// Round filter sums back into bytes.
pub fn round_to_gray(image: &FloatImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([saturate_u8(image.get_pixel(x, y)[0])])
    })
}

/// Round to nearest and saturate into a byte.
pub fn saturate_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
