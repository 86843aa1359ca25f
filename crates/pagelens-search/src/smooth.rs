//! Gaussian smoothing over page adjacency.
//!
//! Edges are padded with the boundary value so first and last pages are not
//! pulled toward zero. Output is not renormalized here.

use pagelens_core::config::MAX_SMOOTHING;

/// `max(1, round(2·sigma))`, with sigma capped at [`MAX_SMOOTHING`].
pub fn kernel_radius(sigma: f32) -> usize {
    (2.0 * sigma.min(MAX_SMOOTHING)).round().max(1.0) as usize
}

/// Symmetric kernel of `2·radius + 1` weights summing to one.
pub fn gaussian_kernel(radius: usize, sigma: f32) -> Vec<f32> {
    let sigma = f64::from(sigma);
    let weights: Vec<f64> = (0..=2 * radius)
        .map(|k| {
            let offset = k as f64 - radius as f64;
            (-0.5 * (offset / sigma).powi(2)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Smooth `scores` with a Gaussian of width `sigma`; `sigma <= 0` (or NaN) is
/// the identity. Sigma above [`MAX_SMOOTHING`] is smoothed as
/// `MAX_SMOOTHING`.
pub fn smooth(scores: &[f32], sigma: f32) -> Vec<f32> {
    if sigma.is_nan() || sigma <= 0.0 || scores.is_empty() {
        return scores.to_vec();
    }
    let sigma = sigma.min(MAX_SMOOTHING);
    let radius = kernel_radius(sigma);
    let kernel = gaussian_kernel(radius, sigma);
    let first = scores[0];
    let last = scores[scores.len() - 1];
    let padded: Vec<f32> = std::iter::repeat(first)
        .take(radius)
        .chain(scores.iter().copied())
        .chain(std::iter::repeat(last).take(radius))
        .collect();
    padded
        .windows(kernel.len())
        .map(|window| window.iter().zip(&kernel).map(|(x, w)| x * w).sum::<f32>())
        .collect()
}
