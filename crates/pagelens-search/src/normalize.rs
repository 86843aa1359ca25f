/// Below this spread every page counts as equally relevant.
pub const NORMALIZE_EPSILON: f32 = 1e-8;

/// Min-max rescale into [0,1]. A flat sequence maps to all zeros.
pub fn normalize(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if range < NORMALIZE_EPSILON {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|x| (x - min) / range).collect()
}
