use pagelens_core::types::Aggregation;

/// Collapse each page's chunk scores into one page score, keeping page order.
pub fn aggregate(per_page_chunk_scores: &[Vec<f32>], mode: Aggregation) -> Vec<f32> {
    per_page_chunk_scores.iter().map(|scores| page_score(scores, mode)).collect()
}

/// A page with no chunk scores scores `0.0`.
pub fn page_score(scores: &[f32], mode: Aggregation) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }
    match mode {
        Aggregation::Max => scores.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        Aggregation::Mean => scores.iter().sum::<f32>() / scores.len() as f32,
    }
}
