use std::cmp::Ordering;

use pagelens_core::types::Passage;

pub const SNIPPET_CHARS: usize = 220;

/// Best `top_n` chunks of one page by raw score, highest first. Equal scores
/// keep chunk order.
pub fn top_passages<S: AsRef<str>>(chunks: &[S], chunk_scores: &[f32], page_number: usize, top_n: usize) -> Vec<Passage> {
    let mut order: Vec<usize> = (0..chunk_scores.len().min(chunks.len())).collect();
    order.sort_by(|&a, &b| chunk_scores[b].partial_cmp(&chunk_scores[a]).unwrap_or(Ordering::Equal));
    order
        .into_iter()
        .take(top_n)
        .map(|idx| Passage {
            page: page_number,
            chunk_index: idx,
            score: chunk_scores[idx],
            snippet: snippet(chunks[idx].as_ref()),
        })
        .collect()
}

/// Newlines become spaces; hard cut at `SNIPPET_CHARS` characters.
pub fn snippet(text: &str) -> String {
    text.chars().map(|c| if c == '\n' { ' ' } else { c }).take(SNIPPET_CHARS).collect()
}
