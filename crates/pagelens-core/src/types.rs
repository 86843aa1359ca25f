//! Domain types shared by the embedding backends, the scoring pipeline and
//! the serving layer.

use serde::{Deserialize, Serialize};

/// Dense embedding. Backends emit L2-normalized vectors.
pub type Vector = Vec<f32>;

/// A fixed-size character window of one page's text.
///
/// `index` is the window's position within its page and is what passages
/// report back, so it must stay positional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub page_number: usize,
    pub index: usize,
    pub text: String,
}

/// One ingested page: its raw text, its chunks and one vector per chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_number: usize,
    pub text: String,
    pub chunks: Vec<Chunk>,
    pub vectors: Vec<Vector>,
}

impl PageRecord {
    pub fn chunk_texts(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }
}

/// Ingested document, labelled with the backend that produced its vectors.
///
/// Pages are ordered by page number, 1..N with no gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentIndex {
    pub name: String,
    pub backend: String,
    pub dim: usize,
    pub pages: Vec<PageRecord>,
}

impl DocumentIndex {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.pages.iter().map(|p| p.chunks.len()).sum()
    }

    /// True when the vectors were produced by a backend other than `active`.
    pub fn is_stale_for(&self, active: &str) -> bool {
        self.backend != active
    }
}

/// How a page's chunk scores collapse into one page score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Max,
    Mean,
}

impl std::str::FromStr for Aggregation {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "mean" => Ok(Self::Mean),
            other => Err(crate::error::Error::InvalidConfig(format!(
                "unknown aggregation '{other}' (expected max or mean)"
            ))),
        }
    }
}

/// Per-query knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Gaussian sigma over page adjacency; `<= 0` disables smoothing.
    pub smoothing: f32,
    pub threshold: f32,
    pub top_k: usize,
    pub aggregation: Aggregation,
    pub passages_per_page: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self { smoothing: 2.0, threshold: 0.0, top_k: 10, aggregation: Aggregation::Max, passages_per_page: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPage {
    pub page: usize,
    pub score: f32,
}

/// A high-scoring chunk rendered for display. Never persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub page: usize,
    pub chunk_index: usize,
    pub score: f32,
    pub snippet: String,
}

/// Everything one query produces.
///
/// `raw_scores` are the aggregated page scores after the first min-max pass,
/// `smoothed_scores` after smoothing and the second pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub raw_scores: Vec<f32>,
    pub smoothed_scores: Vec<f32>,
    pub top_pages: Vec<RankedPage>,
    pub passages: Vec<Passage>,
    pub backend: String,
}
