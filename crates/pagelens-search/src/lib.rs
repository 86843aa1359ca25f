//! pagelens-search
//!
//! Scoring pipeline: chunking, similarity, page aggregation, min-max
//! normalization, Gaussian smoothing over page adjacency and passage
//! selection, plus [`PageSearch`] which wires them to an embedding service.

pub mod aggregate;
pub mod chunker;
pub mod normalize;
pub mod passages;
pub mod pipeline;
pub mod similarity;
pub mod smooth;

pub use aggregate::aggregate;
pub use chunker::{chunk_text, Chunker};
pub use normalize::normalize;
pub use passages::top_passages;
pub use pipeline::PageSearch;
pub use similarity::score;
pub use smooth::smooth;
