use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid chunking: overlap {overlap} must be smaller than chunk size {chunk_size}")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Backend mismatch: index built with '{indexed}', active backend is '{active}'")]
    BackendMismatch { indexed: String, active: String },

    #[error("Page {page} has {chunks} chunks but {vectors} vectors")]
    MisalignedPage { page: usize, chunks: usize, vectors: usize },

    #[error("Page at position {position} is numbered {page}; pages must be numbered 1..N in order")]
    PageOutOfOrder { position: usize, page: usize },

    #[error("Invalid smoothing sigma {0}: must be finite and at most {max}", max = crate::config::MAX_SMOOTHING)]
    InvalidSmoothing(f32),

    #[error("Encoding failed: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, Error>;
