//! pagelens-embed
//!
//! Embedding backends and the service that picks one at start-up. The
//! transformer backend is preferred; when it cannot be constructed the
//! always-available hashing backend takes over and the service reports it
//! through `name()`.

pub mod device;
pub mod hashing;
pub mod pool;
pub mod tokenize;
pub mod transformer;

use std::sync::Arc;

use anyhow::Result;

use pagelens_core::config::{BackendPreference, EmbeddingSettings};
use pagelens_core::error::Error;
use pagelens_core::traits::EmbeddingBackend;
use pagelens_core::types::Vector;

pub use hashing::{HashingBackend, HASHING_BACKEND_NAME};
pub use pool::masked_mean_l2;
pub use transformer::TransformerBackend;

/// Holds the backend chosen once at start-up. Cheap to share behind an `Arc`.
#[derive(Clone)]
pub struct EmbeddingService {
    backend: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingService {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    /// Build the backend `settings` ask for, falling back to hashing when the
    /// transformer cannot be constructed under `BackendPreference::Auto`.
    pub fn build_default(settings: &EmbeddingSettings) -> Result<Self> {
        Ok(Self::new(select_backend(settings)?))
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    pub fn dim(&self) -> usize {
        self.backend.dim()
    }

    pub fn backend(&self) -> &Arc<dyn EmbeddingBackend> {
        &self.backend
    }

    /// Encode `texts`, checking the backend kept its contract.
    pub fn encode(&self, texts: &[String]) -> pagelens_core::Result<Vec<Vector>> {
        let vectors = self.backend.encode(texts).map_err(|e| Error::Encoding(format!("{e:#}")))?;
        if vectors.len() != texts.len() {
            return Err(Error::Encoding(format!(
                "backend '{}' returned {} vectors for {} texts",
                self.name(),
                vectors.len(),
                texts.len()
            )));
        }
        let expected = self.dim();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(Error::DimensionMismatch { expected, actual: bad.len() });
        }
        Ok(vectors)
    }

    pub fn encode_query(&self, text: &str) -> pagelens_core::Result<Vector> {
        let mut vectors = self.encode(&[text.to_string()])?;
        Ok(vectors.remove(0))
    }
}

pub fn select_backend(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingBackend>> {
    if use_fake_embeddings() {
        tracing::info!("APP_USE_FAKE_EMBEDDINGS set, using hashing backend");
        return Ok(hashing(settings));
    }
    match settings.backend {
        BackendPreference::Hashing => Ok(hashing(settings)),
        BackendPreference::Transformer => {
            Ok(Arc::new(TransformerBackend::load(&resolve_model_dir(settings), settings.max_len)?))
        }
        BackendPreference::Auto => match TransformerBackend::load(&resolve_model_dir(settings), settings.max_len) {
            Ok(backend) => Ok(Arc::new(backend)),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "transformer backend unavailable, falling back to hashing");
                Ok(hashing(settings))
            }
        },
    }
}

fn hashing(settings: &EmbeddingSettings) -> Arc<dyn EmbeddingBackend> {
    Arc::new(HashingBackend::new(settings.hashing_dim))
}

fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> std::path::PathBuf {
    match std::env::var("APP_MODEL_DIR") {
        Ok(dir) if !dir.is_empty() => pagelens_core::config::expand_path(dir),
        _ => settings.model_path(),
    }
}
