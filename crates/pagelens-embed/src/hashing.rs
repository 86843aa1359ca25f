//! Model-free feature-hashing backend.
//!
//! Tokens are lower-cased runs of two or more word characters. Each token is
//! hashed with XxHash64 (seed 0) into one of `dim` buckets, the bucket counts
//! are L2-normalized. Vectors are non-negative, so cosine scores land in [0,1].
//! Text without tokens encodes to the zero vector. The backend is labelled
//! `hashing-<dim>`, since vectors of different widths never compare.

use std::hash::Hasher;

use anyhow::Result;
use twox_hash::XxHash64;

use pagelens_core::traits::EmbeddingBackend;
use pagelens_core::types::Vector;

/// Label prefix; the full name is `hashing-<dim>`.
pub const HASHING_BACKEND_NAME: &str = "hashing";

pub struct HashingBackend {
    dim: usize,
    name: String,
}

impl HashingBackend {
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "hashing dimension must be positive");
        Self { dim, name: format!("{HASHING_BACKEND_NAME}-{dim}") }
    }

    pub fn bucket(&self, token: &str) -> usize {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        (hasher.finish() % self.dim as u64) as usize
    }

    pub fn encode_one(&self, text: &str) -> Vector {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            v[self.bucket(&token)] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

/// Lower-cased tokens of at least two word characters.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().nth(1).is_some())
        .map(str::to_lowercase)
}

impl EmbeddingBackend for HashingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| self.encode_one(t)).collect())
    }
}
