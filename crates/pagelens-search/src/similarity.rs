use pagelens_core::error::{Error, Result};
use pagelens_core::types::Vector;

/// Dot product of `query` with every row of `chunk_vectors`.
///
/// Vectors are unit length already, so this is cosine similarity. Rows are
/// not renormalized. Any row whose length differs from the query's fails
/// the whole call.
pub fn score(query: &[f32], chunk_vectors: &[Vector]) -> Result<Vec<f32>> {
    chunk_vectors
        .iter()
        .map(|row| {
            if row.len() != query.len() {
                return Err(Error::DimensionMismatch { expected: query.len(), actual: row.len() });
            }
            Ok(dot(query, row))
        })
        .collect()
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
