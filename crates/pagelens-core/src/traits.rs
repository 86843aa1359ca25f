use crate::types::Vector;

/// Text-to-vector encoder.
///
/// Implementations must return one vector per input, in input order, all of
/// length `dim()` for the lifetime of the backend. `name()` labels stored
/// vectors so an index built by one backend is never scored by another.
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;
    fn dim(&self) -> usize;
    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vector>>;
}
