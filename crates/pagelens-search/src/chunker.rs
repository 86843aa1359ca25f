use pagelens_core::config::{ChunkingSettings, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use pagelens_core::error::{Error, Result};
use pagelens_core::types::Chunk;

/// Splits page text into overlapping fixed-size character windows.
///
/// Windows start every `chunk_size - overlap` characters; the last one may
/// be short. Blank text yields a single empty chunk so every page has at
/// least one chunk to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::InvalidChunking { chunk_size, overlap });
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![String::new()];
        }
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::with_capacity(chars.len().div_ceil(step));
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            start += step;
        }
        chunks
    }

    pub fn chunk_page(&self, page_number: usize, text: &str) -> Vec<Chunk> {
        self.chunk(text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { page_number, index, text })
            .collect()
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP }
    }
}

/// One-shot form of [`Chunker::chunk`].
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(Chunker::new(chunk_size, overlap)?.chunk(text))
}
