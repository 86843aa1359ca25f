//! Ingestion and query over one document.
//!
//! Query flow: query vector → per-page chunk scores → {page score, passages};
//! page scores → normalize → smooth → normalize → threshold/rank/top-k.

use std::cmp::Ordering;
use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use pagelens_core::config::check_smoothing;
use pagelens_core::error::{Error, Result};
use pagelens_core::types::{DocumentIndex, PageRecord, Passage, QueryOutcome, QueryParams, RankedPage};
use pagelens_embed::EmbeddingService;

use crate::aggregate::aggregate;
use crate::chunker::Chunker;
use crate::normalize::normalize;
use crate::passages::top_passages;
use crate::similarity::score;
use crate::smooth::smooth;

/// Embedding service plus chunker: everything needed to ingest and query.
#[derive(Clone)]
pub struct PageSearch {
    embeddings: EmbeddingService,
    chunker: Chunker,
}

impl PageSearch {
    pub fn new(embeddings: EmbeddingService, chunker: Chunker) -> Self {
        Self { embeddings, chunker }
    }

    pub fn backend_name(&self) -> &str {
        self.embeddings.name()
    }

    pub fn embeddings(&self) -> &EmbeddingService {
        &self.embeddings
    }

    pub fn ingest(&self, name: &str, page_texts: &[String]) -> Result<DocumentIndex> {
        self.ingest_with_progress(name, page_texts, |_| {})
    }

    /// Chunk and encode every page. `on_page` is called with the page number
    /// once that page is encoded, possibly from several threads.
    pub fn ingest_with_progress<F>(&self, name: &str, page_texts: &[String], on_page: F) -> Result<DocumentIndex>
    where
        F: Fn(usize) + Send + Sync,
    {
        let encode_page = |(i, text): (usize, &String)| -> Result<PageRecord> {
            let page = self.encode_page(i + 1, text)?;
            on_page(page.page_number);
            Ok(page)
        };

        #[cfg(feature = "parallel")]
        let pages = page_texts.par_iter().enumerate().map(encode_page).collect::<Result<Vec<_>>>()?;
        #[cfg(not(feature = "parallel"))]
        let pages = page_texts.iter().enumerate().map(encode_page).collect::<Result<Vec<_>>>()?;

        let index = DocumentIndex {
            name: name.to_string(),
            backend: self.embeddings.name().to_string(),
            dim: self.embeddings.dim(),
            pages,
        };
        tracing::info!(
            document = name,
            pages = index.page_count(),
            chunks = index.chunk_count(),
            backend = %index.backend,
            "ingested document"
        );
        Ok(index)
    }

    fn encode_page(&self, page_number: usize, text: &str) -> Result<PageRecord> {
        let chunks = self.chunker.chunk_page(page_number, text);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embeddings.encode(&texts)?;
        Ok(PageRecord { page_number, text: text.to_string(), chunks, vectors })
    }

    /// Score a whole ingested document. Refuses indexes built by a different
    /// backend.
    pub fn query(&self, query_text: &str, document: &DocumentIndex, params: &QueryParams) -> Result<QueryOutcome> {
        if document.is_stale_for(self.embeddings.name()) {
            return Err(Error::BackendMismatch {
                indexed: document.backend.clone(),
                active: self.embeddings.name().to_string(),
            });
        }
        self.query_pages(query_text, &document.pages, params)
    }

    /// Score pages in the given order. Smoothing treats slice neighbours as
    /// page neighbours, so pages must be numbered 1..N in slice order.
    pub fn query_pages(&self, query_text: &str, pages: &[PageRecord], params: &QueryParams) -> Result<QueryOutcome> {
        check_smoothing(params.smoothing)?;
        for (position, page) in pages.iter().enumerate() {
            if page.page_number != position + 1 {
                return Err(Error::PageOutOfOrder { position, page: page.page_number });
            }
            if page.chunks.len() != page.vectors.len() {
                return Err(Error::MisalignedPage {
                    page: page.page_number,
                    chunks: page.chunks.len(),
                    vectors: page.vectors.len(),
                });
            }
        }

        let query_vector = self.embeddings.encode_query(query_text)?;
        let mut chunk_scores = Vec::with_capacity(pages.len());
        let mut passages = Vec::new();
        for page in pages {
            let scores = score(&query_vector, &page.vectors)?;
            passages.extend(top_passages(&page.chunk_texts(), &scores, page.page_number, params.passages_per_page));
            chunk_scores.push(scores);
        }

        let raw_scores = normalize(&aggregate(&chunk_scores, params.aggregation));
        let smoothed_scores = normalize(&smooth(&raw_scores, params.smoothing));
        let top_pages = rank_pages(pages, &smoothed_scores, params.threshold, params.top_k);
        let passages = select_passages(passages, &top_pages, params.top_k.saturating_mul(2));

        tracing::debug!(
            pages = pages.len(),
            hits = top_pages.len(),
            passages = passages.len(),
            backend = self.embeddings.name(),
            "query scored"
        );
        Ok(QueryOutcome {
            raw_scores,
            smoothed_scores,
            top_pages,
            passages,
            backend: self.embeddings.name().to_string(),
        })
    }
}

/// Pages scoring at least `threshold`, best first (ties keep page order),
/// at most `top_k`.
pub fn rank_pages(pages: &[PageRecord], scores: &[f32], threshold: f32, top_k: usize) -> Vec<RankedPage> {
    let mut ranked: Vec<RankedPage> = pages
        .iter()
        .zip(scores)
        .filter(|(_, s)| **s >= threshold)
        .map(|(page, &score)| RankedPage { page: page.page_number, score })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(top_k);
    ranked
}

/// Passages on ranked pages only, best first, at most `limit`.
pub fn select_passages(mut passages: Vec<Passage>, top_pages: &[RankedPage], limit: usize) -> Vec<Passage> {
    let keep: HashSet<usize> = top_pages.iter().map(|p| p.page).collect();
    passages.retain(|p| keep.contains(&p.page));
    passages.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    passages.truncate(limit);
    passages
}
