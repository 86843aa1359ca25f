use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pagelens_core::traits::EmbeddingBackend;
use pagelens_core::types::{Aggregation, Chunk, PageRecord, QueryParams, Vector};
use pagelens_core::Error;
use pagelens_embed::{EmbeddingService, HashingBackend};
use pagelens_search::{Chunker, PageSearch};

/// Maps text onto three axes by keyword, so scores are easy to predict.
struct KeywordBackend;

impl EmbeddingBackend for KeywordBackend {
    fn name(&self) -> &str {
        "keyword-stub"
    }

    fn dim(&self) -> usize {
        3
    }

    fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vector>> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![
                    t.matches("alpha").count() as f32,
                    t.matches("beta").count() as f32,
                    t.matches("gamma").count() as f32,
                ];
                let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    v.iter_mut().for_each(|x| *x /= norm);
                }
                v
            })
            .collect())
    }
}

fn keyword_search(chunker: Chunker) -> PageSearch {
    PageSearch::new(EmbeddingService::new(Arc::new(KeywordBackend)), chunker)
}

fn hashing_search() -> PageSearch {
    PageSearch::new(EmbeddingService::new(Arc::new(HashingBackend::new(384))), Chunker::default())
}

fn pages(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| (*t).to_string()).collect()
}

#[test]
fn medical_page_outranks_cooking_page() {
    let search = hashing_search();
    let doc = search
        .ingest(
            "sample",
            &pages(&[
                "This page discusses machine learning for medical diagnosis.",
                "This section explains cooking recipes and ingredients.",
            ]),
        )
        .unwrap();
    assert_eq!(doc.backend, "hashing-384");

    let params = QueryParams { smoothing: 1.0, threshold: 0.0, top_k: 2, ..QueryParams::default() };
    let outcome = search.query("medical model", &doc, &params).unwrap();

    assert_eq!(outcome.backend, "hashing-384");
    assert_eq!(outcome.smoothed_scores.len(), 2);
    assert_eq!(outcome.top_pages[0].page, 1);
    let pos = |page: usize| outcome.top_pages.iter().position(|p| p.page == page);
    assert!(pos(2).map_or(true, |p2| pos(1) < Some(p2)));
    assert!(outcome.passages.iter().any(|p| p.page == 1 && p.snippet.contains("medical")));
}

#[test]
fn ingestion_keeps_page_and_chunk_order() {
    let search = keyword_search(Chunker::new(5, 1).unwrap());
    let texts: Vec<String> = (1..=12).map(|i| format!("page {i} alpha beta")).collect();
    let seen = AtomicUsize::new(0);
    let doc = search
        .ingest_with_progress("ordered", &texts, |_| {
            seen.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();

    assert_eq!(seen.load(Ordering::Relaxed), 12);
    assert_eq!(doc.dim, 3);
    for (i, page) in doc.pages.iter().enumerate() {
        assert_eq!(page.page_number, i + 1);
        assert_eq!(page.text, texts[i]);
        assert_eq!(page.chunks.len(), page.vectors.len());
        let indices: Vec<usize> = page.chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, (0..page.chunks.len()).collect::<Vec<_>>());
        assert!(page.chunks.iter().all(|c| c.page_number == i + 1));
    }
}

#[test]
fn blank_page_still_gets_one_chunk_and_scores_zero() {
    let search = keyword_search(Chunker::default());
    let doc = search.ingest("blanks", &pages(&["alpha", "   ", "beta"])).unwrap();
    assert_eq!(doc.pages[1].chunks.len(), 1);
    assert_eq!(doc.pages[1].chunks[0].text, "");

    let params = QueryParams { smoothing: 0.0, ..QueryParams::default() };
    let outcome = search.query("alpha", &doc, &params).unwrap();
    assert_eq!(outcome.raw_scores, vec![1.0, 0.0, 0.0]);
}

#[test]
fn threshold_and_top_k_filter_ranked_pages() {
    let search = keyword_search(Chunker::default());
    let doc = search
        .ingest("filter", &pages(&["alpha alpha", "alpha beta", "beta", "gamma", "alpha gamma gamma"]))
        .unwrap();

    let params = QueryParams { smoothing: 0.0, threshold: 0.5, top_k: 2, ..QueryParams::default() };
    let outcome = search.query("alpha", &doc, &params).unwrap();

    assert_eq!(outcome.top_pages.len(), 2);
    assert_eq!(outcome.top_pages[0].page, 1);
    assert_eq!(outcome.top_pages[1].page, 2);
    assert!(outcome.top_pages.iter().all(|p| p.score >= 0.5));
    for pair in outcome.top_pages.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert!(outcome.passages.len() <= 4);
    assert!(outcome.passages.iter().all(|p| p.page == 1 || p.page == 2));
}

#[test]
fn passages_are_capped_at_twice_top_k() {
    let search = keyword_search(Chunker::new(10, 0).unwrap());
    let text = "alpha one alpha two alpha three alpha four";
    let doc = search.ingest("cap", &pages(&[text, text, text])).unwrap();

    let params = QueryParams { smoothing: 0.0, top_k: 1, passages_per_page: 5, ..QueryParams::default() };
    let outcome = search.query("alpha", &doc, &params).unwrap();
    // All pages tie at zero after normalization, so the first page wins.
    assert_eq!(outcome.top_pages.len(), 1);
    assert_eq!(outcome.top_pages[0].page, 1);
    assert_eq!(outcome.passages.len(), 2);
    assert!(outcome.passages.iter().all(|p| p.page == 1));
}

#[test]
fn smoothing_lifts_neighbours_of_a_strong_page() {
    let search = keyword_search(Chunker::default());
    let doc = search.ingest("smooth", &pages(&["beta", "beta", "alpha", "beta", "beta", "beta", "beta"])).unwrap();

    let sharp = search.query("alpha", &doc, &QueryParams { smoothing: 0.0, ..QueryParams::default() }).unwrap();
    assert_eq!(sharp.smoothed_scores, sharp.raw_scores);
    assert_eq!(sharp.smoothed_scores[1], 0.0);

    let smoothed = search.query("alpha", &doc, &QueryParams { smoothing: 1.0, ..QueryParams::default() }).unwrap();
    assert_eq!(smoothed.raw_scores, sharp.raw_scores);
    assert!((smoothed.smoothed_scores[2] - 1.0).abs() < 1e-6, "renormalized peak is 1");
    assert!(smoothed.smoothed_scores[1] > 0.0 && smoothed.smoothed_scores[3] > 0.0);
    assert!(smoothed.smoothed_scores[1] > smoothed.smoothed_scores[0]);
    assert!(smoothed.smoothed_scores.iter().all(|s| (0.0..=1.0).contains(s)));
}

#[test]
fn mean_aggregation_rewards_consistent_pages() {
    let search = keyword_search(Chunker::new(6, 0).unwrap());
    // Page 1: one alpha chunk among betas. Page 2: alpha throughout.
    let doc = search.ingest("mean", &pages(&["alpha beta  beta  ", "alpha alpha alpha "])).unwrap();

    let max = QueryParams { smoothing: 0.0, aggregation: Aggregation::Max, ..QueryParams::default() };
    let mean = QueryParams { aggregation: Aggregation::Mean, ..max.clone() };
    let by_max = search.query("alpha", &doc, &max).unwrap();
    let by_mean = search.query("alpha", &doc, &mean).unwrap();
    assert_eq!(by_max.raw_scores, vec![0.0, 0.0], "both pages contain a perfect chunk");
    assert_eq!(by_mean.top_pages[0].page, 2);
}

#[test]
fn index_from_another_backend_is_rejected() {
    let doc = keyword_search(Chunker::default()).ingest("stub", &pages(&["alpha"])).unwrap();
    let err = hashing_search().query("alpha", &doc, &QueryParams::default()).unwrap_err();
    assert!(matches!(err, Error::BackendMismatch { ref indexed, .. } if indexed == "keyword-stub"));
}

#[test]
fn mismatched_vector_dimensions_fail_the_query() {
    let search = keyword_search(Chunker::default());
    let page = PageRecord {
        page_number: 1,
        text: "alpha".into(),
        chunks: vec![Chunk { page_number: 1, index: 0, text: "alpha".into() }],
        vectors: vec![vec![1.0, 0.0]],
    };
    let err = search.query_pages("alpha", &[page], &QueryParams::default()).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
}

#[test]
fn pages_without_matching_vectors_are_rejected() {
    let search = keyword_search(Chunker::default());
    let page = PageRecord { page_number: 1, text: "alpha".into(), chunks: vec![], vectors: vec![vec![1.0, 0.0, 0.0]] };
    let err = search.query_pages("alpha", &[page], &QueryParams::default()).unwrap_err();
    assert!(matches!(err, Error::MisalignedPage { page: 1, chunks: 0, vectors: 1 }));
}

#[test]
fn empty_document_yields_empty_outcome() {
    let search = keyword_search(Chunker::default());
    let outcome = search.query_pages("alpha", &[], &QueryParams::default()).unwrap();
    assert!(outcome.raw_scores.is_empty());
    assert!(outcome.top_pages.is_empty());
    assert!(outcome.passages.is_empty());
    assert_eq!(outcome.backend, "keyword-stub");
}

#[test]
fn unbounded_top_k_returns_every_page() {
    let search = hashing_search();
    let doc = search.ingest("all", &pages(&["medical notes", "cooking notes", "medical cooking"])).unwrap();
    let params = QueryParams { top_k: usize::MAX, ..QueryParams::default() };
    let outcome = search.query("medical", &doc, &params).unwrap();
    assert_eq!(outcome.top_pages.len(), 3);
    assert!(outcome.passages.len() <= 6);
}

#[test]
fn reordered_pages_are_rejected() {
    let search = hashing_search();
    let mut doc = search.ingest("swapped", &pages(&["medical", "cooking", "cooking", "medical"])).unwrap();
    let params = QueryParams { smoothing: 1.0, ..QueryParams::default() };

    let ordered = search.query("medical", &doc, &params).unwrap();
    let s = &ordered.smoothed_scores;
    assert!((s[0] - s[3]).abs() < 1e-6 && (s[1] - s[2]).abs() < 1e-6, "symmetric series: {s:?}");

    doc.pages.swap(1, 3);
    let err = search.query("medical", &doc, &params).unwrap_err();
    assert!(matches!(err, Error::PageOutOfOrder { position: 1, page: 4 }));
}

#[test]
fn gaps_in_page_numbering_are_rejected() {
    let search = hashing_search();
    let mut doc = search.ingest("gap", &pages(&["medical", "cooking", "recipes"])).unwrap();
    doc.pages.remove(1);
    let err = search.query("medical", &doc, &QueryParams::default()).unwrap_err();
    assert!(matches!(err, Error::PageOutOfOrder { position: 1, page: 3 }));
}

#[test]
fn absurd_smoothing_is_a_query_error() {
    let search = hashing_search();
    let doc = search.ingest("wide", &pages(&["medical", "cooking"])).unwrap();
    for sigma in [1e30, f32::INFINITY, f32::NAN] {
        let params = QueryParams { smoothing: sigma, ..QueryParams::default() };
        let err = search.query("medical", &doc, &params).unwrap_err();
        assert!(matches!(err, Error::InvalidSmoothing(_)), "sigma {sigma}: {err}");
    }
}

#[test]
fn index_from_another_hashing_width_is_rejected() {
    let narrow = PageSearch::new(EmbeddingService::new(Arc::new(HashingBackend::new(64))), Chunker::default());
    let doc = narrow.ingest("narrow", &pages(&["medical"])).unwrap();
    let err = hashing_search().query("medical", &doc, &QueryParams::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::BackendMismatch { ref indexed, ref active } if indexed == "hashing-64" && active == "hashing-384"
    ));
}
