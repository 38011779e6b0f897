//! Similarity matcher: brute-force cosine scan over every stored article.
//!
//! ```text
//! query ─► Encoder ─► q
//!                     │
//! ArticleStore::scan_all ─► [v₁, v₂, …] ─► cos(q, vᵢ) ─► running max (strict >)
//!                                                        │
//!                                        score > threshold ? Some(match) : None
//! ```
//!
//! The scan is O(n·D) per query with no index. `ArticleRetriever` is the seam
//! where an approximate-nearest-neighbor index would plug in.

use async_trait::async_trait;
use lexadvisor_core::error::{LexError, Result};
use lexadvisor_core::traits::{ArticleStore, Encoder};
use lexadvisor_core::types::{Article, MatchResult};
use std::sync::Arc;

/// Finds the single best article for a query, or `None` when nothing clears
/// the admission threshold.
#[async_trait]
pub trait ArticleRetriever: Send + Sync {
    async fn find_best_match(&self, query_text: &str) -> Result<Option<MatchResult>>;
}

/// Cosine similarity `(a·b) / (‖a‖·‖b‖)`, computed and returned in f64.
///
/// The score is never narrowed to f32, so a score just above the threshold
/// stays above it.
/// Zero-norm input yields NaN, exactly like the textbook formula; callers
/// must treat non-finite scores as unscorable.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    // sqrt of the product keeps identical vectors at exactly 1.0
    dot / (norm_a * norm_b).sqrt()
}

/// Admission policy: strictly greater than the threshold.
pub fn admits(score: f64, threshold: f64) -> bool {
    score > threshold
}

/// Counters from one scan, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Records returned by the store.
    pub candidates: usize,
    /// Records that produced a finite score.
    pub scored: usize,
    /// Records whose score was undefined (zero norm, NaN/∞ values).
    pub degenerate: usize,
    /// Records that could not be scored at all (undecodable, wrong dimension).
    pub faulted: usize,
}

impl ScanStats {
    /// Every candidate faulted: the scan learned nothing about the corpus.
    pub fn all_faulted(&self) -> bool {
        self.candidates > 0 && self.faulted == self.candidates
    }
}

/// Best candidate before the admission threshold is applied.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub best: Option<MatchResult>,
    pub stats: ScanStats,
}

/// Score every candidate against `query` and keep the maximum.
///
/// Ties keep the first-encountered candidate. Faulty and degenerate
/// candidates are skipped and counted; they never touch the running maximum.
pub fn select_best(query: &[f32], candidates: Vec<Result<Article>>) -> ScanOutcome {
    let mut stats = ScanStats {
        candidates: candidates.len(),
        ..Default::default()
    };
    let mut best: Option<MatchResult> = None;

    for candidate in candidates {
        let article = match candidate {
            Ok(article) => article,
            Err(e) => {
                tracing::warn!("⚠️ Skipping unreadable article: {e}");
                stats.faulted += 1;
                continue;
            }
        };

        if article.embedding.len() != query.len() {
            tracing::warn!(
                "⚠️ Skipping article {}: embedding has {} dims, query has {}",
                article.article_num,
                article.embedding.len(),
                query.len()
            );
            stats.faulted += 1;
            continue;
        }

        let score = cosine_similarity(query, &article.embedding);
        if !score.is_finite() {
            tracing::debug!("Article {} has an undefined score, ignored", article.article_num);
            stats.degenerate += 1;
            continue;
        }
        stats.scored += 1;

        let better = best.as_ref().is_none_or(|b| score > b.score);
        if better {
            best = Some(MatchResult { article, score });
        }
    }

    ScanOutcome { best, stats }
}

/// Linear-scan retriever over an `ArticleStore`.
pub struct BruteForceRetriever {
    encoder: Arc<dyn Encoder>,
    store: Arc<dyn ArticleStore>,
    threshold: f64,
}

impl BruteForceRetriever {
    pub fn new(encoder: Arc<dyn Encoder>, store: Arc<dyn ArticleStore>, threshold: f64) -> Self {
        tracing::info!(
            "🎯 Brute-force retriever over {} (threshold > {threshold})",
            store.name()
        );
        Self {
            encoder,
            store,
            threshold,
        }
    }
}

#[async_trait]
impl ArticleRetriever for BruteForceRetriever {
    async fn find_best_match(&self, query_text: &str) -> Result<Option<MatchResult>> {
        let query = self.encoder.embed(query_text).await.map_err(|e| {
            tracing::error!("❌ Query encoding failed ({}): {e}", self.encoder.name());
            match e {
                LexError::EncodingUnavailable(_) => e,
                other => LexError::EncodingUnavailable(other.to_string()),
            }
        })?;

        let candidates = self.store.scan_all().await.map_err(|e| {
            tracing::error!("❌ Article scan failed ({}): {e}", self.store.name());
            match e {
                LexError::RetrievalUnavailable(_) => e,
                other => LexError::RetrievalUnavailable(other.to_string()),
            }
        })?;

        let ScanOutcome { best, stats } = select_best(&query, candidates);
        tracing::debug!(
            "🔎 Scan: {} candidates, {} scored, {} degenerate, {} faulted, best={:?}",
            stats.candidates,
            stats.scored,
            stats.degenerate,
            stats.faulted,
            best.as_ref().map(|m| (&m.article.article_num, m.score))
        );

        if stats.all_faulted() {
            tracing::error!("❌ All {} article records failed to score", stats.candidates);
            return Err(LexError::RetrievalUnavailable(format!(
                "all {} article records failed to score",
                stats.candidates
            )));
        }

        Ok(best.filter(|m| admits(m.score, self.threshold)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteArticleStore;
    use lexadvisor_core::testing::{FailingEncoder, StaticEncoder, UnavailableArticleStore};

    fn article(num: &str, embedding: Vec<f32>) -> Article {
        Article {
            law_id: "LD".into(),
            article_num: num.into(),
            content: format!("Article {num}"),
            embedding,
        }
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let v = vec![0.3, -1.7, 2.2, 0.01];
        assert_eq!(cosine_similarity(&v, &v), 1.0);
    }

    #[test]
    fn test_cosine_known_values() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]), -1.0);
        // |q| = 2, |v| = 1, q·v = 1
        assert_eq!(cosine_similarity(&[1.0, 1.0, 1.0, 1.0], &[1.0, 0.0, 0.0, 0.0]), 0.5);
    }

    #[test]
    fn test_zero_norm_is_nan() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_nan());
    }

    #[test]
    fn test_admission_boundary() {
        assert!(!admits(0.5, 0.5));
        assert!(admits(0.50001, 0.5));
        assert!(!admits(0.49, 0.5));
    }

    #[test]
    fn test_score_just_above_half_is_admitted() {
        // 1.7320508f32 is slightly below sqrt(3), so the true cosine is ~0.5000000067
        let score = cosine_similarity(&[1.0, 0.0], &[1.0, 1.7320508]);
        assert!(score > 0.5, "score {score} collapsed onto the threshold");
        assert!(score < 0.500001);
        assert!(admits(score, 0.5));
    }

    #[test]
    fn test_selects_maximum() {
        let q = vec![1.0, 0.0];
        let outcome = select_best(
            &q,
            vec![
                Ok(article("low", vec![0.2, 1.0])),
                Ok(article("high", vec![1.0, 0.1])),
                Ok(article("mid", vec![1.0, 1.0])),
            ],
        );
        let best = outcome.best.unwrap();
        assert_eq!(best.article.article_num, "high");
        assert_eq!(outcome.stats.scored, 3);
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let q = vec![1.0, 2.0, 3.0];
        let outcome = select_best(
            &q,
            vec![
                Ok(article("first", vec![2.0, 4.0, 6.0])),
                Ok(article("second", vec![2.0, 4.0, 6.0])),
                Ok(article("third", vec![1.0, 2.0, 3.0])),
            ],
        );
        let best = outcome.best.unwrap();
        assert_eq!(best.article.article_num, "first");
        assert_eq!(best.score, 1.0);
    }

    #[test]
    fn test_zero_norm_never_selected() {
        let q = vec![1.0, 0.0];
        let outcome = select_best(
            &q,
            vec![
                Ok(article("zero", vec![0.0, 0.0])),
                Ok(article("weak", vec![-1.0, 0.0])),
            ],
        );
        // Even a negative score beats an undefined one
        assert_eq!(outcome.best.unwrap().article.article_num, "weak");
        assert_eq!(outcome.stats.degenerate, 1);

        let only_zero = select_best(&q, vec![Ok(article("zero", vec![0.0, 0.0]))]);
        assert!(only_zero.best.is_none());
        assert!(!only_zero.stats.all_faulted());
    }

    #[test]
    fn test_zero_norm_query_matches_nothing() {
        let outcome = select_best(&[0.0, 0.0], vec![Ok(article("a", vec![1.0, 0.0]))]);
        assert!(outcome.best.is_none());
        assert_eq!(outcome.stats.degenerate, 1);
    }

    #[test]
    fn test_faulty_records_are_skipped() {
        let q = vec![1.0, 0.0];
        let outcome = select_best(
            &q,
            vec![
                Err(LexError::InvalidRecord {
                    key: "x".into(),
                    reason: "bad blob".into(),
                }),
                Ok(article("wrong-dim", vec![1.0, 0.0, 0.0])),
                Ok(article("ok", vec![1.0, 0.5])),
            ],
        );
        assert_eq!(outcome.best.unwrap().article.article_num, "ok");
        assert_eq!(outcome.stats.faulted, 2);
        assert!(!outcome.stats.all_faulted());
    }

    async fn seeded_store(items: Vec<Article>) -> Arc<SqliteArticleStore> {
        let store = SqliteArticleStore::open_in_memory().unwrap();
        for a in items {
            store.upsert(a).await.unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_retriever_threshold_applies() {
        let store = seeded_store(vec![article("half", vec![1.0, 0.0, 0.0, 0.0])]).await;
        let encoder = Arc::new(
            StaticEncoder::uniform(vec![0.0, 0.0, 0.0, 1.0])
                .with("boundary", vec![1.0, 1.0, 1.0, 1.0])
                .with("exact", vec![3.0, 0.0, 0.0, 0.0]),
        );
        let retriever = BruteForceRetriever::new(encoder, store, 0.5);

        // cos = 0.5 exactly: rejected
        assert!(retriever.find_best_match("boundary").await.unwrap().is_none());

        let m = retriever.find_best_match("exact").await.unwrap().unwrap();
        assert_eq!(m.article.article_num, "half");
        assert_eq!(m.score, 1.0);
    }

    #[tokio::test]
    async fn test_retriever_empty_corpus_is_not_found() {
        let store = seeded_store(vec![]).await;
        let encoder = Arc::new(StaticEncoder::uniform(vec![1.0]));
        let retriever = BruteForceRetriever::new(encoder, store, 0.5);
        assert!(retriever.find_best_match("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retriever_all_faulted_is_retrieval_unavailable() {
        let store = seeded_store(vec![article("a", vec![1.0, 0.0, 0.0])]).await;
        let encoder = Arc::new(StaticEncoder::uniform(vec![1.0, 0.0]));
        let retriever = BruteForceRetriever::new(encoder, store, 0.5);
        let err = retriever.find_best_match("q").await.unwrap_err();
        assert!(matches!(err, LexError::RetrievalUnavailable(_)));
    }

    #[tokio::test]
    async fn test_retriever_store_down_is_retrieval_unavailable() {
        let encoder = Arc::new(StaticEncoder::uniform(vec![1.0, 0.0]));
        let retriever = BruteForceRetriever::new(encoder, Arc::new(UnavailableArticleStore), 0.5);
        let err = retriever.find_best_match("q").await.unwrap_err();
        assert!(matches!(err, LexError::RetrievalUnavailable(_)));
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[tokio::test]
    async fn test_retriever_admits_near_boundary_match() {
        let store = seeded_store(vec![article("near", vec![1.0, 1.7320508])]).await;
        let encoder = Arc::new(StaticEncoder::uniform(vec![1.0, 0.0]));
        let retriever = BruteForceRetriever::new(encoder, store, 0.5);
        let m = retriever.find_best_match("q").await.unwrap().unwrap();
        assert_eq!(m.article.article_num, "near");
        assert!(m.score > 0.5);
    }

    #[tokio::test]
    async fn test_retriever_encoder_down() {
        let store = seeded_store(vec![article("a", vec![1.0])]).await;
        let retriever = BruteForceRetriever::new(Arc::new(FailingEncoder), store, 0.5);
        let err = retriever.find_best_match("q").await.unwrap_err();
        assert!(matches!(err, LexError::EncodingUnavailable(_)));
    }
}
