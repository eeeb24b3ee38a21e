//! Vector store abstraction for vidrag.
//!
//! Provides a trait-based interface for different vector database backends.
//! All passages live in one fixed collection.

mod memory;
mod qdrant;

pub use memory::MemoryVectorStore;
pub use qdrant::QdrantVectorStore;

use crate::chunking::Passage;
use crate::config::{Settings, VectorStoreProvider};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the collection holding every ingested passage.
pub const COLLECTION_NAME: &str = "youtube_transcript";

/// A passage and its embedding, as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique entry ID.
    pub id: Uuid,
    pub passage: Passage,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Embedding space the vector belongs to.
    pub embedding_model: String,
    /// When this entry was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl IndexEntry {
    pub fn new(passage: Passage, embedding: Vec<f32>, embedding_model: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            passage,
            embedding,
            embedding_model: embedding_model.to_string(),
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched passage.
    pub passage: Passage,
    /// Normalized similarity in `[0, 1]` (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store entries. Returns how many were written.
    async fn upsert_batch(&self, entries: &[IndexEntry]) -> Result<usize>;

    /// Find at most `limit` entries from `embedding_model`'s space scoring at
    /// least `min_score`, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        embedding_model: &str,
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Get total entry count.
    async fn count(&self) -> Result<usize>;
}

/// Build the vector store selected in settings.
pub fn create_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match settings.vector_store.provider {
        VectorStoreProvider::Qdrant => {
            Arc::new(QdrantVectorStore::new(settings.qdrant_connection()?, COLLECTION_NAME))
        }
        VectorStoreProvider::Memory => Arc::new(MemoryVectorStore::new()),
    };
    Ok(store)
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Map a raw cosine similarity onto the `[0, 1]` scale thresholds use.
pub fn normalize_score(cosine: f32) -> f32 {
    if cosine.is_nan() {
        0.0
    } else {
        cosine.clamp(0.0, 1.0)
    }
}

/// Apply the threshold, order best first, and cap at `limit`.
///
/// The sort is stable, so equal scores keep the order the caller supplied;
/// callers pass candidates in a deterministic order.
pub fn rank_results(mut results: Vec<SearchResult>, limit: usize, min_score: f32) -> Vec<SearchResult> {
    results.retain(|r| r.score >= min_score);
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(content: &str, score: f32) -> SearchResult {
        SearchResult {
            passage: Passage::new(content.to_string(), "t.txt".to_string(), 0),
            score,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_normalize_score_bounds() {
        assert_eq!(normalize_score(-0.7), 0.0);
        assert_eq!(normalize_score(1.0000001), 1.0);
        assert_eq!(normalize_score(f32::NAN), 0.0);
        assert!((normalize_score(0.85) - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rank_results_threshold_order_limit() {
        let ranked = rank_results(
            vec![
                result("low", 0.5),
                result("best", 0.95),
                result("tie-a", 0.9),
                result("tie-b", 0.9),
                result("edge", 0.8),
            ],
            3,
            0.8,
        );

        let names: Vec<_> = ranked.iter().map(|r| r.passage.content.as_str()).collect();
        assert_eq!(names, vec!["best", "tie-a", "tie-b"]);
    }

    #[test]
    fn test_rank_results_keeps_exact_threshold() {
        let ranked = rank_results(vec![result("edge", 0.8)], 10, 0.8);
        assert_eq!(ranked.len(), 1);
    }
}
