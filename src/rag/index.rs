//! Ingestion and retrieval over the passage collection.

use crate::chunking::Passage;
use crate::embedding::Embedder;
use crate::error::{Result, VidragError};
use crate::vector_store::{IndexEntry, SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Retrieval policy: how many passages, and how similar they must be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalOptions {
    pub top_k: usize,
    /// Minimum normalized similarity in `[0, 1]`.
    pub score_threshold: f32,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            score_threshold: 0.80,
        }
    }
}

/// Embeds passages into the vector store and retrieves them by query.
///
/// Holding one embedder for both directions keeps queries in the same
/// embedding space as the passages they are compared with.
#[derive(Clone)]
pub struct KnowledgeIndex {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl KnowledgeIndex {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
        }
    }

    /// Embed and store `passages`. Empty input is a no-op.
    ///
    /// Any embedding or store failure aborts the whole call with `Index`.
    #[instrument(skip(self, passages), fields(count = passages.len()))]
    pub async fn ingest(&self, passages: &[Passage]) -> Result<usize> {
        if passages.is_empty() {
            debug!("No passages to ingest");
            return Ok(0);
        }

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(as_index_error)?;

        if embeddings.len() != passages.len() {
            return Err(VidragError::Index(format!(
                "Embedder returned {} vectors for {} passages",
                embeddings.len(),
                passages.len()
            )));
        }

        let model_id = self.embedder.model_id();
        let entries: Vec<IndexEntry> = passages
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(passage, embedding)| IndexEntry::new(passage, embedding, &model_id))
            .collect();

        let count = self
            .vector_store
            .upsert_batch(&entries)
            .await
            .map_err(as_index_error)?;

        info!("Ingested {} passages", count);
        Ok(count)
    }

    /// Find at most `options.top_k` passages similar to `query`, best first,
    /// each scoring at least `options.score_threshold`.
    ///
    /// No match is an empty result, not an error.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str, options: RetrievalOptions) -> Result<Vec<SearchResult>> {
        if options.top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(as_retrieval_error)?;

        let results = self
            .vector_store
            .search(
                &query_embedding,
                &self.embedder.model_id(),
                options.top_k,
                options.score_threshold,
            )
            .await
            .map_err(as_retrieval_error)?;

        info!("Retrieved {} passages", results.len());
        Ok(results)
    }
}

fn as_index_error(err: VidragError) -> VidragError {
    match err {
        VidragError::Index(_) | VidragError::Configuration(_) => err,
        other => VidragError::Index(other.to_string()),
    }
}

fn as_retrieval_error(err: VidragError) -> VidragError {
    match err {
        VidragError::Retrieval(_) | VidragError::Configuration(_) => err,
        other => VidragError::Retrieval(other.to_string()),
    }
}
