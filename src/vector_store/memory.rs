//! In-memory vector store implementation.
//!
//! Useful for testing and single-run use; contents are lost on exit.

use super::{cosine_similarity, normalize_score, rank_results, IndexEntry, SearchResult, VectorStore};
use crate::error::{Result, VidragError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory vector store. Entries keep their insertion order, which breaks
/// score ties.
pub struct MemoryVectorStore {
    entries: RwLock<Entries>,
}

#[derive(Default)]
struct Entries {
    ordered: Vec<IndexEntry>,
    /// Position of each id in `ordered`.
    positions: HashMap<Uuid, usize>,
}

impl Entries {
    fn upsert(&mut self, entry: &IndexEntry) {
        match self.positions.get(&entry.id) {
            Some(&i) => self.ordered[i] = entry.clone(),
            None => {
                self.positions.insert(entry.id, self.ordered.len());
                self.ordered.push(entry.clone());
            }
        }
    }
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, entries: &[IndexEntry]) -> Result<usize> {
        let mut store = self
            .entries
            .write()
            .map_err(|e| VidragError::Index(format!("Failed to acquire lock: {}", e)))?;

        store.ordered.reserve(entries.len());
        for entry in entries {
            store.upsert(entry);
        }
        Ok(entries.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        embedding_model: &str,
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| VidragError::Retrieval(format!("Failed to acquire lock: {}", e)))?;

        let results: Vec<SearchResult> = entries
            .ordered
            .iter()
            .filter(|entry| entry.embedding_model == embedding_model)
            .map(|entry| SearchResult {
                passage: entry.passage.clone(),
                score: normalize_score(cosine_similarity(query_embedding, &entry.embedding)),
            })
            .collect();

        Ok(rank_results(results, limit, min_score))
    }

    async fn count(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| VidragError::Retrieval(format!("Failed to acquire lock: {}", e)))?;
        Ok(entries.ordered.len())
    }
}
