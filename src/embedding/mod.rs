//! Embedding generation for indexing and retrieval.
//!
//! The same embedder instance must serve both ingestion and query time; its
//! [`Embedder::model_id`] is stored with every index entry so vectors from a
//! different embedding space are never compared.

mod openai;

pub use openai::OpenAiEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Identifier of the embedding space (model name and dimensions).
    fn model_id(&self) -> String;
}
