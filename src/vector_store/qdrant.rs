//! Qdrant vector store over its REST API.
//!
//! The collection is created on first write, sized to the first batch's
//! vectors and using cosine distance. Each point's payload carries the passage
//! and the embedding model, and searches filter on that model.

use super::{normalize_score, rank_results, IndexEntry, SearchResult, VectorStore};
use crate::chunking::Passage;
use crate::config::QdrantConnection;
use crate::error::{Result, VidragError};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Points sent per upsert request.
const UPSERT_BATCH_SIZE: usize = 64;

/// Qdrant-backed vector store.
pub struct QdrantVectorStore {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    collection: String,
    /// Vector size of the collection once known to exist.
    collection_size: Mutex<Option<usize>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PointPayload {
    content: String,
    source: String,
    chunk_index: usize,
    embedding_model: String,
    indexed_at: String,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<PointPayload>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: usize,
}

impl QdrantVectorStore {
    pub fn new(connection: QdrantConnection, collection: &str) -> Self {
        if connection.api_key.is_none() {
            warn!("QDRANT_API_KEY not set; connecting to Qdrant without authentication");
        }
        Self {
            http: reqwest::Client::new(),
            base_url: connection.url,
            api_key: connection.api_key,
            collection: collection.to_string(),
            collection_size: Mutex::new(None),
        }
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.collection,
            suffix
        )
    }

    fn request(&self, method: Method, suffix: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.endpoint(suffix));
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    /// Make sure the collection exists with vectors of `size`.
    async fn ensure_collection(&self, size: usize) -> Result<()> {
        let mut known = self.collection_size.lock().await;
        if let Some(existing) = *known {
            return check_size(&self.collection, existing, size);
        }

        let response = self
            .request(Method::GET, "")
            .send()
            .await
            .map_err(|e| VidragError::Index(format!("Qdrant unreachable: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| VidragError::Index(format!("Invalid collection info: {}", e)))?;
                if let Some(existing) = collection_vector_size(&body) {
                    check_size(&self.collection, existing, size)?;
                }
            }
            StatusCode::NOT_FOUND => {
                info!("Creating Qdrant collection {} (size {})", self.collection, size);
                let response = self
                    .request(Method::PUT, "")
                    .json(&json!({ "vectors": { "size": size, "distance": "Cosine" } }))
                    .send()
                    .await
                    .map_err(|e| VidragError::Index(format!("Qdrant unreachable: {}", e)))?;
                expect_success(response, "create collection", VidragError::Index).await?;
            }
            _ => {
                expect_success(response, "collection info", VidragError::Index).await?;
            }
        }

        *known = Some(size);
        Ok(())
    }
}

fn check_size(collection: &str, existing: usize, size: usize) -> Result<()> {
    if existing != size {
        return Err(VidragError::Index(format!(
            "Collection {} stores {}-dimensional vectors but the embedder produced {}",
            collection, existing, size
        )));
    }
    Ok(())
}

/// Vector size from a `GET /collections/{name}` body, for unnamed vectors.
fn collection_vector_size(body: &Value) -> Option<usize> {
    body.pointer("/result/config/params/vectors/size")
        .and_then(Value::as_u64)
        .map(|s| s as usize)
}

async fn expect_success(
    response: reqwest::Response,
    step: &str,
    kind: fn(String) -> VidragError,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(kind(format!("Qdrant {} returned {}: {}", step, status, body)))
}

fn point_body(entry: &IndexEntry) -> Value {
    let payload = PointPayload {
        content: entry.passage.content.clone(),
        source: entry.passage.source.clone(),
        chunk_index: entry.passage.chunk_index,
        embedding_model: entry.embedding_model.clone(),
        indexed_at: entry.indexed_at.to_rfc3339(),
    };
    json!({
        "id": entry.id.to_string(),
        "vector": entry.embedding,
        "payload": payload,
    })
}

fn search_body(query_embedding: &[f32], embedding_model: &str, limit: usize, min_score: f32) -> Value {
    json!({
        "vector": query_embedding,
        "limit": limit,
        "with_payload": true,
        "score_threshold": min_score,
        "filter": {
            "must": [
                { "key": "embedding_model", "match": { "value": embedding_model } }
            ]
        }
    })
}

/// Turn a search response into ranked results.
///
/// Candidates are put in point-id order before ranking so equal scores come
/// back in the same order on every call.
fn parse_search_response(body: SearchResponse, limit: usize, min_score: f32) -> Vec<SearchResult> {
    let mut points: Vec<ScoredPoint> = body
        .result
        .into_iter()
        .filter(|p| p.payload.is_some())
        .collect();
    points.sort_by_key(|p| p.id.to_string());

    let results = points
        .into_iter()
        .filter_map(|p| {
            let payload = p.payload?;
            Some(SearchResult {
                passage: Passage::new(payload.content, payload.source, payload.chunk_index),
                score: normalize_score(p.score),
            })
        })
        .collect();

    rank_results(results, limit, min_score)
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn upsert_batch(&self, entries: &[IndexEntry]) -> Result<usize> {
        let Some(first) = entries.first() else {
            return Ok(0);
        };
        self.ensure_collection(first.embedding.len()).await?;

        for batch in entries.chunks(UPSERT_BATCH_SIZE) {
            let points: Vec<Value> = batch.iter().map(point_body).collect();
            let response = self
                .request(Method::PUT, "/points?wait=true")
                .json(&json!({ "points": points }))
                .send()
                .await
                .map_err(|e| VidragError::Index(format!("Qdrant unreachable: {}", e)))?;
            expect_success(response, "upsert", VidragError::Index).await?;
            debug!("Upserted {} points", batch.len());
        }

        info!("Upserted {} points into {}", entries.len(), self.collection);
        Ok(entries.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        query_embedding: &[f32],
        embedding_model: &str,
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let response = self
            .request(Method::POST, "/points/search")
            .json(&search_body(query_embedding, embedding_model, limit, min_score))
            .send()
            .await
            .map_err(|e| VidragError::Retrieval(format!("Qdrant unreachable: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Collection {} does not exist yet", self.collection);
            return Ok(Vec::new());
        }
        let response = expect_success(response, "search", VidragError::Retrieval).await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| VidragError::Retrieval(format!("Invalid search response: {}", e)))?;

        Ok(parse_search_response(body, limit, min_score))
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .request(Method::POST, "/points/count")
            .json(&json!({ "exact": true }))
            .send()
            .await
            .map_err(|e| VidragError::Retrieval(format!("Qdrant unreachable: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        let response = expect_success(response, "count", VidragError::Retrieval).await?;
        let body: CountResponse = response
            .json()
            .await
            .map_err(|e| VidragError::Retrieval(format!("Invalid count response: {}", e)))?;
        Ok(body.result.count)
    }
}
