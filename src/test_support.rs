//! Stub collaborators for unit tests.

use crate::audio::{AssetHandle, MediaAcquirer};
use crate::embedding::Embedder;
use crate::error::{Result, VidragError};
use crate::llm::{GenerationOptions, LanguageModel};
use crate::transcription::Transcriber;
use crate::vector_store::{IndexEntry, SearchResult, VectorStore};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const BAG_OF_WORDS_DIMENSIONS: usize = 256;

/// Deterministic embedder: one dimension per distinct lowercase word, valued
/// by the word's count. Texts with the same words embed identically.
#[derive(Default)]
pub struct BagOfWordsEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `embed`/`embed_batch` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vocabulary = self.vocabulary.lock().unwrap();
        let mut vector = vec![0.0; BAG_OF_WORDS_DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
        {
            let next = vocabulary.len();
            let slot = *vocabulary.entry(word).or_insert(next) % BAG_OF_WORDS_DIMENSIONS;
            vector[slot] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn model_id(&self) -> String {
        "bag-of-words".to_string()
    }
}

/// Vector store whose backend is always unreachable.
pub struct FailingVectorStore;

fn unreachable_store() -> VidragError {
    VidragError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "vector store unavailable",
    ))
}

#[async_trait]
impl VectorStore for FailingVectorStore {
    async fn upsert_batch(&self, _entries: &[IndexEntry]) -> Result<usize> {
        Err(unreachable_store())
    }

    async fn search(
        &self,
        _query_embedding: &[f32],
        _embedding_model: &str,
        _limit: usize,
        _min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        Err(unreachable_store())
    }

    async fn count(&self) -> Result<usize> {
        Err(unreachable_store())
    }
}

/// Acquirer that writes a small fake mp3 and counts invocations.
#[derive(Default)]
pub struct CountingAcquirer {
    calls: AtomicUsize,
}

impl CountingAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaAcquirer for CountingAcquirer {
    async fn acquire(&self, _locator: &str, handle: &AssetHandle, staging_dir: &Path) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = staging_dir.join(format!("{}.mp3", handle));
        tokio::fs::write(&path, b"ID3 fake audio").await?;
        Ok(path)
    }
}

/// Transcriber returning a fixed text, or always failing.
pub struct StubTranscriber {
    text: Option<String>,
    calls: AtomicUsize,
}

impl StubTranscriber {
    pub fn ok(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| VidragError::Transcription("backend rejected the audio".to_string()))
    }
}

/// Language model replaying canned outputs and recording what it was asked.
pub struct ScriptedLanguageModel {
    responses: Mutex<VecDeque<String>>,
    repeat: Option<String>,
    prompts: Mutex<Vec<String>>,
    options: Mutex<Vec<GenerationOptions>>,
}

impl ScriptedLanguageModel {
    /// Replay `responses` in order, then fail.
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            repeat: None,
            prompts: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        }
    }

    /// Return `response` on every call.
    pub fn repeating(response: &str) -> Self {
        Self {
            repeat: Some(response.to_string()),
            ..Self::new(Vec::<String>::new())
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn options(&self) -> Vec<GenerationOptions> {
        self.options.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.options.lock().unwrap().push(options.clone());

        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return Ok(next);
        }
        self.repeat
            .clone()
            .ok_or_else(|| VidragError::Agent("script exhausted".to_string()))
    }
}
