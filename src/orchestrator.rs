//! Pipeline orchestrator for vidrag.
//!
//! Runs acquire → transcribe → split → index/retrieve/answer in order. Each
//! stage's only input is the previous stage's output, and the first failure
//! aborts the run. Audio and transcripts are cached by asset handle, so a
//! second run for the same locator skips the download and the transcription.

use crate::agent::{AnsweringAgent, ConversationalReact};
use crate::audio::{AssetHandle, MediaAcquirer, YtDlpAcquirer};
use crate::cache::{ArtifactCache, ArtifactKind};
use crate::chunking::{load_passages, Passage, RecursiveCharacterSplitter};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::error::{Result, VidragError};
use crate::llm::{GenerationOptions, LanguageModel, OpenAiChatModel};
use crate::rag::{ConversationMemory, KnowledgeIndex, RetrievalOptions, Role};
use crate::transcription::{create_transcriber, Transcriber};
use crate::vector_store::{create_vector_store, SearchResult, VectorStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Backends the pipeline is assembled from.
pub struct Components {
    pub acquirer: Arc<dyn MediaAcquirer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub embedder: Arc<dyn Embedder>,
    pub vector_store: Arc<dyn VectorStore>,
    pub llm: Arc<dyn LanguageModel>,
}

impl Components {
    /// Build the backends selected in settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let openai_key = settings.openai_api_key();

        let embedder = Arc::new(OpenAiEmbedder::new(
            &settings.embedding.base_url,
            openai_key.as_deref(),
            &settings.embedding.model,
            settings.embedding.dimensions,
        )?);

        let llm = Arc::new(OpenAiChatModel::new(
            &settings.llm.base_url,
            openai_key.as_deref(),
            &settings.llm.model,
        )?);

        Ok(Self {
            acquirer: Arc::new(YtDlpAcquirer::new()),
            transcriber: create_transcriber(settings)?,
            embedder,
            vector_store: create_vector_store(settings)?,
            llm,
        })
    }
}

/// A source whose transcript is cached and split, ready to index.
#[derive(Debug)]
pub struct PreparedSource {
    pub handle: AssetHandle,
    pub audio_cached: bool,
    pub transcript_cached: bool,
    pub passages: Vec<Passage>,
}

/// What a run produced, stage by stage.
#[derive(Debug)]
pub struct RunOutcome {
    pub handle: AssetHandle,
    /// Audio came from the cache rather than the acquirer.
    pub audio_cached: bool,
    /// Transcript came from the cache rather than the transcriber.
    pub transcript_cached: bool,
    pub passages_indexed: usize,
    /// Passages handed to the agent, best first.
    pub retrieved: Vec<SearchResult>,
    pub answer: String,
}

/// The main orchestrator for the vidrag pipeline.
pub struct Orchestrator {
    settings: Settings,
    cache: ArtifactCache,
    acquirer: Arc<dyn MediaAcquirer>,
    transcriber: Arc<dyn Transcriber>,
    splitter: RecursiveCharacterSplitter,
    index: KnowledgeIndex,
    agent: AnsweringAgent,
}

impl Orchestrator {
    /// Create an orchestrator with the backends selected in settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let components = Components::from_settings(&settings)?;
        Self::with_components(settings, components)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(settings: Settings, components: Components) -> Result<Self> {
        let cache = ArtifactCache::open(settings.cache_dir())?;
        let prompts = Prompts::load(settings.agent.prompts_dir.as_deref())?;

        let agent = AnsweringAgent::new(
            components.llm,
            Arc::new(ConversationalReact::new(prompts.agent)),
        )
        .with_max_iterations(settings.agent.max_iterations);

        Ok(Self {
            splitter: RecursiveCharacterSplitter::from(&settings.chunking),
            index: KnowledgeIndex::new(components.vector_store, components.embedder),
            cache,
            acquirer: components.acquirer,
            transcriber: components.transcriber,
            agent,
            settings,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the whole pipeline for `locator` and answer `query`.
    #[instrument(skip(self, query), fields(locator = %locator))]
    pub async fn run(&self, locator: &str, query: &str) -> Result<RunOutcome> {
        let prepared = self.prepare(locator).await?;
        self.answer(prepared, query).await
    }

    /// Acquire, transcribe and split: every stage before the index.
    #[instrument(skip(self), fields(locator = %locator))]
    pub async fn prepare(&self, locator: &str) -> Result<PreparedSource> {
        let handle = AssetHandle::from_locator(locator)?;
        info!("Processing {} as {}", locator, handle);

        let (audio_path, audio_cached) = self.acquire(locator, &handle).await?;
        let (transcript_path, transcript_cached) = self.transcribe(&handle, &audio_path).await?;
        let passages = load_passages(&self.splitter, &transcript_path)?;

        Ok(PreparedSource {
            handle,
            audio_cached,
            transcript_cached,
            passages,
        })
    }

    /// Index the prepared passages, retrieve those relevant to `query`, and
    /// let the agent answer from them.
    #[instrument(skip(self, prepared, query), fields(handle = %prepared.handle))]
    pub async fn answer(&self, prepared: PreparedSource, query: &str) -> Result<RunOutcome> {
        let passages_indexed = self.index.ingest(&prepared.passages).await?;

        let retrieved = self.index.retrieve(query, self.retrieval_options()).await?;
        info!("Retrieved {} relevant passages", retrieved.len());

        let memory = memory_from(&retrieved);
        let options = GenerationOptions::with_temperature(self.settings.agent.temperature);
        let answer = self.agent.answer(query, &memory, &options).await?;

        Ok(RunOutcome {
            handle: prepared.handle,
            audio_cached: prepared.audio_cached,
            transcript_cached: prepared.transcript_cached,
            passages_indexed,
            retrieved,
            answer,
        })
    }

    fn retrieval_options(&self) -> RetrievalOptions {
        RetrievalOptions {
            top_k: self.settings.retrieval.top_k,
            score_threshold: self.settings.retrieval.score_threshold,
        }
    }

    /// Return the cached audio, or fetch it into a staging directory inside the
    /// cache and move it into place.
    #[instrument(skip(self, handle))]
    async fn acquire(&self, locator: &str, handle: &AssetHandle) -> Result<(PathBuf, bool)> {
        if let Some(path) = self.cache.lookup(handle, ArtifactKind::Audio)? {
            info!("Using cached audio {}", path.display());
            eprintln!("  Audio already downloaded.");
            return Ok((path, true));
        }

        eprintln!("  Downloading audio...");
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(self.cache.dir())?;

        let produced = self
            .acquirer
            .acquire(locator, handle, staging.path())
            .await
            .map_err(|e| match e {
                VidragError::Acquisition(_)
                | VidragError::ToolNotFound(_)
                | VidragError::Configuration(_) => e,
                other => VidragError::Acquisition(other.to_string()),
            })?;

        let size = std::fs::metadata(&produced).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(VidragError::Acquisition(format!(
                "Downloader produced no audio at {}",
                produced.display()
            )));
        }

        let path = self.cache.adopt(handle, ArtifactKind::Audio, &produced)?;
        eprintln!("  Audio downloaded.");
        Ok((path, false))
    }

    /// Return the cached transcript, or transcribe the audio and store the text
    /// verbatim.
    #[instrument(skip(self, handle))]
    async fn transcribe(&self, handle: &AssetHandle, audio_path: &Path) -> Result<(PathBuf, bool)> {
        if let Some(path) = self.cache.lookup(handle, ArtifactKind::Transcript)? {
            info!("Using cached transcript {}", path.display());
            eprintln!("  Transcript already exists.");
            return Ok((path, true));
        }

        eprintln!("  Transcribing...");
        let text = self
            .transcriber
            .transcribe(audio_path)
            .await
            .map_err(|e| match e {
                VidragError::Transcription(_) | VidragError::Configuration(_) => e,
                other => VidragError::Transcription(other.to_string()),
            })?;

        if text.trim().is_empty() {
            return Err(VidragError::Transcription(
                "Transcriber returned no text".to_string(),
            ));
        }

        let path = self
            .cache
            .store(handle, ArtifactKind::Transcript, text.as_bytes())?;
        eprintln!("  Transcription complete ({} characters)", text.chars().count());
        Ok((path, false))
    }
}

/// Seed a fresh memory with the retrieved passages, in rank order.
fn memory_from(results: &[SearchResult]) -> ConversationMemory {
    let mut memory = ConversationMemory::new();
    for result in results {
        memory.append(Role::Assistant, result.passage.content.clone());
    }
    memory
}
