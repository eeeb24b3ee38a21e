//! Configuration module for vidrag.
//!
//! Handles loading application settings, environment-provided secrets and
//! prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    optional_env, required_env, AgentSettings, ChunkingSettings, EmbeddingSettings,
    GeneralSettings, LlmSettings, QdrantConnection, RetrievalSettings, Settings, SourceSettings,
    TranscriptionProvider, TranscriptionSettings, VectorStoreProvider, VectorStoreSettings,
    DEFAULT_SOURCE_LOCATOR, OPENAI_API_KEY_ENV, QDRANT_API_KEY_ENV, QDRANT_URL_ENV,
    TRANSCRIBE_API_KEY_ENV,
};
