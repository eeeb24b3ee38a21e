//! Configuration settings for vidrag.

use crate::error::{Result, VidragError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Environment variable holding the transcription backend API key.
pub const TRANSCRIBE_API_KEY_ENV: &str = "TRANSCRIBE_API_KEY";
/// Environment variable holding the vector store endpoint.
pub const QDRANT_URL_ENV: &str = "QDRANT_URL";
/// Environment variable holding the vector store API key.
pub const QDRANT_API_KEY_ENV: &str = "QDRANT_API_KEY";
/// Environment variable holding the key for OpenAI-compatible endpoints.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Video processed when no `--source` is given.
pub const DEFAULT_SOURCE_LOCATOR: &str = "https://www.youtube.com/watch?v=BrsocJb-fAo";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub source: SourceSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub vector_store: VectorStoreSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub agent: AgentSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory holding the `<handle>.mp3` and `<handle>.txt` cache files.
    pub cache_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            cache_dir: ".".to_string(),
        }
    }
}

/// Which video to process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub locator: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            locator: DEFAULT_SOURCE_LOCATOR.to_string(),
        }
    }
}

/// Transcription provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    /// AssemblyAI REST API (default).
    #[default]
    AssemblyAi,
    /// OpenAI-compatible Whisper endpoint.
    Whisper,
}

impl std::str::FromStr for TranscriptionProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assemblyai" | "assembly" => Ok(TranscriptionProvider::AssemblyAi),
            "whisper" | "openai" => Ok(TranscriptionProvider::Whisper),
            _ => Err(format!("Unknown transcription provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionProvider::AssemblyAi => write!(f, "assemblyai"),
            TranscriptionProvider::Whisper => write!(f, "whisper"),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProvider,
    /// AssemblyAI API base URL.
    pub assemblyai_base_url: String,
    /// Seconds between transcript status polls.
    pub poll_interval_seconds: u64,
    /// Whisper model (whisper provider only).
    pub whisper_model: String,
    /// OpenAI-compatible base URL for the whisper provider.
    pub whisper_base_url: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProvider::AssemblyAi,
            assemblyai_base_url: "https://api.assemblyai.com/v2".to_string(),
            poll_interval_seconds: 3,
            whisper_model: "whisper-1".to_string(),
            whisper_base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    /// Embedding model to use.
    pub model: String,
    /// Requested embedding dimensions (omit for models with a fixed size).
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama2".to_string(),
            dimensions: None,
        }
    }
}

/// Language generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama2".to_string(),
        }
    }
}

/// Vector store backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    #[default]
    Qdrant,
    /// In-process store, lost when the process exits.
    Memory,
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub provider: VectorStoreProvider,
}

/// Transcript splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target passage size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive passages.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 20,
        }
    }
}

/// Retrieval policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Maximum passages returned.
    pub top_k: usize,
    /// Minimum normalized similarity (0.0-1.0).
    pub score_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 10,
            score_threshold: 0.80,
        }
    }
}

/// Answering agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub temperature: f32,
    /// Reasoning steps before the agent gives up.
    pub max_iterations: usize,
    /// Directory with an optional `agent.toml` prompt override.
    pub prompts_dir: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_iterations: 5,
            prompts_dir: None,
        }
    }
}

/// Qdrant connection details resolved from the environment.
#[derive(Debug, Clone)]
pub struct QdrantConnection {
    pub url: Url,
    pub api_key: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(VidragError::Configuration(
                "chunking.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(VidragError::Configuration(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if !(0.0..=1.0).contains(&self.retrieval.score_threshold) {
            return Err(VidragError::Configuration(format!(
                "retrieval.score_threshold must be within 0.0-1.0, got {}",
                self.retrieval.score_threshold
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(VidragError::Configuration(
                "retrieval.top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidrag")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded cache directory path.
    pub fn cache_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.cache_dir)
    }

    /// Resolve the Qdrant endpoint and key from the environment.
    pub fn qdrant_connection(&self) -> Result<QdrantConnection> {
        let url = parse_qdrant_url(&required_env(QDRANT_URL_ENV)?)?;
        let api_key = optional_env(QDRANT_API_KEY_ENV)?;
        Ok(QdrantConnection { url, api_key })
    }

    /// Transcription backend key, if configured.
    pub fn transcription_api_key(&self) -> Result<Option<String>> {
        optional_env(TRANSCRIBE_API_KEY_ENV)
    }

    /// Key for OpenAI-compatible endpoints. Local Ollama ignores it.
    pub fn openai_api_key(&self) -> Option<String> {
        std::env::var(OPENAI_API_KEY_ENV).ok().filter(|k| !k.is_empty())
    }
}

/// Read an environment variable that must be present and non-empty.
pub fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(VidragError::Configuration(format!("{} is empty", name))),
        Err(_) => Err(VidragError::Configuration(format!("{} not set", name))),
    }
}

/// Read an environment variable that may be absent, but must not be empty when set.
pub fn optional_env(name: &str) -> Result<Option<String>> {
    non_empty_optional(name, std::env::var(name).ok())
}

/// An unset variable is `None`; a set but blank one is a configuration error.
fn non_empty_optional(name: &str, value: Option<String>) -> Result<Option<String>> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(Some(value)),
        Some(_) => Err(VidragError::Configuration(format!(
            "{} is set but empty; unset it or provide a value",
            name
        ))),
        None => Ok(None),
    }
}

fn parse_qdrant_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| {
        VidragError::Configuration(format!("{} is not a valid URL ({}): {}", QDRANT_URL_ENV, raw, e))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(VidragError::Configuration(format!(
            "{} must use http or https, got {}",
            QDRANT_URL_ENV,
            url.scheme()
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_policy() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 500);
        assert_eq!(settings.chunking.chunk_overlap, 20);
        assert_eq!(settings.retrieval.top_k, 10);
        assert!((settings.retrieval.score_threshold - 0.80).abs() < f32::EPSILON);
        assert!((settings.agent.temperature - 0.8).abs() < f32::EPSILON);
        assert_eq!(settings.source.locator, DEFAULT_SOURCE_LOCATOR);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [retrieval]
            top_k = 4

            [transcription]
            provider = "whisper"
            "#,
        )
        .unwrap();

        assert_eq!(settings.retrieval.top_k, 4);
        assert!((settings.retrieval.score_threshold - 0.80).abs() < f32::EPSILON);
        assert_eq!(settings.transcription.provider, TranscriptionProvider::Whisper);
        assert_eq!(settings.vector_store.provider, VectorStoreProvider::Qdrant);
    }

    #[test]
    fn test_validate_rejects_bad_overlap() {
        let mut settings = Settings::default();
        settings.chunking.chunk_overlap = 500;
        assert!(matches!(settings.validate(), Err(VidragError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut settings = Settings::default();
        settings.retrieval.score_threshold = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings.general.cache_dir, ".");
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!(
            "AssemblyAI".parse::<TranscriptionProvider>().unwrap(),
            TranscriptionProvider::AssemblyAi
        );
        assert!("vosk".parse::<TranscriptionProvider>().is_err());
    }

    #[test]
    fn test_required_env_missing() {
        let err = required_env("VIDRAG_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(matches!(err, VidragError::Configuration(_)));
    }

    #[test]
    fn test_qdrant_url_validation() {
        let url = parse_qdrant_url("http://localhost:6333").unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(6333));
        assert!(parse_qdrant_url("https://qdrant.example.com").is_ok());

        for bad in ["not a url", "localhost:6333", "ftp://qdrant.example.com", ""] {
            let err = parse_qdrant_url(bad).unwrap_err();
            assert!(matches!(err, VidragError::Configuration(_)), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_optional_value_rules() {
        assert_eq!(non_empty_optional(QDRANT_API_KEY_ENV, None).unwrap(), None);
        assert_eq!(
            non_empty_optional(QDRANT_API_KEY_ENV, Some("secret".to_string())).unwrap(),
            Some("secret".to_string())
        );
        for blank in ["", "   "] {
            let err = non_empty_optional(QDRANT_API_KEY_ENV, Some(blank.to_string())).unwrap_err();
            assert!(matches!(err, VidragError::Configuration(_)));
            assert!(err.to_string().contains(QDRANT_API_KEY_ENV));
        }
    }

    #[test]
    fn test_optional_env_unset_is_none() {
        assert_eq!(optional_env("VIDRAG_TEST_DEFINITELY_UNSET").unwrap(), None);
    }
}
