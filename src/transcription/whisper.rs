//! OpenAI-compatible Whisper transcription.

use super::Transcriber;
use crate::config::TRANSCRIBE_API_KEY_ENV;
use crate::error::{Result, VidragError};
use crate::openai::create_client;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    has_key: bool,
}

impl WhisperTranscriber {
    pub fn new(base_url: &str, api_key: Option<&str>, model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(base_url, api_key)?,
            model: model.to_string(),
            has_key: api_key.is_some(),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        if !self.has_key {
            return Err(VidragError::Configuration(format!(
                "{} not set; it is required to transcribe new audio",
                TRANSCRIBE_API_KEY_ENV
            )));
        }

        let file_bytes = tokio::fs::read(audio_path).await.map_err(|e| {
            VidragError::Transcription(format!("Cannot read {}: {}", audio_path.display(), e))
        })?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| VidragError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| VidragError::Transcription(format!("Whisper API error: {}", e)))?;

        if response.text.trim().is_empty() {
            return Err(VidragError::Transcription(
                "Whisper returned an empty transcript".to_string(),
            ));
        }

        debug!("Transcribed {} characters", response.text.len());
        Ok(response.text)
    }
}
