//! Transcription module for vidrag.
//!
//! Turns an audio file into plain text.
//!
//! # Providers
//!
//! - **AssemblyAI** (default): upload, request a transcript, poll until done.
//! - **Whisper**: any OpenAI-compatible `audio/transcriptions` endpoint.

mod assemblyai;
mod whisper;

pub use assemblyai::AssemblyAiTranscriber;
pub use whisper::WhisperTranscriber;

use crate::config::{Settings, TranscriptionProvider};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into its full text.
    ///
    /// Implementations fail with `Transcription` when the backend errors or
    /// returns no text.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Build the transcriber selected in settings.
pub fn create_transcriber(settings: &Settings) -> Result<Arc<dyn Transcriber>> {
    let transcriber: Arc<dyn Transcriber> = match settings.transcription.provider {
        TranscriptionProvider::AssemblyAi => Arc::new(AssemblyAiTranscriber::new(
            &settings.transcription.assemblyai_base_url,
            settings.transcription_api_key()?,
            std::time::Duration::from_secs(settings.transcription.poll_interval_seconds.max(1)),
        )),
        TranscriptionProvider::Whisper => Arc::new(WhisperTranscriber::new(
            &settings.transcription.whisper_base_url,
            settings.transcription_api_key()?.as_deref(),
            &settings.transcription.whisper_model,
        )?),
    };
    Ok(transcriber)
}
