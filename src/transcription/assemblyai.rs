//! AssemblyAI transcription over its REST API.

use super::Transcriber;
use crate::config::TRANSCRIBE_API_KEY_ENV;
use crate::error::{Result, VidragError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// AssemblyAI-backed transcriber.
///
/// The API key is optional at construction so runs with a cached transcript
/// never need it; a missing key is reported on first use.
pub struct AssemblyAiTranscriber {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: TranscriptStatus,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl AssemblyAiTranscriber {
    pub fn new(base_url: &str, api_key: Option<String>, poll_interval: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            poll_interval,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            VidragError::Configuration(format!(
                "{} not set; it is required to transcribe new audio",
                TRANSCRIBE_API_KEY_ENV
            ))
        })
    }

    async fn upload(&self, key: &str, audio: Vec<u8>) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .header("authorization", key)
            .header("content-type", "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(|e| VidragError::Transcription(format!("Upload failed: {}", e)))?;

        let response = check_status(response, "upload").await?;
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| VidragError::Transcription(format!("Invalid upload response: {}", e)))?;
        Ok(body.upload_url)
    }

    async fn request_transcript(&self, key: &str, audio_url: &str) -> Result<TranscriptResponse> {
        let response = self
            .http
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", key)
            .json(&TranscriptRequest { audio_url })
            .send()
            .await
            .map_err(|e| VidragError::Transcription(format!("Transcript request failed: {}", e)))?;

        parse_transcript(check_status(response, "transcript request").await?).await
    }

    async fn poll(&self, key: &str, id: &str) -> Result<TranscriptResponse> {
        let response = self
            .http
            .get(format!("{}/transcript/{}", self.base_url, id))
            .header("authorization", key)
            .send()
            .await
            .map_err(|e| VidragError::Transcription(format!("Status poll failed: {}", e)))?;

        parse_transcript(check_status(response, "status poll").await?).await
    }
}

async fn check_status(response: reqwest::Response, step: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(VidragError::Transcription(format!(
        "AssemblyAI {} returned {}: {}",
        step, status, body
    )))
}

async fn parse_transcript(response: reqwest::Response) -> Result<TranscriptResponse> {
    response
        .json()
        .await
        .map_err(|e| VidragError::Transcription(format!("Invalid transcript response: {}", e)))
}

/// Map a finished transcript to its text, or `None` while it is still running.
fn finished_text(transcript: TranscriptResponse) -> Option<Result<String>> {
    match transcript.status {
        TranscriptStatus::Queued | TranscriptStatus::Processing => None,
        TranscriptStatus::Error => Some(Err(VidragError::Transcription(
            transcript
                .error
                .unwrap_or_else(|| format!("transcript {} failed", transcript.id)),
        ))),
        TranscriptStatus::Completed => Some(match transcript.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(VidragError::Transcription(format!(
                "transcript {} completed without text",
                transcript.id
            ))),
        }),
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let key = self.api_key()?;

        let audio = tokio::fs::read(audio_path).await.map_err(|e| {
            VidragError::Transcription(format!("Cannot read {}: {}", audio_path.display(), e))
        })?;

        info!("Uploading {} bytes of audio", audio.len());
        let audio_url = self.upload(key, audio).await?;

        let mut transcript = self.request_transcript(key, &audio_url).await?;
        info!("Transcript {} queued", transcript.id);

        loop {
            let id = transcript.id.clone();
            if let Some(result) = finished_text(transcript) {
                return result;
            }
            debug!("Transcript {} still running", id);
            tokio::time::sleep(self.poll_interval).await;
            transcript = self.poll(key, &id).await?;
        }
    }
}
