//! Transcript chunking.
//!
//! Splits a transcript into overlapping [`Passage`]s sized for embedding.

mod recursive;

pub use recursive::RecursiveCharacterSplitter;

use crate::config::ChunkingSettings;
use crate::error::{Result, VidragError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

/// A chunk of transcript text, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Text content of this chunk.
    pub content: String,
    /// Where the text came from (the transcript file name).
    pub source: String,
    /// Position of this chunk within its transcript.
    pub chunk_index: usize,
}

impl Passage {
    pub fn new(content: String, source: String, chunk_index: usize) -> Self {
        Self {
            content,
            source,
            chunk_index,
        }
    }
}

impl From<&ChunkingSettings> for RecursiveCharacterSplitter {
    fn from(settings: &ChunkingSettings) -> Self {
        RecursiveCharacterSplitter::new(settings.chunk_size, settings.chunk_overlap)
    }
}

/// Split already-loaded transcript text into passages.
pub fn split_passages(splitter: &RecursiveCharacterSplitter, text: &str, source: &str) -> Vec<Passage> {
    splitter
        .split_text(text)
        .into_iter()
        .enumerate()
        .map(|(i, content)| Passage::new(content, source.to_string(), i))
        .collect()
}

/// Read a transcript file and split it into passages.
///
/// Fails with `Load` only when the file cannot be opened or decoded. An empty
/// transcript yields no passages.
#[instrument(skip(splitter), fields(path = %path.display()))]
pub fn load_passages(splitter: &RecursiveCharacterSplitter, path: &Path) -> Result<Vec<Passage>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| VidragError::Load(format!("{}: {}", path.display(), e)))?;

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let passages = split_passages(splitter, &text, &source);
    info!("Split transcript into {} passages", passages.len());
    Ok(passages)
}
