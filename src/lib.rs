//! vidrag - Ask questions about a video
//!
//! Retrieval-augmented question answering over a video's spoken content.
//!
//! # Overview
//!
//! One run takes a video locator and a question and:
//! - downloads the audio (cached as `<handle>.mp3`)
//! - transcribes it (cached as `<handle>.txt`)
//! - splits the transcript into overlapping passages
//! - embeds and indexes the passages, then retrieves those similar to the question
//! - seeds a conversation memory with them and lets an agent answer
//!
//! Every stage fails fast; nothing is retried.
//!
//! # Architecture
//!
//! - `config` - Settings, environment secrets and prompt templates
//! - `cache` - Atomic file cache for audio and transcripts
//! - `audio` - Asset handles and audio acquisition
//! - `transcription` - Speech-to-text backends
//! - `chunking` - Recursive character splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `rag` - Knowledge index and conversation memory
//! - `llm` - Text generation backends
//! - `agent` - Reasoning loop producing the final answer
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use vidrag::config::Settings;
//! use vidrag::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let outcome = orchestrator
//!         .run("https://www.youtube.com/watch?v=BrsocJb-fAo", "What is the video about?")
//!         .await?;
//!     println!("{}", outcome.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod audio;
pub mod cache;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod transcription;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Result, VidragError};
