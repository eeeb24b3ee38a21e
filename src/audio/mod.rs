//! Audio acquisition.
//!
//! A source locator (usually a video URL) is turned into a deterministic
//! [`AssetHandle`], and a [`MediaAcquirer`] fetches the audio for it. Caching is
//! not the acquirer's concern; the orchestrator checks the artifact cache first.

mod downloader;

pub use downloader::YtDlpAcquirer;

use crate::error::{Result, VidragError};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Deterministic, filesystem-safe identifier derived from a source locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetHandle(String);

impl AssetHandle {
    /// Derive the handle for a locator.
    ///
    /// Fails when the locator has no alphanumeric content to derive from.
    pub fn from_locator(locator: &str) -> Result<Self> {
        let handle = derive_handle(locator);
        if handle.chars().all(|c| c == '_') {
            return Err(VidragError::InvalidInput(format!(
                "Cannot derive an asset name from source locator: {:?}",
                locator
            )));
        }
        Ok(Self(handle))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[^a-zA-Z0-9]+").expect("static regex"))
}

/// Turn a locator into a lowercase `[a-z0-9_]` name.
///
/// Only the last non-empty path segment is used, so
/// `https://www.youtube.com/watch?v=BrsocJb-fAo` becomes `watch_v_brsocjb_fao`.
pub fn derive_handle(locator: &str) -> String {
    let last_segment = locator
        .trim()
        .split('/')
        .rev()
        .find(|s| !s.is_empty())
        .unwrap_or("");

    separator_runs()
        .replace_all(last_segment, "_")
        .to_lowercase()
}

/// Fetches audio for a locator.
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    /// Download and extract audio for `locator` into `staging_dir`.
    ///
    /// Returns the path of the produced audio file, which the caller moves into
    /// the artifact cache.
    async fn acquire(
        &self,
        locator: &str,
        handle: &AssetHandle,
        staging_dir: &Path,
    ) -> Result<PathBuf>;
}
