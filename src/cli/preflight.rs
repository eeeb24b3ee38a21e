//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting a run that would otherwise fail midway.

use crate::audio::AssetHandle;
use crate::cache::{ArtifactCache, ArtifactKind};
use crate::config::{Settings, VectorStoreProvider};
use crate::error::{Result, VidragError};
use std::process::Command;

/// Run pre-flight checks for processing `locator`.
///
/// The downloader is only required when the audio is not cached yet.
pub fn check(settings: &Settings, locator: &str) -> Result<()> {
    let handle = AssetHandle::from_locator(locator)?;
    let cache = ArtifactCache::open(settings.cache_dir())?;

    if cache.lookup(&handle, ArtifactKind::Audio)?.is_none() {
        check_tool("yt-dlp")?;
    }

    if settings.vector_store.provider == VectorStoreProvider::Qdrant {
        settings.qdrant_connection()?;
    }
    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidragError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidragError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidragError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
