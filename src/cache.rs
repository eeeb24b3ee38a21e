//! Filesystem cache for pipeline artifacts.
//!
//! Audio (`<handle>.mp3`) and transcripts (`<handle>.txt`) live side by side in
//! one directory. A file's presence is the cache-hit signal, so every write goes
//! through a temporary file in the same directory followed by an atomic rename:
//! a killed process leaves a stray temp file, never a truncated artifact.

use crate::audio::AssetHandle;
use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Kind of artifact stored in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Audio,
    Transcript,
}

impl ArtifactKind {
    fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Audio => "mp3",
            ArtifactKind::Transcript => "txt",
        }
    }
}

/// Directory-backed artifact cache.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    /// Open (and create if needed) the cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an artifact, whether or not it exists yet.
    pub fn path(&self, handle: &AssetHandle, kind: ArtifactKind) -> PathBuf {
        self.dir
            .join(format!("{}.{}", handle.as_str(), kind.extension()))
    }

    /// Look up a usable artifact.
    ///
    /// Zero-length files cannot be valid audio or transcripts; they are removed
    /// and reported as a miss so the stage recomputes them.
    pub fn lookup(&self, handle: &AssetHandle, kind: ArtifactKind) -> Result<Option<PathBuf>> {
        let path = self.path(handle, kind);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                debug!("Cache hit: {}", path.display());
                Ok(Some(path))
            }
            Ok(meta) if meta.is_file() => {
                warn!("Discarding empty cache file {}", path.display());
                std::fs::remove_file(&path)?;
                Ok(None)
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically write `contents` as the artifact.
    pub fn store(&self, handle: &AssetHandle, kind: ArtifactKind, contents: &[u8]) -> Result<PathBuf> {
        let target = self.path(handle, kind);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        debug!("Stored {}", target.display());
        Ok(target)
    }

    /// Atomically move an already-produced file into place as the artifact.
    ///
    /// `source` must live on the same filesystem as the cache directory.
    pub fn adopt(&self, handle: &AssetHandle, kind: ArtifactKind, source: &Path) -> Result<PathBuf> {
        let target = self.path(handle, kind);
        std::fs::rename(source, &target)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> AssetHandle {
        AssetHandle::from_locator("https://www.youtube.com/watch?v=BrsocJb-fAo").unwrap()
    }

    #[test]
    fn test_paths_follow_handle() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();
        assert_eq!(
            cache.path(&handle(), ArtifactKind::Audio),
            dir.path().join("watch_v_brsocjb_fao.mp3")
        );
        assert_eq!(
            cache.path(&handle(), ArtifactKind::Transcript),
            dir.path().join("watch_v_brsocjb_fao.txt")
        );
    }

    #[test]
    fn test_store_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();

        assert!(cache.lookup(&handle(), ArtifactKind::Transcript).unwrap().is_none());

        let stored = cache
            .store(&handle(), ArtifactKind::Transcript, b"hello there")
            .unwrap();
        let found = cache.lookup(&handle(), ArtifactKind::Transcript).unwrap();
        assert_eq!(found, Some(stored.clone()));
        assert_eq!(std::fs::read_to_string(stored).unwrap(), "hello there");

        // Only the artifact remains; the temp file was renamed away.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_empty_artifact_is_a_miss_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();
        let path = cache.path(&handle(), ArtifactKind::Audio);
        std::fs::write(&path, b"").unwrap();

        assert!(cache.lookup(&handle(), ArtifactKind::Audio).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_adopt_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();
        let staging = dir.path().join("staging.mp3");
        std::fs::write(&staging, b"ID3").unwrap();

        let target = cache.adopt(&handle(), ArtifactKind::Audio, &staging).unwrap();
        assert!(!staging.exists());
        assert_eq!(std::fs::read(target).unwrap(), b"ID3");
    }
}
