//! yt-dlp based audio acquisition.
//!
//! yt-dlp's progress output is drained line by line on a separate task and
//! echoed to stderr so long downloads stay observable. Nothing parses it.

use super::{AssetHandle, MediaAcquirer};
use crate::error::{Result, VidragError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// Lines of stderr kept for the error message when yt-dlp fails.
const STDERR_TAIL_LINES: usize = 20;

/// Acquires audio by shelling out to `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YtDlpAcquirer {
    program: String,
}

impl YtDlpAcquirer {
    pub fn new() -> Self {
        Self::with_program("yt-dlp")
    }

    /// Use a specific yt-dlp executable.
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn build_command(&self, locator: &str, handle: &AssetHandle, staging_dir: &Path) -> Command {
        let template = staging_dir.join(format!("{}.%(ext)s", handle.as_str()));

        let mut cmd = Command::new(&self.program);
        cmd.arg("--extract-audio")
            .arg("--audio-format").arg("mp3")
            .arg("--no-playlist")
            .arg("--newline")
            .arg("--output").arg(template)
            .arg(locator)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for YtDlpAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaAcquirer for YtDlpAcquirer {
    #[instrument(skip(self, staging_dir), fields(handle = %handle))]
    async fn acquire(
        &self,
        locator: &str,
        handle: &AssetHandle,
        staging_dir: &Path,
    ) -> Result<PathBuf> {
        info!("Downloading audio from {}", locator);

        let mut child = match self.build_command(locator, handle, staging_dir).spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VidragError::ToolNotFound(self.program.clone()));
            }
            Err(e) => {
                return Err(VidragError::Acquisition(format!(
                    "{} execution failed: {e}",
                    self.program
                )));
            }
        };

        let stdout_task = child.stdout.take().map(echo_lines);
        let stderr_task = child.stderr.take().map(tail_lines);

        let status = child.wait().await.map_err(|e| {
            VidragError::Acquisition(format!("Failed waiting for {}: {e}", self.program))
        })?;

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        let stderr_tail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        if !status.success() {
            return Err(VidragError::Acquisition(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                stderr_tail.join("\n")
            )));
        }

        let produced = staging_dir.join(format!("{}.mp3", handle.as_str()));
        match tokio::fs::metadata(&produced).await {
            Ok(meta) if meta.len() > 0 => {
                debug!("Audio written to {}", produced.display());
                Ok(produced)
            }
            _ => Err(VidragError::Acquisition(format!(
                "{} finished but produced no audio at {}",
                self.program,
                produced.display()
            ))),
        }
    }
}

/// Echo every line of a child stream to stderr as it arrives.
fn echo_lines<R>(stream: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            eprintln!("  {}", line);
        }
    })
}

/// Drain a child stream, keeping its last few lines.
fn tail_lines<R>(stream: R) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut tail = std::collections::VecDeque::with_capacity(STDERR_TAIL_LINES);
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("yt-dlp: {}", line);
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        tail.into_iter().collect()
    })
}
