//! Local temporary files for in-flight uploads.
//!
//! Each upload owns at most one raw file (`tmp-{video_id}.{ext}`) and one
//! processed file (`<raw>.processed`). Both are tracked by a [`StagedFiles`]
//! guard so they are removed whatever way the pipeline exits.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const PROCESSED_SUFFIX: &str = ".processed";

/// Directory where uploads are written before probing.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Deterministic raw path for a video id.
    pub fn raw_path(&self, video_id: Uuid, extension: &str) -> PathBuf {
        self.dir.join(format!("tmp-{}.{}", video_id, extension))
    }

    /// Write the full upload body to the raw path and return it.
    ///
    /// The path is registered with `files` before any byte is written, so a
    /// partial write is still cleaned up.
    pub async fn stage(
        &self,
        files: &mut StagedFiles,
        video_id: Uuid,
        extension: &str,
        data: &[u8],
    ) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.raw_path(video_id, extension);
        files.track_raw(path.clone());

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        tracing::debug!(
            video_id = %video_id,
            path = %path.display(),
            size_bytes = data.len(),
            "Upload staged"
        );
        Ok(path)
    }
}

/// `<input>.processed`, next to the input.
pub fn processed_path_for(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(PROCESSED_SUFFIX);
    PathBuf::from(name)
}

/// Remove every path that exists. Never fails.
pub async fn cleanup(paths: &[&Path]) {
    for path in paths {
        match fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed staged file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove staged file"
            ),
        }
    }
}

/// Scoped owner of the staged files of one upload.
#[derive(Debug, Default)]
pub struct StagedFiles {
    raw: Option<PathBuf>,
    processed: Option<PathBuf>,
    cleaned: bool,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_raw(&mut self, path: PathBuf) {
        self.raw = Some(path);
    }

    pub fn track_processed(&mut self, path: PathBuf) {
        self.processed = Some(path);
    }

    pub fn raw(&self) -> Option<&Path> {
        self.raw.as_deref()
    }

    pub fn processed(&self) -> Option<&Path> {
        self.processed.as_deref()
    }

    fn paths(&self) -> Vec<&Path> {
        self.raw().into_iter().chain(self.processed()).collect()
    }

    /// Remove all tracked files.
    pub async fn cleanup(mut self) {
        cleanup(&self.paths()).await;
        self.cleaned = true;
    }
}

impl Drop for StagedFiles {
    // Reached on panic or when the request future is cancelled mid-pipeline.
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        for path in self.paths() {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed staged file on drop"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove staged file on drop"
                ),
            }
        }
    }
}
