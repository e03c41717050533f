//! Fast-start remux via ffmpeg.
//!
//! Streams are copied as-is; only the container is rewritten so the `moov`
//! atom sits at the front of the file.

use crate::process::{run_tool, validate_tool_path, ToolError};
use crate::staging::{cleanup, processed_path_for};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tubely_core::TubelyConfig;

const TOOL: &str = "ffmpeg";

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Where `remux` will write its output for `input`.
    fn output_path(&self, input: &Path) -> PathBuf {
        processed_path_for(input)
    }

    /// Rewrite `input` and return the path of the result. The output exists
    /// only if this returns `Ok`.
    async fn remux(&self, input: &Path) -> Result<PathBuf, ToolError>;
}

pub struct FfmpegFastStart {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegFastStart {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(TOOL, &ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }

    pub fn from_config(config: &TubelyConfig) -> Result<Self, ToolError> {
        Self::new(config.ffmpeg_path.clone(), config.tool_timeout())
    }
}

#[async_trait]
impl Transcoder for FfmpegFastStart {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, input: &Path) -> Result<PathBuf, ToolError> {
        let start = std::time::Instant::now();
        let output_path = self.output_path(input);

        let result = run_tool(
            TOOL,
            &self.ffmpeg_path,
            [
                OsStr::new("-y"),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-movflags"),
                OsStr::new("faststart"),
                OsStr::new("-map_metadata"),
                OsStr::new("0"),
                OsStr::new("-codec"),
                OsStr::new("copy"),
                OsStr::new("-f"),
                OsStr::new("mp4"),
                output_path.as_os_str(),
            ],
            self.timeout,
        )
        .await;

        if let Err(e) = result {
            tracing::error!(error = %e, "FFmpeg fast-start remux failed");
            cleanup(&[output_path.as_path()]).await;
            return Err(e);
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            output = %output_path.display(),
            "FFmpeg fast-start remux completed"
        );

        Ok(output_path)
    }
}
