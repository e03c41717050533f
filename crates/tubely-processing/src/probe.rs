//! Stream geometry via ffprobe.

use crate::process::{run_tool, validate_tool_path, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tubely_core::{AspectRatio, TubelyConfig};

const TOOL: &str = "ffprobe";

/// Dimensions of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub width: u32,
    pub height: u32,
}

impl ProbeResult {
    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::classify(self.width, self.height)
    }
}

#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ToolError>;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse `-of json` output restricted to `stream=width,height`.
pub(crate) fn parse_probe_output(stdout: &[u8]) -> Result<ProbeResult, ToolError> {
    let output: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| ToolError::InvalidOutput {
            tool: TOOL,
            message: format!("failed to parse JSON: {}", e),
        })?;

    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::InvalidOutput {
            tool: TOOL,
            message: "no video stream found".to_string(),
        })?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Ok(ProbeResult { width, height }),
        (width, height) => Err(ToolError::InvalidOutput {
            tool: TOOL,
            message: format!(
                "video stream has no usable dimensions (width={:?}, height={:?})",
                width, height
            ),
        }),
    }
}

pub struct FfprobeProber {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(TOOL, &ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }

    pub fn from_config(config: &TubelyConfig) -> Result<Self, ToolError> {
        Self::new(config.ffprobe_path.clone(), config.tool_timeout())
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ToolError> {
        let start = std::time::Instant::now();

        let output = run_tool(
            TOOL,
            &self.ffprobe_path,
            [
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-select_streams"),
                OsStr::new("v:0"),
                OsStr::new("-show_entries"),
                OsStr::new("stream=width,height"),
                OsStr::new("-of"),
                OsStr::new("json"),
                path.as_os_str(),
            ],
            self.timeout,
        )
        .await?;

        let result = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = result.width,
            height = result.height,
            "Video probe completed"
        );

        Ok(result)
    }
}
