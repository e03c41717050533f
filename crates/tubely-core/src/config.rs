//! Configuration module
//!
//! Everything the pipeline needs to reach its collaborators (object store,
//! staging directory, external tools) is carried in `TubelyConfig` and handed
//! to each component constructor. Nothing here is a process-wide global.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StorageBackend;

/// 1 GiB, inclusive upper bound on an uploaded video body.
pub const MAX_VIDEO_SIZE_BYTES: u64 = 1 << 30;
/// The only container type accepted at the upload boundary.
pub const ACCEPTED_VIDEO_CONTENT_TYPE: &str = "video/mp4";
const PRESIGNED_URL_TTL_SECS: u64 = 300;
const TOOL_TIMEOUT_SECS: u64 = 600;

#[derive(Clone, Debug)]
pub struct TubelyConfig {
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub url_signing_secret: Option<String>,
    pub presigned_url_ttl_secs: u64,
    // Ingestion configuration
    pub staging_dir: PathBuf,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub tool_timeout_secs: u64,
    pub max_video_size_bytes: u64,
    pub accepted_content_type: String,
}

impl Default for TubelyConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::S3,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            local_storage_path: None,
            local_storage_base_url: None,
            url_signing_secret: None,
            presigned_url_ttl_secs: PRESIGNED_URL_TTL_SECS,
            staging_dir: env::temp_dir(),
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            tool_timeout_secs: TOOL_TIMEOUT_SECS,
            max_video_size_bytes: MAX_VIDEO_SIZE_BYTES,
            accepted_content_type: ACCEPTED_VIDEO_CONTENT_TYPE.to_string(),
        }
    }
}

impl TubelyConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.storage_backend,
        };

        let config = TubelyConfig {
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            aws_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            url_signing_secret: env::var("URL_SIGNING_SECRET").ok(),
            presigned_url_ttl_secs: env::var("PRESIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| PRESIGNED_URL_TTL_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PRESIGNED_URL_TTL_SECS must be a valid number"))?,
            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_dir),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            tool_timeout_secs: env::var("TOOL_TIMEOUT_SECS")
                .unwrap_or_else(|_| TOOL_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TOOL_TIMEOUT_SECS),
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_VIDEO_SIZE_BYTES),
            accepted_content_type: defaults.accepted_content_type,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.as_deref().unwrap_or("").is_empty() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when STORAGE_BACKEND=s3"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
                    ));
                }
                if self.url_signing_secret.as_deref().unwrap_or("").len() < 16 {
                    return Err(anyhow::anyhow!(
                        "URL_SIGNING_SECRET must be at least 16 characters for the local backend"
                    ));
                }
            }
        }

        if self.presigned_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("PRESIGNED_URL_TTL_SECS must be positive"));
        }
        if self.tool_timeout_secs == 0 {
            return Err(anyhow::anyhow!("TOOL_TIMEOUT_SECS must be positive"));
        }

        Ok(())
    }

    pub fn presigned_url_ttl(&self) -> Duration {
        Duration::from_secs(self.presigned_url_ttl_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}
