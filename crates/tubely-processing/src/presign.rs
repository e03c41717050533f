use std::sync::Arc;
use std::time::Duration;
use tubely_core::{AppError, TubelyConfig, Video, VideoResponse};
use tubely_storage::Storage;

/// Turns stored object keys into short-lived access URLs.
///
/// URLs are derived on every call and never written back to the record.
#[derive(Clone)]
pub struct VideoUrlSigner {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl VideoUrlSigner {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &TubelyConfig) -> Self {
        Self::new(storage, config.presigned_url_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn sign(&self, storage_key: &str) -> Result<String, AppError> {
        self.storage
            .get_presigned_url(storage_key, self.ttl)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to sign URL for {}: {}", storage_key, e)))
    }

    /// Response view of `video` with its key replaced by a signed URL.
    pub async fn sign_video(&self, video: Video) -> Result<VideoResponse, AppError> {
        let signed = match video.storage_key() {
            Some(key) => Some(self.sign(key).await?),
            None => None,
        };
        Ok(VideoResponse::with_signed_url(video, signed))
    }
}
