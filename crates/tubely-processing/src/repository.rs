//! Video metadata store seam.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tubely_core::{AppError, Video};
use uuid::Uuid;

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get_video(&self, video_id: Uuid) -> Result<Option<Video>, AppError>;

    /// Store `storage_key` on the record and bump `updated_at`, leaving every
    /// other field as the store currently has it. Returns the updated record.
    async fn set_video_key(&self, video_id: Uuid, storage_key: &str) -> Result<Video, AppError>;
}

/// Process-local repository, used by the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<Uuid, Video>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, video: Video) {
        self.videos.write().await.insert(video.id, video);
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get_video(&self, video_id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos.read().await.get(&video_id).cloned())
    }

    async fn set_video_key(&self, video_id: Uuid, storage_key: &str) -> Result<Video, AppError> {
        let mut videos = self.videos.write().await;
        let video = videos
            .get_mut(&video_id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;
        video.video_url = Some(storage_key.to_string());
        video.updated_at = Utc::now();
        Ok(video.clone())
    }
}
