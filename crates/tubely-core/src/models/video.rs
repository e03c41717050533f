use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Video record as kept by the metadata store.
///
/// `video_url` holds the object key (`landscape/{id}.mp4`), never a URL.
/// Signed URLs are derived from it at read time, see [`VideoResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(user_id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: description.into(),
            video_url: None,
            thumbnail_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Video as returned to callers, with the stored key replaced by a signed URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    pub fn with_signed_url(video: Video, signed_url: Option<String>) -> Self {
        VideoResponse {
            id: video.id,
            user_id: video.user_id,
            title: video.title,
            description: video.description,
            video_url: signed_url,
            thumbnail_url: video.thumbnail_url,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}
