use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-video-id mutex serializing uploads that target the same video.
///
/// Staging paths are derived from the video id, so two concurrent uploads of
/// one id would otherwise share files. Different ids never contend.
#[derive(Debug, Clone, Default)]
pub struct UploadLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl UploadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `video_id`. Released when the guard drops.
    pub async fn lock(&self, video_id: Uuid) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(video_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        mutex.lock_owned().await
    }

    /// Drop entries nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
