//! Shared fakes and fixtures for pipeline integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tubely_core::{StorageBackend, TubelyConfig, Video};
use tubely_processing::{
    InMemoryVideoRepository, MediaProber, ProbeResult, ToolError, Transcoder, UploadLocks,
    UploadRequest, VideoUploadPipeline,
};
use tubely_storage::{LocalStorage, Storage, StorageError, StorageResult};
use uuid::Uuid;

pub const BASE_URL: &str = "http://localhost:8091/assets";

/// Prober returning fixed dimensions, or failing like ffprobe on a corrupt file.
pub struct FakeProber {
    result: Option<ProbeResult>,
    pub calls: AtomicUsize,
}

impl FakeProber {
    pub fn returning(width: u32, height: u32) -> Self {
        Self {
            result: Some(ProbeResult { width, height }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "raw file must be staged before probing");
        self.result.ok_or_else(|| ToolError::Failed {
            tool: "ffprobe",
            status: "exit status: 1".to_string(),
            stderr: "moov atom not found".to_string(),
        })
    }
}

/// Transcoder that prefixes the raw bytes, or leaves a partial file and fails.
///
/// A delay keeps the remux in flight long enough for tests to race it.
pub struct FakeTranscoder {
    fail: bool,
    delay: Duration,
    active: AtomicUsize,
    pub calls: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl FakeTranscoder {
    pub fn copying() -> Self {
        Self {
            fail: false,
            delay: Duration::ZERO,
            active: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::copying()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::copying()
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn remux(&self, input: &Path) -> Result<PathBuf, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(active, Ordering::SeqCst);
        let result = self.write_output(input).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl FakeTranscoder {
    async fn write_output(&self, input: &Path) -> Result<PathBuf, ToolError> {
        let output = self.output_path(input);
        tokio::time::sleep(self.delay).await;

        if self.fail {
            tokio::fs::write(&output, b"partial").await.unwrap();
            return Err(ToolError::Failed {
                tool: "ffmpeg",
                status: "exit status: 1".to_string(),
                stderr: "Conversion failed!".to_string(),
            });
        }

        let mut data = b"faststart:".to_vec();
        data.extend(tokio::fs::read(input).await.unwrap());
        tokio::fs::write(&output, data).await.unwrap();
        Ok(output)
    }
}

/// Local storage that counts uploads and can be told to reject them.
pub struct CountingStorage {
    inner: LocalStorage,
    fail_uploads: bool,
    pub uploads: AtomicUsize,
}

impl CountingStorage {
    pub async fn new(root: &Path, fail_uploads: bool) -> Self {
        Self {
            inner: LocalStorage::new(root, BASE_URL.to_string(), "integration-test-secret")
                .await
                .unwrap(),
            fail_uploads,
            uploads: AtomicUsize::new(0),
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn upload_file(&self, key: &str, path: &Path, content_type: &str) -> StorageResult<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads {
            return Err(StorageError::UploadFailed("connection reset by peer".to_string()));
        }
        self.inner.upload_file(key, path, content_type).await
    }

    async fn get_presigned_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        self.inner.get_presigned_url(key, expires_in).await
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        self.inner.key_from_url(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub config: TubelyConfig,
    pub repository: Arc<InMemoryVideoRepository>,
    pub storage: Arc<CountingStorage>,
    pub prober: Arc<FakeProber>,
    pub transcoder: Arc<FakeTranscoder>,
    pub locks: UploadLocks,
    pub pipeline: VideoUploadPipeline,
    pub video: Video,
}

impl Harness {
    pub async fn new(prober: FakeProber, transcoder: FakeTranscoder) -> Self {
        Self::build(prober, transcoder, false).await
    }

    pub async fn with_failing_storage(prober: FakeProber, transcoder: FakeTranscoder) -> Self {
        Self::build(prober, transcoder, true).await
    }

    async fn build(prober: FakeProber, transcoder: FakeTranscoder, fail_uploads: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let repository = Arc::new(InMemoryVideoRepository::new());
        let video = Video::new(Uuid::new_v4(), "Boots", "Boots in the snow");
        repository.insert(video.clone()).await;

        let storage = Arc::new(CountingStorage::new(&dir.path().join("store"), fail_uploads).await);
        let prober = Arc::new(prober);
        let transcoder = Arc::new(transcoder);

        let locks = UploadLocks::new();

        let pipeline = VideoUploadPipeline::new(
            &config,
            repository.clone(),
            storage.clone(),
            prober.clone(),
            transcoder.clone(),
        )
        .with_locks(locks.clone());

        Self {
            dir,
            config,
            repository,
            storage,
            prober,
            transcoder,
            locks,
            pipeline,
            video,
        }
    }

    /// Another pipeline over the same collaborators and staging directory.
    pub fn sibling_pipeline(&self, locks: UploadLocks) -> VideoUploadPipeline {
        VideoUploadPipeline::new(
            &self.config,
            self.repository.clone(),
            self.storage.clone(),
            self.prober.clone(),
            self.transcoder.clone(),
        )
        .with_locks(locks)
    }

    pub fn request(&self) -> UploadRequest {
        UploadRequest {
            video_id: self.video.id,
            user_id: self.video.user_id,
            content_type: "video/mp4".to_string(),
            data: Bytes::from_static(b"\x00\x00\x00\x18ftypmp42 fake video body"),
        }
    }

    pub async fn stored_video(&self) -> Video {
        use tubely_processing::VideoRepository;
        self.repository
            .get_video(self.video.id)
            .await
            .unwrap()
            .unwrap()
    }

    /// Bytes the local backend holds under `key`.
    pub fn stored_bytes(&self, key: &str) -> Vec<u8> {
        std::fs::read(self.dir.path().join("store").join(key)).unwrap()
    }

    /// Files left in the staging directory (a missing directory counts as empty).
    pub fn staged_files(&self) -> Vec<PathBuf> {
        staged_files(&self.config.staging_dir)
    }
}

pub fn test_config(root: &Path) -> TubelyConfig {
    TubelyConfig {
        storage_backend: StorageBackend::Local,
        local_storage_path: Some(root.join("store").to_string_lossy().into_owned()),
        local_storage_base_url: Some(BASE_URL.to_string()),
        url_signing_secret: Some("integration-test-secret".to_string()),
        staging_dir: root.join("staging"),
        ..TubelyConfig::default()
    }
}

pub fn staged_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}
