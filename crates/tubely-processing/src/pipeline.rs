//! Upload orchestration: validate → stage → probe → classify → remux →
//! upload → update record → clean up.

use crate::locks::UploadLocks;
use crate::probe::{FfprobeProber, MediaProber};
use crate::remux::{FfmpegFastStart, Transcoder};
use crate::repository::VideoRepository;
use crate::staging::{StagedFiles, StagingArea};
use crate::validator::{UploadRequest, UploadValidator};
use std::fmt;
use std::sync::Arc;
use tubely_core::models::media_type_to_ext;
use tubely_core::{AppError, AspectRatio, ErrorMetadata, LogLevel, TubelyConfig, Video};
use tubely_storage::{video_key, Storage};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Validated,
    Staged,
    Probed,
    Classified,
    Transcoded,
    Uploaded,
    MetadataUpdated,
    CleanedUp,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Validated => "validated",
            PipelineStage::Staged => "staged",
            PipelineStage::Probed => "probed",
            PipelineStage::Classified => "classified",
            PipelineStage::Transcoded => "transcoded",
            PipelineStage::Uploaded => "uploaded",
            PipelineStage::MetadataUpdated => "metadata_updated",
            PipelineStage::CleanedUp => "cleaned_up",
            PipelineStage::Failed => "failed",
        }
    }

    /// Stage reached on success, `None` for terminal stages.
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Received => Some(PipelineStage::Validated),
            PipelineStage::Validated => Some(PipelineStage::Staged),
            PipelineStage::Staged => Some(PipelineStage::Probed),
            PipelineStage::Probed => Some(PipelineStage::Classified),
            PipelineStage::Classified => Some(PipelineStage::Transcoded),
            PipelineStage::Transcoded => Some(PipelineStage::Uploaded),
            PipelineStage::Uploaded => Some(PipelineStage::MetadataUpdated),
            PipelineStage::MetadataUpdated => Some(PipelineStage::CleanedUp),
            PipelineStage::CleanedUp | PipelineStage::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    pub fn can_transition_to(&self, target: PipelineStage) -> bool {
        match target {
            PipelineStage::Failed => !self.is_terminal(),
            other => self.next() == Some(other),
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current stage of one upload and logs every transition.
struct StageTracker {
    video_id: Uuid,
    current: PipelineStage,
}

impl StageTracker {
    fn new(video_id: Uuid) -> Self {
        tracing::debug!(video_id = %video_id, stage = %PipelineStage::Received, "Upload received");
        Self {
            video_id,
            current: PipelineStage::Received,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(
            self.current.can_transition_to(next),
            "invalid transition {} -> {}",
            self.current,
            next
        );
        tracing::info!(
            video_id = %self.video_id,
            from = %self.current,
            stage = %next,
            "Upload pipeline stage reached"
        );
        self.current = next;
    }

    fn fail(&mut self, error: &AppError) {
        let failed_at = self.current;
        match error.log_level() {
            LogLevel::Error => tracing::error!(
                video_id = %self.video_id,
                failed_at = %failed_at,
                error_code = error.error_code(),
                error = %error,
                "Upload pipeline failed"
            ),
            LogLevel::Warn | LogLevel::Debug => tracing::warn!(
                video_id = %self.video_id,
                failed_at = %failed_at,
                error_code = error.error_code(),
                error = %error,
                "Upload rejected"
            ),
        }
        self.current = PipelineStage::Failed;
    }
}

/// Orchestrates one video upload end to end.
///
/// Every collaborator is injected; nothing is read from globals.
pub struct VideoUploadPipeline {
    repository: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    prober: Arc<dyn MediaProber>,
    transcoder: Arc<dyn Transcoder>,
    staging: StagingArea,
    validator: UploadValidator,
    locks: UploadLocks,
}

impl VideoUploadPipeline {
    pub fn new(
        config: &TubelyConfig,
        repository: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        prober: Arc<dyn MediaProber>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            repository,
            storage,
            prober,
            transcoder,
            staging: StagingArea::new(config.staging_dir.clone()),
            validator: UploadValidator::from_config(config),
            locks: UploadLocks::new(),
        }
    }

    /// Share `locks` with other pipelines writing to the same staging
    /// directory, so same-id uploads stay serialized across them.
    pub fn with_locks(mut self, locks: UploadLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Pipeline backed by the configured ffprobe and ffmpeg binaries.
    pub fn from_config(
        config: &TubelyConfig,
        repository: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, AppError> {
        let prober = FfprobeProber::from_config(config)
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        let transcoder = FfmpegFastStart::from_config(config)
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        Ok(Self::new(
            config,
            repository,
            storage,
            Arc::new(prober),
            Arc::new(transcoder),
        ))
    }

    /// Run an upload through every stage and return the updated record.
    ///
    /// Validation failures return before anything touches disk. Any later
    /// failure removes the staged files before the error is returned.
    pub async fn process(&self, request: UploadRequest) -> Result<Video, AppError> {
        let mut tracker = StageTracker::new(request.video_id);

        if let Err(e) = self.validate(&request).await {
            tracker.fail(&e);
            return Err(e);
        }
        tracker.advance(PipelineStage::Validated);

        let guard = self.locks.lock(request.video_id).await;
        let mut files = StagedFiles::new();

        let result = self.run_stages(&request, &mut files, &mut tracker).await;

        files.cleanup().await;
        drop(guard);
        self.locks.prune();

        match result {
            Ok(video) => {
                tracker.advance(PipelineStage::CleanedUp);
                Ok(video)
            }
            Err(e) => {
                tracker.fail(&e);
                Err(e)
            }
        }
    }

    async fn validate(&self, request: &UploadRequest) -> Result<(), AppError> {
        let video = self
            .repository
            .get_video(request.video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

        if !video.is_owned_by(request.user_id) {
            return Err(AppError::Forbidden("Not authorized to update this video".to_string()));
        }

        self.validator.validate(request)?;
        Ok(())
    }

    async fn run_stages(
        &self,
        request: &UploadRequest,
        files: &mut StagedFiles,
        tracker: &mut StageTracker,
    ) -> Result<Video, AppError> {
        let extension = media_type_to_ext(&request.content_type);

        let raw_path = self
            .staging
            .stage(files, request.video_id, &extension, &request.data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;
        tracker.advance(PipelineStage::Staged);

        let probe = self.prober.probe(&raw_path).await?;
        tracker.advance(PipelineStage::Probed);

        let aspect = AspectRatio::classify(probe.width, probe.height);
        tracing::info!(
            video_id = %request.video_id,
            width = probe.width,
            height = probe.height,
            aspect = %aspect,
            "Video classified"
        );
        tracker.advance(PipelineStage::Classified);

        files.track_processed(self.transcoder.output_path(&raw_path));
        let processed_path = self.transcoder.remux(&raw_path).await?;
        files.track_processed(processed_path.clone());
        tracker.advance(PipelineStage::Transcoded);

        let key = video_key(aspect, request.video_id, &extension);
        self.storage
            .upload_file(&key, &processed_path, &request.content_type)
            .await
            .map_err(|e| AppError::UploadFailure(e.to_string()))?;
        tracker.advance(PipelineStage::Uploaded);

        // Only the key is written; fields changed while the tools ran are kept.
        let video = self.repository.set_video_key(request.video_id, &key).await?;
        tracker.advance(PipelineStage::MetadataUpdated);

        Ok(video)
    }
}
