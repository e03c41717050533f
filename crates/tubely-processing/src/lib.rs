//! Video ingestion pipeline for Tubely.
//!
//! An upload is validated, staged to a local file, probed for geometry,
//! classified by aspect ratio, remuxed for fast start and pushed to object
//! storage under `{aspect}/{video_id}.{ext}`. Staged files are removed on
//! every exit path.

pub mod locks;
pub mod pipeline;
pub mod presign;
pub mod probe;
pub mod process;
pub mod remux;
pub mod repository;
pub mod staging;
pub mod validator;

pub use locks::UploadLocks;
pub use pipeline::{PipelineStage, VideoUploadPipeline};
pub use presign::VideoUrlSigner;
pub use probe::{FfprobeProber, MediaProber, ProbeResult};
pub use process::ToolError;
pub use remux::{FfmpegFastStart, Transcoder};
pub use repository::{InMemoryVideoRepository, VideoRepository};
pub use staging::{StagedFiles, StagingArea};
pub use validator::{UploadRequest, UploadValidator, ValidationError};
