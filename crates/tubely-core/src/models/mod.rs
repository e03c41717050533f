//! Domain models for the video ingestion pipeline.

pub mod aspect;
pub mod media_type;
pub mod video;

pub use aspect::AspectRatio;
pub use media_type::media_type_to_ext;
pub use video::{Video, VideoResponse};
