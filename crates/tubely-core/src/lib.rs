//! Tubely Core Library
//!
//! Domain models, error types and configuration shared by the storage,
//! processing and command-line crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::TubelyConfig;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{AspectRatio, Video, VideoResponse};
pub use storage_types::StorageBackend;
