//! Tubely Storage Library
//!
//! Storage abstraction for processed videos, with an S3 backend built on
//! `object_store` and a local filesystem backend that serves HMAC-signed URLs.
//!
//! # Storage key format
//!
//! Processed videos live at `{aspect}/{video_id}.{extension}`, for example
//! `landscape/6f1c...e2.mp4`. Re-uploading a video overwrites the same key.
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
mod signing;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{key_from_signed_url, video_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::{S3Settings, S3Storage};
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
