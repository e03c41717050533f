use crate::keys::{encode_key, validate_key};
use crate::signing;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Local filesystem storage implementation
///
/// Objects are written beneath `base_path/{key}` and served from
/// `base_url/{key}`; access URLs carry an expiry and an HMAC signature that
/// the serving side checks with [`LocalStorage::verify_signed_url`].
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/tubely/assets")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8091/assets")
    /// * `signing_secret` - HMAC key for signed URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        let signing_secret = signing_secret.into();

        if signing_secret.is_empty() {
            return Err(StorageError::ConfigError(
                "URL signing secret must not be empty".to_string(),
            ));
        }

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_secret,
        })
    }

    /// Convert storage key to filesystem path with traversal checks
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.base_path.join(storage_key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn signed_url(&self, storage_key: &str, expires_at: u64) -> StorageResult<String> {
        let signature = signing::sign(&self.signing_secret, storage_key, expires_at)?;
        Ok(format!(
            "{}/{}?expires={}&signature={}",
            self.base_url,
            encode_key(storage_key),
            expires_at,
            signature
        ))
    }

    /// Check a URL produced by this backend and return the key it grants access to.
    pub fn verify_signed_url(&self, url: &str) -> StorageResult<String> {
        self.verify_signed_url_at(url, signing::now_unix())
    }

    fn verify_signed_url_at(&self, url: &str, now: u64) -> StorageResult<String> {
        let storage_key = self
            .key_from_url(url)
            .ok_or_else(|| StorageError::InvalidSignature("URL has no storage key".to_string()))?;

        let query = url
            .split_once('?')
            .map(|(_, q)| q)
            .ok_or_else(|| StorageError::InvalidSignature("missing query string".to_string()))?;

        let mut expires_at = None;
        let mut signature = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", value)) => expires_at = value.parse::<u64>().ok(),
                Some(("signature", value)) => signature = Some(value),
                _ => {}
            }
        }

        let expires_at = expires_at
            .ok_or_else(|| StorageError::InvalidSignature("missing expires".to_string()))?;
        let signature = signature
            .ok_or_else(|| StorageError::InvalidSignature("missing signature".to_string()))?;

        signing::verify(
            &self.signing_secret,
            &storage_key,
            expires_at,
            signature,
            now,
        )?;
        Ok(storage_key)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_file(
        &self,
        storage_key: &str,
        source: &Path,
        _content_type: &str,
    ) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let bytes_copied = fs::copy(source, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        self.signed_url(storage_key, signing::expiry_after(expires_in))
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        let path = url.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        let path = path.split(['?', '#']).next()?;
        let key = urlencoding::decode(path).ok()?.into_owned();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
