#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::{s3::S3Settings, S3Storage};
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use tubely_core::TubelyConfig;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &TubelyConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .filter(|b| !b.is_empty())
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;

            let storage = S3Storage::new(S3Settings {
                bucket,
                region,
                endpoint_url: config.s3_endpoint.clone(),
                access_key_id: config.aws_access_key_id.clone(),
                secret_access_key: config.aws_secret_access_key.clone(),
            })?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;
            let secret = config.url_signing_secret.clone().ok_or_else(|| {
                StorageError::ConfigError("URL_SIGNING_SECRET not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path, base_url, secret.into_bytes()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn local_backend_from_config() {
        let dir = tempdir().unwrap();
        let config = TubelyConfig {
            storage_backend: StorageBackend::Local,
            local_storage_path: Some(dir.path().to_string_lossy().into_owned()),
            local_storage_base_url: Some("http://localhost:8091/assets/".to_string()),
            url_signing_secret: Some("0123456789abcdef".to_string()),
            ..TubelyConfig::default()
        };

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);

        let url = storage
            .get_presigned_url("other/a.mp4", config.presigned_url_ttl())
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:8091/assets/other/a.mp4?"));
    }

    #[tokio::test]
    async fn missing_bucket_is_config_error() {
        let config = TubelyConfig::default();
        assert!(matches!(
            create_storage(&config).await,
            Err(StorageError::ConfigError(_))
        ));
    }
}
