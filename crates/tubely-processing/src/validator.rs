use bytes::Bytes;
use tubely_core::{AppError, TubelyConfig};
use uuid::Uuid;

/// An authenticated upload, as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub video_id: Uuid,
    pub user_id: Uuid,
    pub content_type: String,
    pub data: Bytes,
}

/// Upload body validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type: {content_type} (expected: {expected})")]
    InvalidContentType {
        content_type: String,
        expected: String,
    },

    #[error("Missing content type")]
    MissingContentType,

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

pub struct UploadValidator {
    max_file_size: u64,
    accepted_content_type: String,
}

impl UploadValidator {
    pub fn new(max_file_size: u64, accepted_content_type: impl Into<String>) -> Self {
        Self {
            max_file_size,
            accepted_content_type: accepted_content_type.into(),
        }
    }

    pub fn from_config(config: &TubelyConfig) -> Self {
        Self::new(
            config.max_video_size_bytes,
            config.accepted_content_type.clone(),
        )
    }

    /// The limit is inclusive: a body of exactly `max_file_size` bytes passes.
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Exact match, no parameter or case folding.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        if content_type.is_empty() {
            return Err(ValidationError::MissingContentType);
        }

        if content_type != self.accepted_content_type {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                expected: self.accepted_content_type.clone(),
            });
        }

        Ok(())
    }

    pub fn validate(&self, request: &UploadRequest) -> Result<(), ValidationError> {
        self.validate_file_size(request.data.len() as u64)?;
        self.validate_content_type(&request.content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> UploadValidator {
        UploadValidator::new(1024, "video/mp4")
    }

    #[test]
    fn size_limit_is_inclusive() {
        let v = validator();
        assert!(v.validate_file_size(1024).is_ok());
        assert!(matches!(
            v.validate_file_size(1025),
            Err(ValidationError::FileTooLarge {
                size: 1025,
                max: 1024
            })
        ));
        assert!(matches!(
            v.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn only_exact_content_type_is_accepted() {
        let v = validator();
        assert!(v.validate_content_type("video/mp4").is_ok());
        assert!(v.validate_content_type("video/quicktime").is_err());
        assert!(v.validate_content_type("Video/MP4").is_err());
        assert!(v.validate_content_type("video/mp4; codecs=avc1").is_err());
        assert!(matches!(
            v.validate_content_type(""),
            Err(ValidationError::MissingContentType)
        ));
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let request = UploadRequest {
            video_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content_type: "image/png".to_string(),
            data: Bytes::from_static(b"\x89PNG"),
        };
        let err: AppError = validator().validate(&request).unwrap_err().into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn default_limit_is_one_gibibyte() {
        let v = UploadValidator::from_config(&TubelyConfig::default());
        assert!(v.validate_file_size(1 << 30).is_ok());
        assert!(v.validate_file_size((1 << 30) + 1).is_err());
    }
}
