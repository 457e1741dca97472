//! Storage service implementation using Apache OpenDAL.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use opendal::{Operator, services};
use serde::Serialize;
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Presigned URL for a download.
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use.
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

/// Storage service for documents and inspection photos.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder).map_err(configuration)?.finish()
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);
                Operator::new(builder).map_err(configuration)?.finish()
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                Operator::new(services::Fs::default().root(root))
                    .map_err(configuration)?
                    .finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(configuration)?
                .finish(),
        };

        Ok(operator)
    }

    /// Validate an upload against the size limit and MIME allow-list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty, too large, or of a disallowed type.
    pub fn validate_upload(
        &self,
        filename: &str,
        content_type: &str,
        size: u64,
    ) -> Result<(), StorageError> {
        if size == 0 {
            return Err(StorageError::EmptyFile {
                filename: filename.to_string(),
            });
        }

        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Storage key for an application document.
    #[must_use]
    pub fn document_key(application_id: Uuid, document_id: Uuid, filename: &str) -> String {
        format!(
            "applications/{application_id}/documents/{document_id}/{}",
            sanitize_filename(filename)
        )
    }

    /// Storage key for the `index`-th photo of an inspection.
    #[must_use]
    pub fn inspection_image_key(
        application_id: Uuid,
        checklist_id: Uuid,
        index: usize,
        filename: &str,
    ) -> String {
        format!(
            "applications/{application_id}/inspections/{checklist_id}/{index}-{}",
            sanitize_filename(filename)
        )
    }

    /// Write an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub async fn upload(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), StorageError> {
        // fs and memory reject a content type they cannot store
        if self.operator.info().full_capability().write_with_content_type {
            self.operator
                .write_with(key, data)
                .content_type(content_type)
                .await
                .map_err(StorageError::from)?;
        } else {
            self.operator
                .write(key, data)
                .await
                .map_err(StorageError::from)?;
        }
        Ok(())
    }

    /// Read an object into memory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the key does not exist.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let buffer = self.operator.read(key).await.map_err(StorageError::from)?;
        Ok(buffer.to_bytes())
    }

    /// Generate presigned URL for download.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PresignNotSupported` for providers that cannot
    /// presign (local filesystem, memory).
    pub async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        let ttl = Duration::from_secs(self.config.presign_download_ttl_secs);

        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(
                    i64::try_from(self.config.presign_download_ttl_secs).unwrap_or(i64::MAX),
                ),
        })
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Delete several objects, logging instead of failing on individual errors.
    ///
    /// Used to undo partial uploads after a later step fails.
    pub async fn delete_all(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to remove orphaned object");
            }
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

fn configuration(err: opendal::Error) -> StorageError {
    StorageError::configuration(err.to_string())
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        sanitized
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Only allow-listed MIME types are accepted.
        #[test]
        fn prop_mime_type_validation(mime_type in "[a-z]+/[a-z0-9-]+") {
            let config = StorageConfig::new(StorageProvider::Memory);
            let service = StorageService::from_config(config.clone())
                .expect("should create service");

            let result = service.validate_upload("f", &mime_type, 1024);
            if config.is_mime_type_allowed(&mime_type) {
                prop_assert!(result.is_ok());
            } else {
                let is_invalid_mime = matches!(result, Err(StorageError::InvalidMimeType { .. }));
                prop_assert!(is_invalid_mime);
            }
        }

        /// Files above the configured limit are always rejected.
        #[test]
        fn prop_file_size_validation(
            max_size in 1024u64..10_000_000,
            file_size in 1u64..20_000_000,
        ) {
            let config = StorageConfig::new(StorageProvider::Memory).with_max_file_size(max_size);
            let service = StorageService::from_config(config).expect("should create service");

            let result = service.validate_upload("f.pdf", "application/pdf", file_size);
            if file_size <= max_size {
                prop_assert!(result.is_ok());
            } else {
                let is_too_large = matches!(result, Err(StorageError::FileTooLarge { .. }));
                prop_assert!(is_too_large);
            }
        }

        /// Sanitized names never contain path separators or non-ASCII.
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);
            prop_assert!(!sanitized.is_empty());
            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized filename: {}", c);
            }
        }

        /// Document keys have exactly five segments under `applications/`.
        #[test]
        fn prop_document_key_shape(filename in ".{0,40}") {
            let key = StorageService::document_key(Uuid::new_v4(), Uuid::new_v4(), &filename);
            let parts: Vec<&str> = key.split('/').collect();
            prop_assert_eq!(parts.len(), 5);
            prop_assert_eq!(parts[0], "applications");
            prop_assert_eq!(parts[2], "documents");
        }
    }
}
