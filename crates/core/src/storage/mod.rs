//! Object storage for application documents and inspection photos, using
//! Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, MinIO
//! - Azure Blob Storage
//! - Local filesystem (development only)
//! - Process memory (tests)
//!
//! # Key layout
//!
//! ```text
//! applications/{application_id}/documents/{document_id}/{filename}
//! applications/{application_id}/inspections/{checklist_id}/{index}-{filename}
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{PresignedUrl, StorageService, sanitize_filename};
