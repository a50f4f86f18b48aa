//! Persistence for uploads and application records.
//!
//! `AppState` holds an `Arc<dyn ApplicationRepository>`; the JSON-file backend
//! in [`metadata`] can be replaced by an embedded database without touching
//! handlers or the intake pipeline.

pub mod files;
pub mod metadata;

use async_trait::async_trait;

use crate::models::application::{Application, FileMetadata};
use crate::storage::metadata::StoreError;

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Durably records `application` and its file metadata, then makes it visible to readers.
    async fn add(&self, application: Application, metadata: FileMetadata) -> Result<(), StoreError>;

    /// All applications in submission order.
    async fn list(&self) -> Vec<Application>;

    async fn list_by_job(&self, job_id: &str) -> Vec<Application>;

    /// Replaces the in-memory view with what is on disk. Returns the number loaded.
    async fn reload(&self) -> Result<usize, StoreError>;

    /// Application that owns the stored file `filename`, if any.
    async fn application_for_file(&self, filename: &str) -> Result<Option<String>, StoreError>;

    async fn file_metadata(&self, application_id: &str) -> Result<Option<FileMetadata>, StoreError>;
}
