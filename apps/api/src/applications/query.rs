//! Read side: listings, previews and file info.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::extract::extract_preview;
use crate::models::application::{Application, ApplicationView, FileDescriptor, FileMetadata};
use crate::storage::files::{extension_of, is_pdf, DocumentKind, FileStore};
use crate::storage::ApplicationRepository;

pub const UNKNOWN_APPLICANT: &str = "Unknown Applicant";
pub const PREVIEW_NOT_AVAILABLE: &str = "Preview not available";
pub const PREVIEW_UNSUPPORTED_TYPE: &str = "Preview not available for this file type";

#[derive(Debug, Serialize)]
pub struct FilePreview {
    pub filename: String,
    pub file_type: String,
    pub applicant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<DateTime<Utc>>,
    pub preview_text: String,
}

#[derive(Debug, Serialize)]
pub struct ApplicationSummary {
    pub application_id: String,
    pub applicant_name: String,
    pub email: String,
    pub position: String,
    pub job_id: String,
    pub submission_date: DateTime<Utc>,
}

impl From<&FileMetadata> for ApplicationSummary {
    fn from(meta: &FileMetadata) -> Self {
        Self {
            application_id: meta.application_id.clone(),
            applicant_name: meta.applicant_name.clone(),
            email: meta.email.clone(),
            position: meta.position.clone(),
            job_id: meta.job_id.clone(),
            submission_date: meta.submission_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationSummary>,
}

pub fn file_descriptor(application: &Application, filename: String, kind: DocumentKind) -> FileDescriptor {
    FileDescriptor {
        original_name: format!(
            "{}_{}_{}",
            application.applicant.first_name,
            application.applicant.last_name,
            kind.label()
        ),
        download_url: format!("/download/{filename}"),
        preview_url: format!("/api/preview/{filename}"),
        filename,
    }
}

pub fn to_view(application: &Application) -> ApplicationView {
    ApplicationView {
        id: application.id.clone(),
        job_id: application.job_id.clone(),
        timestamp: application.timestamp,
        applicant: application.applicant.clone(),
        resume: file_descriptor(
            application,
            application.resume_filename(),
            DocumentKind::Resume,
        ),
        cover_letter: application
            .cover_letter_filename()
            .map(|f| file_descriptor(application, f, DocumentKind::CoverLetter)),
    }
}

pub async fn list_applications(
    store: &dyn ApplicationRepository,
    job_id: Option<&str>,
) -> Vec<ApplicationView> {
    let applications = match job_id {
        Some(job_id) => store.list_by_job(job_id).await,
        None => store.list().await,
    };
    applications.iter().map(to_view).collect()
}

/// Metadata for the application owning `filename`, if the lookup table knows it.
async fn metadata_for_file(
    store: &dyn ApplicationRepository,
    filename: &str,
) -> Result<Option<FileMetadata>, AppError> {
    match store.application_for_file(filename).await? {
        Some(application_id) => Ok(store.file_metadata(&application_id).await?),
        None => Ok(None),
    }
}

pub async fn preview_file(
    files: &FileStore,
    store: &dyn ApplicationRepository,
    filename: &str,
) -> Result<FilePreview, AppError> {
    let (filename, path) = files
        .existing(filename)
        .await
        .ok_or_else(|| AppError::NotFound(format!("File {filename} not found")))?;
    let file_type = extension_of(&filename).unwrap_or_default();

    let Some(meta) = metadata_for_file(store, &filename).await? else {
        return Ok(FilePreview {
            filename,
            file_type,
            applicant_name: UNKNOWN_APPLICANT.to_string(),
            email: None,
            position: None,
            job_id: None,
            submission_date: None,
            preview_text: PREVIEW_NOT_AVAILABLE.to_string(),
        });
    };

    let preview_text = match meta.preview_for(&filename) {
        Some(cached) => cached.to_string(),
        None if is_pdf(&filename) => extract_preview(path).await,
        None => PREVIEW_UNSUPPORTED_TYPE.to_string(),
    };

    Ok(FilePreview {
        filename,
        file_type,
        applicant_name: meta.applicant_name,
        email: Some(meta.email),
        position: Some(meta.position),
        job_id: Some(meta.job_id),
        submission_date: Some(meta.submission_date),
        preview_text,
    })
}

pub async fn file_info(
    files: &FileStore,
    store: &dyn ApplicationRepository,
    filename: &str,
) -> Result<FileInfo, AppError> {
    let (filename, path) = files
        .existing(filename)
        .await
        .ok_or_else(|| AppError::NotFound(format!("File {filename} not found")))?;

    let stat = files.stat(&path).await?;
    let application = metadata_for_file(store, &filename)
        .await?
        .as_ref()
        .map(ApplicationSummary::from);

    Ok(FileInfo {
        filename,
        size: stat.size,
        created: stat.created,
        modified: stat.modified,
        application,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::extract::EXTRACTION_FALLBACK;
    use crate::models::application::fixtures::application;
    use crate::storage::metadata::JsonStore;

    async fn setup() -> (TempDir, FileStore, JsonStore) {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let files = FileStore::new(dir.path());
        let store = JsonStore::open(dir.path().join("metadata")).await.unwrap();
        (dir, files, store)
    }

    /// Commits an application whose files exist on disk under `files`.
    async fn seed(
        files: &FileStore,
        store: &JsonStore,
        id: &str,
        job: &str,
        resume_preview: Option<&str>,
        with_cover_letter: bool,
    ) -> Application {
        let mut app = application(id, job);
        app.resume_path = files.root().join(format!("Ada_Lovelace_{id}.pdf"));
        std::fs::write(&app.resume_path, b"not a pdf").unwrap();
        if with_cover_letter {
            let cl = files.root().join(format!("Ada_Lovelace_CL_{id}.txt"));
            std::fs::write(&cl, b"letter").unwrap();
            app.cover_letter_path = Some(cl);
        }
        let meta = FileMetadata::for_application(&app, resume_preview.map(String::from), None);
        store.add(app.clone(), meta).await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_listing_replaces_paths_with_descriptors() {
        let (_dir, files, store) = setup().await;
        seed(&files, &store, "a1", "1", None, true).await;

        let views = list_applications(&store, None).await;
        assert_eq!(views.len(), 1);
        let value = serde_json::to_value(&views[0]).unwrap();
        assert!(value.get("resume_path").is_none());
        assert!(value.get("cover_letter_path").is_none());
        assert_eq!(value["resume"]["filename"], "Ada_Lovelace_a1.pdf");
        assert_eq!(value["resume"]["original_name"], "Ada_Lovelace_Resume");
        assert_eq!(value["resume"]["download_url"], "/download/Ada_Lovelace_a1.pdf");
        assert_eq!(value["cover_letter"]["original_name"], "Ada_Lovelace_CoverLetter");
        assert_eq!(value["firstName"], "Ada");
    }

    #[tokio::test]
    async fn test_listing_by_job() {
        let (_dir, files, store) = setup().await;
        seed(&files, &store, "a1", "1", None, false).await;
        seed(&files, &store, "a2", "2", None, false).await;

        let views = list_applications(&store, Some("2")).await;
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, "a2");
        assert!(views[0].cover_letter.is_none());
    }

    #[tokio::test]
    async fn test_preview_uses_cached_text() {
        let (_dir, files, store) = setup().await;
        seed(&files, &store, "a1", "1", Some("cached resume text"), false).await;

        let preview = preview_file(&files, &store, "Ada_Lovelace_a1.pdf").await.unwrap();
        assert_eq!(preview.preview_text, "cached resume text");
        assert_eq!(preview.applicant_name, "Ada Lovelace");
        assert_eq!(preview.file_type, "pdf");
        assert_eq!(preview.job_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_preview_extracts_on_demand_for_pdf() {
        let (_dir, files, store) = setup().await;
        seed(&files, &store, "a1", "1", None, false).await;

        let preview = preview_file(&files, &store, "Ada_Lovelace_a1.pdf").await.unwrap();
        assert_eq!(preview.preview_text, EXTRACTION_FALLBACK);
    }

    #[tokio::test]
    async fn test_preview_non_pdf_without_cache() {
        let (_dir, files, store) = setup().await;
        seed(&files, &store, "a1", "1", None, true).await;

        let preview = preview_file(&files, &store, "Ada_Lovelace_CL_a1.txt").await.unwrap();
        assert_eq!(preview.preview_text, PREVIEW_UNSUPPORTED_TYPE);
    }

    #[tokio::test]
    async fn test_preview_without_metadata() {
        let (dir, files, store) = setup().await;
        std::fs::write(dir.path().join("stray.pdf"), b"x").unwrap();

        let preview = preview_file(&files, &store, "stray.pdf").await.unwrap();
        assert_eq!(preview.applicant_name, UNKNOWN_APPLICANT);
        assert_eq!(preview.preview_text, PREVIEW_NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn test_preview_missing_file_not_found() {
        let (_dir, files, store) = setup().await;
        let err = preview_file(&files, &store, "ghost.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_file_info_with_and_without_metadata() {
        let (dir, files, store) = setup().await;
        seed(&files, &store, "a1", "3", None, false).await;
        std::fs::write(dir.path().join("stray.txt"), b"12345").unwrap();

        let info = file_info(&files, &store, "Ada_Lovelace_a1.pdf").await.unwrap();
        let summary = info.application.unwrap();
        assert_eq!(summary.application_id, "a1");
        assert_eq!(summary.job_id, "3");
        assert_eq!(info.size, b"not a pdf".len() as u64);

        let info = file_info(&files, &store, "stray.txt").await.unwrap();
        assert!(info.application.is_none());
        assert_eq!(info.size, 5);
        assert!(info.modified.is_some());
    }

    #[tokio::test]
    async fn test_file_info_traversal_stays_inside_root() {
        let (_dir, files, store) = setup().await;
        let err = file_info(&files, &store, "../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
