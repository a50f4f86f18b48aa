//! Axum route handlers for applications and stored files.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::applications::intake::{submit_application, Submission, UploadedFile};
use crate::applications::query::{
    file_info, list_applications, preview_file, FileInfo, FilePreview,
};
use crate::errors::AppError;
use crate::models::application::ApplicationView;
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const COVER_LETTER_FIELD: &str = "coverLetter";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JobFilter {
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub success: bool,
    pub message: String,
    pub application_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationView>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/apply
///
/// Multipart form: applicant fields, `resume` file, optional `coverLetter` file.
pub async fn handle_apply(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApplyResponse>), AppError> {
    let submission = read_submission(multipart).await?;
    let application_id =
        submit_application(&state.files, &state.jobs, state.store.as_ref(), submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplyResponse {
            success: true,
            message: "Application submitted successfully".to_string(),
            application_id,
        }),
    ))
}

/// GET /api/applications[?job_id=]
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Json<ApplicationListResponse> {
    let applications = list_applications(state.store.as_ref(), filter.job_id.as_deref()).await;
    Json(ApplicationListResponse { applications })
}

/// GET /api/applications/:job_id
pub async fn handle_list_applications_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Json<ApplicationListResponse> {
    let applications = list_applications(state.store.as_ref(), Some(&job_id)).await;
    Json(ApplicationListResponse { applications })
}

/// GET /download/*filename
///
/// Serves the stored bytes inline so browsers can render PDFs in place.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let (safe_name, path) = state
        .files
        .existing(&filename)
        .await
        .ok_or_else(|| AppError::NotFound(format!("File {filename} not found")))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Storage(format!("reading {}: {e}", path.display())))?;
    debug!("Serving {safe_name} ({} bytes)", bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, mime_for(&safe_name)),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{safe_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/preview/:filename
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<FilePreview>, AppError> {
    let preview = preview_file(&state.files, state.store.as_ref(), &filename).await?;
    Ok(Json(preview))
}

/// GET /api/file-info/:filename
pub async fn handle_file_info(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<FileInfo>, AppError> {
    let info = file_info(&state.files, state.store.as_ref(), &filename).await?;
    Ok(Json(info))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            RESUME_FIELD | COVER_LETTER_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await.map_err(multipart_error)?;
                let upload = Some(UploadedFile { filename, content });
                if name == RESUME_FIELD {
                    submission.resume = upload;
                } else {
                    submission.cover_letter = upload;
                }
            }
            _ => {
                let value = field.text().await.map_err(multipart_error)?;
                submission.fields.insert(name, value);
            }
        }
    }

    Ok(submission)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(format!("Malformed multipart body: {}", e.body_text()))
    }
}

fn mime_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_by_extension() {
        assert_eq!(mime_for("a.PDF"), "application/pdf");
        assert_eq!(mime_for("a.doc"), "application/msword");
        assert_eq!(
            mime_for("a.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(mime_for("a.txt"), "text/plain");
        assert_eq!(mime_for("a.bin"), "application/octet-stream");
        assert_eq!(mime_for("noext"), "application/octet-stream");
    }
}
