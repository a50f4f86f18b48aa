//! Application intake: validate → store files → extract previews → commit.
//!
//! The first failing step ends the submission. Files written for a submission
//! that fails later are removed again, so a rejected submission leaves nothing
//! behind in the content directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::extract_preview;
use crate::models::application::{Applicant, Application, FileMetadata, REQUIRED_FIELDS};
use crate::models::job::JobCatalog;
use crate::storage::files::{is_allowed_file, is_pdf, DocumentKind, FileOwner, FileStore};
use crate::storage::ApplicationRepository;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Bytes,
}

/// A decoded multipart submission.
#[derive(Debug, Default)]
pub struct Submission {
    pub fields: HashMap<String, String>,
    pub resume: Option<UploadedFile>,
    pub cover_letter: Option<UploadedFile>,
}

/// Runs one submission to completion and returns the new application id.
pub async fn submit_application(
    files: &FileStore,
    jobs: &JobCatalog,
    store: &dyn ApplicationRepository,
    submission: Submission,
) -> Result<String, AppError> {
    let Submission {
        mut fields,
        resume,
        cover_letter,
    } = submission;

    // 1. Required fields
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|f| !fields.contains_key(*f))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Required fields missing: {}",
            missing.join(", ")
        )));
    }

    // 2. Job
    let job_id = take(&mut fields, "job_id").trim().to_string();
    if jobs.get(&job_id).is_none() {
        return Err(AppError::JobNotFound {
            job_id,
            available_jobs: jobs.ids(),
        });
    }

    // 3. Resume presence and type
    let resume = resume
        .filter(|f| !f.filename.is_empty())
        .ok_or_else(|| AppError::Validation("Resume file is required".to_string()))?;
    if !is_allowed_file(&resume.filename) {
        return Err(AppError::InvalidFileType(
            "File type not allowed. Please upload PDF, DOC, DOCX, or TXT".to_string(),
        ));
    }

    let applicant = applicant_from_fields(&mut fields);
    let application_id = Uuid::new_v4().to_string();
    let owner = FileOwner {
        first_name: &applicant.first_name,
        last_name: &applicant.last_name,
        application_id: &application_id,
    };

    // 4. Resume
    let resume_path = files
        .store(&resume.filename, &resume.content, &owner, DocumentKind::Resume)
        .await?;

    // 5. Optional cover letter; a disallowed type is skipped, not rejected
    let cover_letter_path = match cover_letter.filter(|f| !f.filename.is_empty()) {
        Some(cl) if is_allowed_file(&cl.filename) => {
            match files
                .store(&cl.filename, &cl.content, &owner, DocumentKind::CoverLetter)
                .await
            {
                Ok(path) => Some(path),
                Err(e) => {
                    discard(files, &[resume_path.as_path()]).await;
                    return Err(e.into());
                }
            }
        }
        Some(cl) => {
            info!(
                "Skipping cover letter '{}' for application {application_id}: file type not allowed",
                cl.filename
            );
            None
        }
        None => None,
    };

    // 6. Record + previews
    let application = Application {
        id: application_id.clone(),
        job_id,
        timestamp: Utc::now(),
        applicant,
        resume_path,
        cover_letter_path,
    };
    let resume_preview = preview_if_pdf(&application.resume_path).await;
    let cover_letter_preview = match &application.cover_letter_path {
        Some(path) => preview_if_pdf(path).await,
        None => None,
    };
    let metadata = FileMetadata::for_application(&application, resume_preview, cover_letter_preview);

    // 7. Commit
    let written: Vec<PathBuf> = std::iter::once(application.resume_path.clone())
        .chain(application.cover_letter_path.clone())
        .collect();
    if let Err(e) = store.add(application, metadata).await {
        let paths: Vec<&Path> = written.iter().map(PathBuf::as_path).collect();
        discard(files, &paths).await;
        return Err(e.into());
    }

    info!("Application {application_id} submitted");
    Ok(application_id)
}

fn take(fields: &mut HashMap<String, String>, key: &str) -> String {
    fields.remove(key).unwrap_or_default()
}

fn applicant_from_fields(fields: &mut HashMap<String, String>) -> Applicant {
    Applicant {
        first_name: take(fields, "firstName"),
        last_name: take(fields, "lastName"),
        email: take(fields, "email"),
        phone: take(fields, "phone"),
        age: take(fields, "age"),
        address: take(fields, "address"),
        city: take(fields, "city"),
        country: take(fields, "country"),
        current_place: take(fields, "currentPlace"),
        availability: take(fields, "availability"),
        linked_in_profile: take(fields, "linkedInProfile"),
        portfolio_website: take(fields, "portfolioWebsite"),
        position: take(fields, "position"),
        experience: take(fields, "experience"),
        education_level: take(fields, "educationLevel"),
        skills: take(fields, "skills"),
    }
}

async fn preview_if_pdf(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    if !is_pdf(&name) {
        return None;
    }
    Some(extract_preview(path.to_path_buf()).await)
}

async fn discard(files: &FileStore, paths: &[&Path]) {
    warn!("Rolling back {} stored upload(s)", paths.len());
    for path in paths {
        files.remove(path).await;
    }
}
