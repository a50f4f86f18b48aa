use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Form fields every submission must carry, in the order they are reported when missing.
pub const REQUIRED_FIELDS: [&str; 15] = [
    "firstName",
    "lastName",
    "email",
    "phone",
    "age",
    "address",
    "city",
    "country",
    "currentPlace",
    "availability",
    "position",
    "experience",
    "educationLevel",
    "skills",
    "job_id",
];

/// Applicant-supplied free text. Serialized with the form's camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub current_place: String,
    pub availability: String,
    #[serde(default)]
    pub linked_in_profile: String,
    #[serde(default)]
    pub portfolio_website: String,
    pub position: String,
    pub experience: String,
    pub education_level: String,
    pub skills: String,
}

impl Applicant {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A submitted application. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub applicant: Applicant,
    pub resume_path: PathBuf,
    pub cover_letter_path: Option<PathBuf>,
}

impl Application {
    pub fn resume_filename(&self) -> String {
        file_name_of(&self.resume_path)
    }

    pub fn cover_letter_filename(&self) -> Option<String> {
        self.cover_letter_path.as_deref().map(file_name_of)
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Per-application record of the stored documents, with cached preview text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub application_id: String,
    pub applicant_name: String,
    pub email: String,
    pub position: String,
    pub job_id: String,
    pub submission_date: DateTime<Utc>,
    pub resume_filename: String,
    pub cover_letter_filename: Option<String>,
    pub resume_preview: Option<String>,
    pub cover_letter_preview: Option<String>,
}

impl FileMetadata {
    pub fn for_application(
        application: &Application,
        resume_preview: Option<String>,
        cover_letter_preview: Option<String>,
    ) -> Self {
        Self {
            application_id: application.id.clone(),
            applicant_name: application.applicant.display_name(),
            email: application.applicant.email.clone(),
            position: application.applicant.position.clone(),
            job_id: application.job_id.clone(),
            submission_date: application.timestamp,
            resume_filename: application.resume_filename(),
            cover_letter_filename: application.cover_letter_filename(),
            resume_preview,
            cover_letter_preview,
        }
    }

    /// Every stored filename belonging to this application.
    pub fn filenames(&self) -> Vec<&str> {
        let mut names = vec![self.resume_filename.as_str()];
        if let Some(cl) = &self.cover_letter_filename {
            names.push(cl);
        }
        names
    }

    /// Cached preview for `filename`, matched against the resume and cover letter names.
    pub fn preview_for(&self, filename: &str) -> Option<&str> {
        if filename == self.resume_filename {
            self.resume_preview.as_deref()
        } else if self.cover_letter_filename.as_deref() == Some(filename) {
            self.cover_letter_preview.as_deref()
        } else {
            None
        }
    }
}

/// Public handle to a stored document. Never exposes the on-disk path.
#[derive(Debug, Clone, Serialize)]
pub struct FileDescriptor {
    pub filename: String,
    pub original_name: String,
    pub download_url: String,
    pub preview_url: String,
}

/// Application as returned by the listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: String,
    pub job_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub applicant: Applicant,
    pub resume: FileDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<FileDescriptor>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn applicant(first: &str, last: &str) -> Applicant {
        Applicant {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            phone: "555-0100".to_string(),
            age: "30".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            country: "US".to_string(),
            current_place: "Acme".to_string(),
            availability: "Immediately".to_string(),
            linked_in_profile: String::new(),
            portfolio_website: String::new(),
            position: "Engineer".to_string(),
            experience: "5 years".to_string(),
            education_level: "BSc".to_string(),
            skills: "Rust".to_string(),
        }
    }

    pub fn application(id: &str, job_id: &str) -> Application {
        Application {
            id: id.to_string(),
            job_id: job_id.to_string(),
            timestamp: Utc::now(),
            applicant: applicant("Ada", "Lovelace"),
            resume_path: PathBuf::from(format!("uploads/Ada_Lovelace_{id}.pdf")),
            cover_letter_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::application;
    use super::*;

    #[test]
    fn test_application_json_uses_form_keys() {
        let app = application("a1", "1");
        let value = serde_json::to_value(&app).unwrap();
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["educationLevel"], "BSc");
        assert_eq!(value["linkedInProfile"], "");
        assert_eq!(value["job_id"], "1");
        assert!(value["cover_letter_path"].is_null());
    }

    #[test]
    fn test_application_round_trips_through_json() {
        let mut app = application("a1", "2");
        app.cover_letter_path = Some(PathBuf::from("uploads/Ada_Lovelace_CL_a1.txt"));
        let text = serde_json::to_string(&app).unwrap();
        let back: Application = serde_json::from_str(&text).unwrap();
        assert_eq!(back, app);
    }

    #[test]
    fn test_metadata_preview_matches_by_filename() {
        let mut app = application("a1", "1");
        app.cover_letter_path = Some(PathBuf::from("uploads/Ada_Lovelace_CL_a1.pdf"));
        let meta = FileMetadata::for_application(
            &app,
            Some("resume text".into()),
            Some("letter text".into()),
        );

        assert_eq!(meta.applicant_name, "Ada Lovelace");
        assert_eq!(meta.preview_for("Ada_Lovelace_a1.pdf"), Some("resume text"));
        assert_eq!(meta.preview_for("Ada_Lovelace_CL_a1.pdf"), Some("letter text"));
        assert_eq!(meta.preview_for("other.pdf"), None);
        assert_eq!(meta.filenames().len(), 2);
    }
}
