//! File Store — uploaded resumes and cover letters on local disk.
//!
//! Every name that touches the filesystem goes through [`secure_filename`],
//! so stored and requested files are always confined to the content directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];
const DEFAULT_EXTENSION: &str = "pdf";

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("file type not allowed: {0}")]
    InvalidFileType(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl DocumentKind {
    /// Suffix used in the human-readable `original_name` label.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Resume => "Resume",
            DocumentKind::CoverLetter => "CoverLetter",
        }
    }
}

/// Who an upload belongs to; drives the generated filename.
pub struct FileOwner<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub application_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileStat {
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<(), FileStoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Writes `content` under a generated name and returns the stored path.
    pub async fn store(
        &self,
        original_filename: &str,
        content: &[u8],
        owner: &FileOwner<'_>,
        kind: DocumentKind,
    ) -> Result<PathBuf, FileStoreError> {
        if !is_allowed_file(original_filename) {
            return Err(FileStoreError::InvalidFileType(original_filename.to_string()));
        }

        let filename = generated_filename(original_filename, owner, kind);
        let path = self.root.join(&filename);
        write_or_remove(&path, tokio::fs::write(&path, content)).await?;

        info!(
            "Stored {:?} upload '{original_filename}' as {filename} ({} bytes)",
            kind,
            content.len()
        );
        Ok(path)
    }

    /// Maps a caller-supplied filename to a path inside the content directory.
    /// Returns `None` when nothing usable survives sanitization.
    pub fn resolve(&self, filename: &str) -> Option<(String, PathBuf)> {
        let safe = secure_filename(filename);
        if safe.is_empty() {
            return None;
        }
        let path = self.root.join(&safe);
        Some((safe, path))
    }

    /// Resolves `filename` and returns it only if a regular file exists there.
    pub async fn existing(&self, filename: &str) -> Option<(String, PathBuf)> {
        let (safe, path) = self.resolve(filename)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some((safe, path)),
            _ => None,
        }
    }

    pub async fn stat(&self, path: &Path) -> Result<FileStat, FileStoreError> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(FileStat {
            size: meta.len(),
            created: meta.created().ok().map(DateTime::<Utc>::from),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Best-effort delete, used to undo writes for a submission that failed later on.
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove orphaned upload {}: {e}", path.display());
        } else {
            info!("Removed orphaned upload {}", path.display());
        }
    }
}

/// Awaits `write`; if it fails, deletes whatever it left at `path` before returning the error.
async fn write_or_remove(
    path: &Path,
    write: impl std::future::Future<Output = std::io::Result<()>>,
) -> std::io::Result<()> {
    if let Err(e) = write.await {
        match tokio::fs::remove_file(path).await {
            Ok(()) => warn!("Removed partial upload {} after write error: {e}", path.display()),
            Err(rm) if rm.kind() == std::io::ErrorKind::NotFound => {}
            Err(rm) => warn!("Failed to remove partial upload {}: {rm}", path.display()),
        }
        return Err(e);
    }
    Ok(())
}

/// Lower-cased text after the last `.`, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

pub fn is_allowed_file(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_pdf(filename: &str) -> bool {
    extension_of(filename).as_deref() == Some("pdf")
}

fn generated_filename(original_filename: &str, owner: &FileOwner<'_>, kind: DocumentKind) -> String {
    let ext = extension_of(original_filename).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    let raw = match kind {
        DocumentKind::Resume => format!(
            "{}_{}_{}.{ext}",
            owner.first_name, owner.last_name, owner.application_id
        ),
        DocumentKind::CoverLetter => format!(
            "{}_{}_CL_{}.{ext}",
            owner.first_name, owner.last_name, owner.application_id
        ),
    };
    secure_filename(&raw)
}

/// Reduces an arbitrary name to a flat, ASCII-only filename.
///
/// Path separators become spaces, every character outside `[A-Za-z0-9_.-]`
/// is dropped, whitespace runs collapse to `_`, and leading/trailing `.`/`_`
/// are stripped. The result never contains a separator or a `..` component.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .filter(|c| c.is_ascii())
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn owner<'a>(id: &'a str) -> FileOwner<'a> {
        FileOwner {
            first_name: "Ada",
            last_name: "Lovelace",
            application_id: id,
        }
    }

    #[test]
    fn test_secure_filename_strips_traversal() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("..\\..\\etc\\passwd"), "etc_passwd");
        assert_eq!(secure_filename("/etc/passwd"), "etc_passwd");
    }

    #[test]
    fn test_secure_filename_keeps_plain_names() {
        assert_eq!(secure_filename("Ada_Lovelace_123.pdf"), "Ada_Lovelace_123.pdf");
        assert_eq!(secure_filename("my resume.pdf"), "my_resume.pdf");
    }

    #[test]
    fn test_secure_filename_drops_non_ascii_and_dots() {
        assert_eq!(secure_filename("Zoë Ünal.txt"), "Zo_nal.txt");
        assert_eq!(secure_filename(".."), "");
        assert_eq!(secure_filename("..hidden"), "hidden");
    }

    #[test]
    fn test_allowed_extensions_case_insensitive() {
        assert!(is_allowed_file("cv.PDF"));
        assert!(is_allowed_file("cv.docx"));
        assert!(is_allowed_file("notes.Txt"));
        assert!(!is_allowed_file("x.exe"));
        assert!(!is_allowed_file("resume"));
    }

    #[test]
    fn test_generated_names_are_distinct_per_application() {
        let a = generated_filename("cv.pdf", &owner("id-1"), DocumentKind::Resume);
        let b = generated_filename("cv.pdf", &owner("id-2"), DocumentKind::Resume);
        assert_ne!(a, b);
        assert_eq!(a, "Ada_Lovelace_id-1.pdf");
        assert_eq!(
            generated_filename("letter.DOCX", &owner("id-1"), DocumentKind::CoverLetter),
            "Ada_Lovelace_CL_id-1.docx"
        );
    }

    #[test]
    fn test_generated_name_sanitizes_owner() {
        let evil = FileOwner {
            first_name: "../..",
            last_name: "root/",
            application_id: "id",
        };
        let name = generated_filename("cv.pdf", &evil, DocumentKind::Resume);
        assert!(!name.contains('/'));
        assert!(!name.starts_with('.'));
    }

    #[tokio::test]
    async fn test_store_writes_bytes_verbatim() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = FileStore::new(dir.path());
        let content = b"%PDF-1.4 not really".to_vec();

        let path = store
            .store("cv.pdf", &content, &owner("abc"), DocumentKind::Resume)
            .await
            .unwrap();

        assert_eq!(path.parent().unwrap(), dir.path());
        assert_eq!(std::fs::read(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_store_rejects_disallowed_type() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = FileStore::new(dir.path());

        let err = store
            .store("x.exe", b"MZ", &owner("abc"), DocumentKind::Resume)
            .await
            .unwrap_err();

        assert!(matches!(err, FileStoreError::InvalidFileType(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_store_reports_io_failure() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = FileStore::new(dir.path().join("missing"));

        let err = store
            .store("cv.pdf", b"x", &owner("abc"), DocumentKind::Resume)
            .await
            .unwrap_err();

        assert!(matches!(err, FileStoreError::Io(_)));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_file() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let path = dir.path().join("Ada_Lovelace_abc.pdf");

        let half_written = async {
            tokio::fs::write(&path, b"%PDF-1.4 trunc").await?;
            Err::<(), _>(std::io::Error::other("disk full"))
        };
        let err = write_or_remove(&path, half_written).await.unwrap_err();

        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_existing_confines_to_root() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let root = dir.path().join("uploads");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();
        let store = FileStore::new(&root);

        assert!(store.existing("../secret.txt").await.is_none());

        let (safe, path) = store.resolve("../../etc/passwd").unwrap();
        assert_eq!(safe, "etc_passwd");
        assert!(path.starts_with(&root));
    }

    #[tokio::test]
    async fn test_stat_reports_size() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        let store = FileStore::new(dir.path());

        let (_, path) = store.existing("a.txt").await.unwrap();
        let stat = store.stat(&path).await.unwrap();
        assert_eq!(stat.size, 5);
        assert!(stat.modified.is_some());
    }
}
