//! JSON-file metadata store.
//!
//! Layout under the metadata directory:
//! - `<application_id>.json` — one [`FileMetadata`] document per application
//! - `file_lookup.json`      — stored filename → application id
//! - `applications.json`     — the full ordered application list
//!
//! All mutation is serialized through `writer`. Every file is written to a
//! temp sibling and renamed into place, so readers never see a torn document.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::models::application::{Application, FileMetadata};
use crate::storage::files::secure_filename;
use crate::storage::ApplicationRepository;

const APPLICATIONS_FILE: &str = "applications.json";
const LOOKUP_FILE: &str = "file_lookup.json";

type FileLookup = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("metadata I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("metadata serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct JsonStore {
    dir: PathBuf,
    applications: RwLock<Vec<Application>>,
    writer: Mutex<()>,
}

impl JsonStore {
    /// Creates the metadata directory if needed and loads the persisted application list.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;

        let applications = load_applications(&dir.join(APPLICATIONS_FILE)).await?;
        info!(
            "Metadata store at {} loaded {} application(s)",
            dir.display(),
            applications.len()
        );

        Ok(Self {
            dir,
            applications: RwLock::new(applications),
            writer: Mutex::new(()),
        })
    }

    fn metadata_path(&self, application_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", secure_filename(application_id)))
    }

    /// Reads the lookup table. A missing table is empty; an unreadable one is
    /// also treated as empty but reported separately.
    async fn read_lookup(&self) -> FileLookup {
        let path = self.dir.join(LOOKUP_FILE);
        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<FileLookup>(&bytes) {
                Ok(table) => {
                    debug!("Loaded file lookup table with {} entries", table.len());
                    table
                }
                Err(e) => {
                    warn!(
                        "File lookup table {} is corrupt, treating as empty: {e}",
                        path.display()
                    );
                    FileLookup::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No file lookup table yet at {}", path.display());
                FileLookup::new()
            }
            Err(e) => {
                warn!(
                    "File lookup table {} is unreadable, treating as empty: {e}",
                    path.display()
                );
                FileLookup::new()
            }
        }
    }

    async fn write_file_metadata(&self, metadata: &FileMetadata) -> Result<(), StoreError> {
        write_json_atomic(&self.metadata_path(&metadata.application_id), metadata).await?;

        let mut lookup = self.read_lookup().await;
        for name in metadata.filenames() {
            lookup.insert(name.to_string(), metadata.application_id.clone());
        }
        write_json_atomic(&self.dir.join(LOOKUP_FILE), &lookup).await
    }
}

#[async_trait]
impl ApplicationRepository for JsonStore {
    async fn add(&self, application: Application, metadata: FileMetadata) -> Result<(), StoreError> {
        let _guard = self.writer.lock().await;

        self.write_file_metadata(&metadata).await?;

        let mut next = self.applications.read().await.clone();
        let id = application.id.clone();
        next.push(application);
        write_json_atomic(&self.dir.join(APPLICATIONS_FILE), &next).await?;

        let total = next.len();
        *self.applications.write().await = next;
        info!("Committed application {id} ({total} total)");
        Ok(())
    }

    async fn list(&self) -> Vec<Application> {
        self.applications.read().await.clone()
    }

    async fn list_by_job(&self, job_id: &str) -> Vec<Application> {
        self.applications
            .read()
            .await
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect()
    }

    async fn reload(&self) -> Result<usize, StoreError> {
        let _guard = self.writer.lock().await;
        let loaded = load_applications(&self.dir.join(APPLICATIONS_FILE)).await?;
        let count = loaded.len();
        *self.applications.write().await = loaded;
        Ok(count)
    }

    async fn application_for_file(&self, filename: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_lookup().await.remove(filename))
    }

    async fn file_metadata(&self, application_id: &str) -> Result<Option<FileMetadata>, StoreError> {
        read_json_optional(&self.metadata_path(application_id)).await
    }
}

/// Absent file → empty list. Corrupt file → logged, empty list.
async fn load_applications(path: &Path) -> Result<Vec<Application>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No application list at {}, starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(apps) => Ok(apps),
        Err(e) => {
            error!(
                "Application list {} could not be parsed, starting empty: {e}",
                path.display()
            );
            Ok(Vec::new())
        }
    }
}

async fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp, &body).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
