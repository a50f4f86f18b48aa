use std::sync::Arc;

use crate::config::Config;
use crate::models::job::JobCatalog;
use crate::storage::files::FileStore;
use crate::storage::ApplicationRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jobs: Arc<JobCatalog>,
    pub files: FileStore,
    /// Application records and file metadata. Default: JSON files under `<upload_dir>/metadata`.
    pub store: Arc<dyn ApplicationRepository>,
}
