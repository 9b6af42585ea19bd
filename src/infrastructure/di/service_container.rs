//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{PatientService, ProviderService, UploadService};
use crate::application::ApplicationError;
use crate::config::Settings;
use crate::infrastructure::store::ClinicDatabase;
use crate::infrastructure::traits::{ClinicStore, FileSystem, RealFileSystem};
use crate::infrastructure::{InfraResult, StoreError};

/// Container holding all application services.
///
/// Every service shares the same store.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Record store shared by all services
    pub store: Arc<dyn ClinicStore>,

    pub patients: PatientService,
    pub providers: ProviderService,
    pub uploads: UploadService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// Opens the snapshot at `settings.data_file` if configured, otherwise
    /// keeps records in memory only.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store: Arc<dyn ClinicStore> = match &settings.data_file {
            Some(path) => {
                debug!("opening snapshot {}", path.display());
                Arc::new(
                    ClinicDatabase::open(Arc::clone(&fs), path)
                        .map_err(|e| open_err(path.display().to_string(), e))?,
                )
            }
            None => {
                debug!("no data_file configured, records are kept in memory");
                Arc::new(ClinicDatabase::in_memory())
            }
        };
        Ok(Self::with_deps(settings, fs, store))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn ClinicStore>,
    ) -> Self {
        let settings = Arc::new(settings);
        let patients = PatientService::new(Arc::clone(&store));
        let providers = ProviderService::new(Arc::clone(&store));
        let uploads = UploadService::new(Arc::clone(&store));

        Self {
            settings,
            fs,
            store,
            patients,
            providers,
            uploads,
        }
    }
}

fn open_err(path: String, source: StoreError) -> ApplicationError {
    ApplicationError::persistence(format!("open {path}"), source)
}
