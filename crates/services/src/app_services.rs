use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::completion_service::CompletionLedger;
use crate::config::AppConfig;
use crate::enrollment_service::EnrollmentManager;
use crate::error::AppServicesError;
use crate::media::MediaUrls;
use crate::profile_service::ProfileService;
use crate::progress::ProgressCalculator;

/// Wires every service over one `Storage` and one `AppConfig`.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CatalogService>,
    ledger: Arc<CompletionLedger>,
    enrollments: Arc<EnrollmentManager>,
    profiles: Arc<ProfileService>,
    progress: Arc<ProgressCalculator>,
}

impl AppServices {
    /// Build services backed by `SQLite` at `config.database_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.database_url).await?;
        Ok(Self::from_storage(&storage, config, clock))
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, config: &AppConfig, clock: Clock) -> Self {
        let progress = ProgressCalculator::new(
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.results),
        );
        let enrollments = EnrollmentManager::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            progress.clone(),
        );
        let ledger = CompletionLedger::new(
            clock,
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.results),
            enrollments.clone(),
        );
        let catalog = CatalogService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.quizzes),
        );
        let profiles = ProfileService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.courses),
            enrollments.clone(),
            MediaUrls::new(config.media_base_url.clone()),
        );

        Self {
            catalog: Arc::new(catalog),
            ledger: Arc::new(ledger),
            enrollments: Arc::new(enrollments),
            profiles: Arc::new(profiles),
            progress: Arc::new(progress),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<CompletionLedger> {
        Arc::clone(&self.ledger)
    }

    #[must_use]
    pub fn enrollments(&self) -> Arc<EnrollmentManager> {
        Arc::clone(&self.enrollments)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressCalculator> {
        Arc::clone(&self.progress)
    }
}
