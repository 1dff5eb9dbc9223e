use super::{annotation_store::AnnotationStore, csv_parser, job_tracker::JobTracker};
use crate::shared::config::Config;
use anyhow::{bail, Result};
use contracts::usecases::u501_batch_import_annotations::{
    AnnotationQuota, BatchImportResponse, BatchImportStatusResponse, JobStatus,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub use super::annotation_store::LIMIT_EXCEEDED_MESSAGE;

pub const EMPTY_FILE_MESSAGE: &str = "The CSV file is empty.";

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub billing_enabled: bool,
    pub quota_total: u64,
    pub processing_delay: Duration,
    /// Сколько хранить завершенные задачи для опроса статуса
    pub job_retention: Duration,
}

impl From<&Config> for ExecutorSettings {
    fn from(config: &Config) -> Self {
        Self {
            billing_enabled: config.annotation.billing_enabled,
            quota_total: config.annotation.quota_total,
            processing_delay: Duration::from_millis(config.import.processing_delay_ms),
            job_retention: Duration::from_secs(config.import.job_retention_secs),
        }
    }
}

/// Executor для UseCase пакетного импорта аннотаций
#[derive(Clone)]
pub struct BatchImportExecutor {
    tracker: Arc<JobTracker>,
    store: Arc<AnnotationStore>,
    settings: ExecutorSettings,
}

impl BatchImportExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self {
            tracker: Arc::new(JobTracker::new()),
            store: Arc::new(AnnotationStore::new()),
            settings,
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Текущее использование квоты приложения
    pub fn quota(&self, app_id: &str) -> AnnotationQuota {
        AnnotationQuota {
            billing_enabled: self.settings.billing_enabled,
            usage: self.store.count(app_id),
            total: self.settings.quota_total,
        }
    }

    /// Запустить импорт (создает async task и возвращает job_id)
    pub fn start_import(&self, app_id: &str, file_name: &str, data: Vec<u8>) -> BatchImportResponse {
        self.cleanup_finished_jobs();

        let job_id = Uuid::new_v4().to_string();
        self.tracker.create_job(job_id.clone(), app_id.to_string());
        tracing::info!(
            "Batch import job {} created for app {} ({}, {} bytes)",
            job_id,
            app_id,
            file_name,
            data.len()
        );

        let self_clone = self.clone();
        let job_id_clone = job_id.clone();
        let app_id_clone = app_id.to_string();

        tokio::spawn(async move {
            match self_clone.run_import(&job_id_clone, &app_id_clone, &data).await {
                Ok(imported) => {
                    tracing::info!("Batch import job {} completed: {} annotations", job_id_clone, imported);
                    self_clone.tracker.complete(&job_id_clone, imported);
                }
                Err(e) => {
                    tracing::error!("Batch import job {} failed: {:#}", job_id_clone, e);
                    self_clone.tracker.fail(&job_id_clone, format!("{:#}", e));
                }
            }
        });

        BatchImportResponse {
            job_id,
            job_status: JobStatus::Waiting,
        }
    }

    /// Получить статус задачи
    pub fn get_status(&self, app_id: &str, job_id: &str) -> Option<BatchImportStatusResponse> {
        self.tracker
            .get_for_app(app_id, job_id)
            .map(|job| job.to_response())
    }

    fn cleanup_finished_jobs(&self) {
        let max_age = chrono::Duration::from_std(self.settings.job_retention)
            .unwrap_or_else(|_| chrono::Duration::MAX);
        let removed = self.tracker.cleanup_finished(max_age);
        if removed > 0 {
            tracing::debug!("Removed {} finished batch import jobs", removed);
        }
    }

    async fn run_import(&self, job_id: &str, app_id: &str, data: &[u8]) -> Result<usize> {
        self.pause().await;
        self.tracker.set_processing(job_id);

        let drafts = csv_parser::parse_annotations(data)?;
        if drafts.is_empty() {
            bail!(EMPTY_FILE_MESSAGE);
        }

        self.pause().await;

        // Лимит проверяется в момент записи, а не до паузы
        let limit = self.settings.billing_enabled.then_some(self.settings.quota_total);
        self.store.append_within(app_id, drafts, limit)
    }

    async fn pause(&self) {
        if !self.settings.processing_delay.is_zero() {
            tokio::time::sleep(self.settings.processing_delay).await;
        }
    }
}
