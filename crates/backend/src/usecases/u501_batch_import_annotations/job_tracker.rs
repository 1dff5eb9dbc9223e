use chrono::{DateTime, Duration, Utc};
use contracts::usecases::u501_batch_import_annotations::{BatchImportStatusResponse, JobStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Состояние одной задачи импорта
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_id: String,
    pub app_id: String,
    pub status: JobStatus,
    pub error_msg: Option<String>,
    pub imported: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn to_response(&self) -> BatchImportStatusResponse {
        BatchImportStatusResponse {
            job_id: self.job_id.clone(),
            job_status: self.status,
            error_msg: self.error_msg.clone().unwrap_or_default(),
        }
    }
}

/// Трекер задач импорта (in-memory, для опроса статуса с клиента)
#[derive(Clone, Default)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Зарегистрировать задачу в статусе waiting
    pub fn create_job(&self, job_id: String, app_id: String) {
        let now = Utc::now();
        self.write().insert(
            job_id.clone(),
            JobRecord {
                job_id,
                app_id,
                status: JobStatus::Waiting,
                error_msg: None,
                imported: 0,
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.read().get(job_id).cloned()
    }

    /// Задача приложения; чужие задачи не видны
    pub fn get_for_app(&self, app_id: &str, job_id: &str) -> Option<JobRecord> {
        self.get(job_id).filter(|job| job.app_id == app_id)
    }

    pub fn set_processing(&self, job_id: &str) {
        self.update(job_id, |job| job.status = JobStatus::Processing);
    }

    pub fn complete(&self, job_id: &str, imported: usize) {
        self.update(job_id, |job| {
            job.status = JobStatus::Completed;
            job.imported = imported;
        });
    }

    pub fn fail(&self, job_id: &str, error_msg: String) {
        self.update(job_id, |job| {
            job.status = JobStatus::Error;
            job.error_msg = Some(error_msg);
        });
    }

    /// Удалить завершенные задачи старше `max_age` (для очистки памяти).
    /// Задачи в работе не трогаются. Возвращает сколько удалено.
    pub fn cleanup_finished(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, job| !job.status.is_terminal() || now - job.updated_at < max_age);
        before - jobs.len()
    }

    /// Терминальный статус не перезаписывается
    fn update(&self, job_id: &str, apply: impl FnOnce(&mut JobRecord)) {
        let mut jobs = self.write();
        match jobs.get_mut(job_id) {
            Some(job) if job.status.is_terminal() => {
                tracing::warn!("Job {} already finished with {}", job_id, job.status);
            }
            Some(job) => {
                apply(job);
                job.updated_at = Utc::now();
            }
            None => tracing::warn!("Job {} not found in tracker", job_id),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
