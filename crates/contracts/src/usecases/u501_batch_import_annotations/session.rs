use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::InvalidTransition;
use super::request::ImportArtifact;
use super::response::JobStatus;

/// Статус сессии на стороне клиента
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Waiting,
    Processing,
    Completed,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Error)
    }

    /// Разрешен ли переход. Из терминального состояния выхода нет,
    /// вернуться в `NotStarted` нельзя. Из `NotStarted` путь только в
    /// `Waiting` (задача создана) или `Error` (отправка не удалась);
    /// `Waiting` и `Processing` могут сменять друг друга, пока задача
    /// не завершена.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        match (self, next) {
            (SessionStatus::Completed | SessionStatus::Error, _) => false,
            (_, SessionStatus::NotStarted) => false,
            (SessionStatus::NotStarted, SessionStatus::Waiting | SessionStatus::Error) => true,
            (SessionStatus::NotStarted, _) => false,
            (SessionStatus::Waiting | SessionStatus::Processing, _) => true,
        }
    }
}

impl From<JobStatus> for SessionStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Waiting => SessionStatus::Waiting,
            JobStatus::Processing => SessionStatus::Processing,
            JobStatus::Completed => SessionStatus::Completed,
            JobStatus::Error => SessionStatus::Error,
        }
    }
}

/// Клиентская запись об одной задаче импорта.
///
/// Принадлежит ровно одному `PollingController`; извне не изменяется.
#[derive(Debug, Clone)]
pub struct BatchImportSession {
    job_id: Option<String>,
    status: SessionStatus,
    input_artifact: ImportArtifact,
    submitted_at: Option<DateTime<Utc>>,
}

impl BatchImportSession {
    pub fn new(input_artifact: ImportArtifact) -> Self {
        Self {
            job_id: None,
            status: SessionStatus::NotStarted,
            input_artifact,
            submitted_at: None,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn input_artifact(&self) -> &ImportArtifact {
        &self.input_artifact
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Привязать идентификатор задачи, выданный сервером. Только один раз.
    pub fn assign_job_id(&mut self, job_id: impl Into<String>) -> Result<(), InvalidTransition> {
        if self.job_id.is_some() {
            return Err(InvalidTransition::JobIdReassigned);
        }
        self.job_id = Some(job_id.into());
        self.submitted_at = Some(Utc::now());
        Ok(())
    }

    /// Единственная точка изменения статуса
    pub fn advance(&mut self, new_status: SessionStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(new_status) {
            return Err(InvalidTransition::Status {
                from: self.status,
                to: new_status,
            });
        }
        self.status = new_status;
        Ok(())
    }
}
