use serde::{Deserialize, Serialize};

use super::controller::QuotaGate;

/// Статус задачи импорта на сервере
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Задача создана и ждет обработчика
    Waiting,
    /// Обработчик разбирает файл
    Processing,
    /// Аннотации добавлены
    Completed,
    /// Задача завершилась ошибкой
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ответ на POST /api/apps/:app_id/annotations/batch-import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchImportResponse {
    pub job_id: String,
    pub job_status: JobStatus,
}

/// Ответ на GET /api/apps/:app_id/annotations/batch-import-status/:job_id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchImportStatusResponse {
    pub job_id: String,
    pub job_status: JobStatus,
    /// Текст ошибки сервера; пустая строка, если ошибки нет
    #[serde(default)]
    pub error_msg: String,
}

impl BatchImportStatusResponse {
    pub fn new(job_id: impl Into<String>, job_status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            job_status,
            error_msg: String::new(),
        }
    }

    pub fn failed(job_id: impl Into<String>, error_msg: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            job_status: JobStatus::Error,
            error_msg: error_msg.into(),
        }
    }

    /// Сообщение сервера, если оно не пустое
    pub fn error_message(&self) -> Option<&str> {
        let msg = self.error_msg.trim();
        if msg.is_empty() {
            None
        } else {
            Some(msg)
        }
    }
}

/// Использование квоты аннотаций по тарифу (GET /api/apps/:app_id/annotations/quota)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationQuota {
    /// Биллинг включен; без него квота не ограничивает
    pub billing_enabled: bool,
    /// Сколько аннотаций уже использовано
    pub usage: u64,
    /// Лимит тарифа
    pub total: u64,
}

impl AnnotationQuota {
    pub fn unlimited() -> Self {
        Self {
            billing_enabled: false,
            usage: 0,
            total: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.billing_enabled && self.usage >= self.total
    }

    /// Сколько аннотаций еще можно добавить; `None` означает без ограничения
    pub fn remaining(&self) -> Option<u64> {
        if self.billing_enabled {
            Some(self.total.saturating_sub(self.usage))
        } else {
            None
        }
    }
}

impl QuotaGate for AnnotationQuota {
    fn is_allowed(&self) -> bool {
        !self.is_exhausted()
    }
}
