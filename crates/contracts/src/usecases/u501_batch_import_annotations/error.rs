use thiserror::Error;

use super::session::SessionStatus;

/// Ошибка транспорта: запрос не дошел до сервера или сервер ответил не 2xx
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP-статус, если ответ вообще был получен
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// Попытка недопустимого перехода состояния сессии. Ошибка программиста,
/// в корректном потоке не возникает.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidTransition {
    #[error("invalid session transition {from:?} -> {to:?}")]
    Status { from: SessionStatus, to: SessionStatus },

    #[error("job id is already assigned")]
    JobIdReassigned,
}

/// Ошибки пакетного импорта
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchImportError {
    // ── До создания задачи ────────────────────────────────────────────────────
    #[error("Квота аннотаций исчерпана")]
    QuotaExceeded,

    #[error("Импорт уже выполняется")]
    AlreadyInFlight,

    #[error("Некорректный файл: {0}")]
    InvalidArtifact(String),

    // ── Удаленные ошибки ──────────────────────────────────────────────────────
    #[error("Не удалось запустить импорт: {0}")]
    SubmissionFailed(TransportError),

    #[error("Не удалось получить статус импорта: {0}")]
    PollingTransport(TransportError),

    #[error("Ошибка импорта: {message}")]
    RemoteJob { job_id: String, message: String },

    #[error("Импорт не завершился за {attempts} проверок")]
    PollingTimedOut { job_id: String, attempts: u32 },

    // ── Внутренние ────────────────────────────────────────────────────────────
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl BatchImportError {
    /// Фатальные ошибки означают нарушение инварианта и не показываются пользователю
    pub fn is_fatal(&self) -> bool {
        matches!(self, BatchImportError::InvalidTransition(_))
    }
}
