pub mod client;
pub mod controller;
pub mod error;
pub mod request;
pub mod response;
pub mod runner;
pub mod session;

#[cfg(test)]
mod testing;

pub use client::JobStatusClient;
pub use controller::{
    ControllerState, NotificationKind, NotificationSink, Outcome, PollingConfig,
    PollingController, QuotaGate, Step, Ticket, DEFAULT_POLL_INTERVAL,
};
pub use error::{BatchImportError, InvalidTransition, TransportError};
pub use request::ImportArtifact;
pub use response::{AnnotationQuota, BatchImportResponse, BatchImportStatusResponse, JobStatus};
pub use runner::run_batch_import;
pub use session::{BatchImportSession, SessionStatus};

use crate::usecases::common::UseCaseMetadata;

pub struct BatchImportAnnotations;

impl UseCaseMetadata for BatchImportAnnotations {
    fn usecase_index() -> &'static str {
        "u501"
    }

    fn usecase_name() -> &'static str {
        "batch_import_annotations"
    }

    fn display_name() -> &'static str {
        "Пакетный импорт аннотаций"
    }

    fn description() -> &'static str {
        "Загрузка пар вопрос/ответ из CSV с отслеживанием фоновой задачи"
    }
}
