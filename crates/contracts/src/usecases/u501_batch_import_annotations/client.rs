use async_trait::async_trait;

use super::error::TransportError;
use super::request::ImportArtifact;
use super::response::BatchImportStatusResponse;

/// Запросы к серверу задач импорта: запуск и проверка статуса.
///
/// Без `Send`, чтобы в браузере подходили futures из `wasm_bindgen_futures`.
#[async_trait(?Send)]
pub trait JobStatusClient {
    /// Загрузить файл и создать задачу; возвращает job_id
    async fn create(&self, artifact: &ImportArtifact) -> Result<String, TransportError>;

    /// Текущий статус задачи
    async fn poll(&self, job_id: &str) -> Result<BatchImportStatusResponse, TransportError>;
}
