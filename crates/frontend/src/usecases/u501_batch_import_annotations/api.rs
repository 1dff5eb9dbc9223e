use async_trait::async_trait;
use contracts::usecases::common::UseCaseError;
use contracts::usecases::u501_batch_import_annotations::{
    request::FILE_FIELD, AnnotationQuota, BatchImportResponse, BatchImportStatusResponse,
    ImportArtifact, JobStatusClient, TransportError,
};
use gloo_net::http::Request;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, FormData, RequestInit, RequestMode, Response};

use crate::shared::api_utils::api_url;

/// Путь ресурса аннотаций; `app_id` кодируется как один сегмент пути
fn annotations_route(app_id: &str, tail: &str) -> String {
    format!("/api/apps/{}/annotations{}", urlencoding::encode(app_id), tail)
}

fn status_route(app_id: &str, job_id: &str) -> String {
    annotations_route(
        app_id,
        &format!("/batch-import-status/{}", urlencoding::encode(job_id)),
    )
}

fn annotations_path(app_id: &str, tail: &str) -> String {
    api_url(&annotations_route(app_id, tail))
}

/// Сообщение об ошибке из тела ответа (`UseCaseError`), иначе код HTTP
fn http_error(status: u16, body: &str) -> TransportError {
    match serde_json::from_str::<UseCaseError>(body) {
        Ok(err) => TransportError::http(status, err.message),
        Err(_) if body.trim().is_empty() => TransportError::http(status, format!("HTTP error: {}", status)),
        Err(_) => TransportError::http(status, format!("HTTP error: {}: {}", status, body.trim())),
    }
}

/// HTTP-клиент задач импорта для одного приложения
#[derive(Debug, Clone)]
pub struct HttpJobStatusClient {
    app_id: String,
}

impl HttpJobStatusClient {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self { app_id: app_id.into() }
    }
}

#[async_trait(?Send)]
impl JobStatusClient for HttpJobStatusClient {
    /// POST multipart с одним полем `file`
    async fn create(&self, artifact: &ImportArtifact) -> Result<String, TransportError> {
        let window = web_sys::window().ok_or_else(|| TransportError::new("No window object"))?;

        let bytes = js_sys::Uint8Array::from(artifact.data());
        let parts = js_sys::Array::of1(&bytes);
        let options = BlobPropertyBag::new();
        options.set_type(artifact.content_type());
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| TransportError::new(format!("Failed to create blob: {:?}", e)))?;

        let form = FormData::new()
            .map_err(|e| TransportError::new(format!("Failed to create form: {:?}", e)))?;
        form.append_with_blob_and_filename(FILE_FIELD, &blob, artifact.file_name())
            .map_err(|e| TransportError::new(format!("Failed to append file: {:?}", e)))?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        opts.set_body(&form);

        let url = annotations_path(&self.app_id, "/batch-import");
        let request = web_sys::Request::new_with_str_and_init(&url, &opts)
            .map_err(|e| TransportError::new(format!("Failed to create request: {:?}", e)))?;

        let response_value = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| TransportError::new(format!("Fetch failed: {:?}", e)))?;
        let response: Response = response_value
            .dyn_into()
            .map_err(|_| TransportError::new("Not a Response"))?;

        let text_promise = response
            .text()
            .map_err(|e| TransportError::new(format!("Failed to read body: {:?}", e)))?;
        let text = wasm_bindgen_futures::JsFuture::from(text_promise)
            .await
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();

        if !response.ok() {
            return Err(http_error(response.status(), &text));
        }

        let created: BatchImportResponse = serde_json::from_str(&text)
            .map_err(|e| TransportError::new(format!("Failed to parse response: {}", e)))?;
        log::debug!("[u501] job {} created ({})", created.job_id, created.job_status);
        Ok(created.job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<BatchImportStatusResponse, TransportError> {
        let url = api_url(&status_route(&self.app_id, job_id));
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| TransportError::new(format!("Request failed: {}", e)))?;

        if !response.ok() {
            let body = response.text().await.unwrap_or_default();
            return Err(http_error(response.status(), &body));
        }

        response
            .json::<BatchImportStatusResponse>()
            .await
            .map_err(|e| TransportError::new(format!("Failed to parse response: {}", e)))
    }
}

/// Текущая квота аннотаций приложения
pub async fn fetch_quota(app_id: &str) -> Result<AnnotationQuota, String> {
    let response = Request::get(&annotations_path(app_id, "/quota"))
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !response.ok() {
        return Err(format!("HTTP error: {}", response.status()));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_id_is_one_path_segment() {
        assert_eq!(annotations_route("a/b", "/quota"), "/api/apps/a%2Fb/annotations/quota");
        assert_eq!(
            annotations_route("my app", "/batch-import"),
            "/api/apps/my%20app/annotations/batch-import"
        );
    }

    #[test]
    fn test_status_route_encodes_job_id() {
        assert_eq!(
            status_route("app", "j?1"),
            "/api/apps/app/annotations/batch-import-status/j%3F1"
        );
    }

    #[test]
    fn test_http_error_uses_use_case_message() {
        let err = http_error(403, r#"{"code":"QUOTA_EXCEEDED","message":"limit"}"#);
        assert_eq!(err.status, Some(403));
        assert_eq!(err.message, "limit");

        assert_eq!(http_error(502, "").message, "HTTP error: 502");
    }
}
