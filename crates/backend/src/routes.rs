use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::usecases::u501_batch_import_annotations::BatchImportExecutor;

/// Лимит размера загружаемого CSV
const MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Конфигурация всех роутов приложения
pub fn configure_routes(executor: Arc<BatchImportExecutor>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // UseCase u501: Batch import annotations
        // ========================================
        .route(
            "/api/apps/:app_id/annotations/batch-import",
            post(handlers::usecases::u501_batch_import)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/apps/:app_id/annotations/batch-import-status/:job_id",
            get(handlers::usecases::u501_batch_import_status),
        )
        .route(
            "/api/apps/:app_id/annotations/quota",
            get(handlers::usecases::u501_quota),
        )
        .with_state(executor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u501_batch_import_annotations::ExecutorSettings;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use contracts::usecases::common::UseCaseError;
    use contracts::usecases::u501_batch_import_annotations::{
        AnnotationQuota, BatchImportResponse, BatchImportStatusResponse, JobStatus,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "X-BATCH-IMPORT-BOUNDARY";

    fn executor(billing_enabled: bool, quota_total: u64) -> Arc<BatchImportExecutor> {
        Arc::new(BatchImportExecutor::new(ExecutorSettings {
            billing_enabled,
            quota_total,
            processing_delay: Duration::ZERO,
            job_retention: Duration::from_secs(3600),
        }))
    }

    fn multipart_body(files: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (file_name, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn upload_request(app_id: &str, files: &[(&str, &str)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/api/apps/{app_id}/annotations/batch-import"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(files)))
            .unwrap()
    }

    fn get_request(uri: String) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_poll_until_completed() {
        let executor = executor(true, 100);
        let app = configure_routes(executor.clone());

        let response = app
            .clone()
            .oneshot(upload_request("app1", &[("faq.csv", "question,answer\nq1,a1\n")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created: BatchImportResponse = json(response).await;
        assert_eq!(created.job_status, JobStatus::Waiting);

        let uri = format!(
            "/api/apps/app1/annotations/batch-import-status/{}",
            created.job_id
        );
        let mut last = None;
        for _ in 0..200 {
            let response = app.clone().oneshot(get_request(uri.clone())).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let status: BatchImportStatusResponse = json(response).await;
            if status.job_status.is_terminal() {
                last = Some(status);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let last = last.expect("job should finish");
        assert_eq!(last.job_status, JobStatus::Completed);
        assert_eq!(last.error_msg, "");

        let response = app
            .oneshot(get_request("/api/apps/app1/annotations/quota".into()))
            .await
            .unwrap();
        let quota: AnnotationQuota = json(response).await;
        assert_eq!(quota.usage, 1);
        assert_eq!(quota.total, 100);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_csv() {
        let app = configure_routes(executor(false, 0));
        let response = app
            .oneshot(upload_request("app1", &[("faq.docx", "q,a\n")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: UseCaseError = json(response).await;
        assert_eq!(body.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_rejects_two_files() {
        let app = configure_routes(executor(false, 0));
        let response = app
            .oneshot(upload_request(
                "app1",
                &[("a.csv", "question,answer\nq,a\n"), ("b.csv", "question,answer\nq,a\n")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_without_file() {
        let app = configure_routes(executor(false, 0));
        let response = app.oneshot(upload_request("app1", &[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_rejected_when_quota_exhausted() {
        let app = configure_routes(executor(true, 0));
        let response = app
            .oneshot(upload_request("app1", &[("faq.csv", "question,answer\nq1,a1\n")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: UseCaseError = json(response).await;
        assert!(body.is_quota_exceeded());
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let app = configure_routes(executor(false, 0));
        let response = app
            .oneshot(get_request(
                "/api/apps/app1/annotations/batch-import-status/missing".into(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
