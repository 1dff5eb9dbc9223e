use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::usecases::common::UseCaseError;
use thiserror::Error;

/// Ошибки HTTP-слоя; тело ответа: `UseCaseError` в JSON
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded.")]
    NoFileUploaded,

    #[error("Only one file is allowed.")]
    TooManyFiles,

    #[error("Invalid file type. Only CSV files are allowed.")]
    InvalidFileType(String),

    #[error("Invalid multipart request: {0}")]
    Multipart(String),

    #[error("Annotation quota of your subscription is exhausted.")]
    QuotaExceeded,

    #[error("The job is not exist.")]
    JobNotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFileUploaded
            | ApiError::TooManyFiles
            | ApiError::InvalidFileType(_)
            | ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::QuotaExceeded => StatusCode::FORBIDDEN,
            ApiError::JobNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_body(&self) -> UseCaseError {
        match self {
            ApiError::NoFileUploaded | ApiError::TooManyFiles | ApiError::Multipart(_) => {
                UseCaseError::validation(self.to_string())
            }
            ApiError::InvalidFileType(file_name) => {
                UseCaseError::validation(self.to_string()).with_details(file_name.clone())
            }
            ApiError::QuotaExceeded => UseCaseError::quota_exceeded(self.to_string()),
            ApiError::JobNotFound(job_id) => {
                UseCaseError::not_found(self.to_string()).with_details(job_id.clone())
            }
            // Детали внутренних ошибок остаются в логах
            ApiError::Internal(_) => UseCaseError::internal("Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        (status, Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NoFileUploaded.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::QuotaExceeded.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::JobNotFound("j".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let body = ApiError::Internal(anyhow::anyhow!("secret path /var/db")).to_body();
        assert!(!body.message.contains("/var/db"));
        assert_eq!(body.details, None);
    }

    #[test]
    fn test_quota_body_code() {
        assert!(ApiError::QuotaExceeded.to_body().is_quota_exceeded());
    }
}
