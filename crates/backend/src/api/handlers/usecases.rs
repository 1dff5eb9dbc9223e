use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use contracts::usecases::u501_batch_import_annotations::{
    request::{is_csv_file_name, FILE_FIELD},
    AnnotationQuota, BatchImportResponse, BatchImportStatusResponse,
};
use std::sync::Arc;

use crate::api::ApiError;
use crate::usecases::u501_batch_import_annotations::BatchImportExecutor;

// ============================================================================
// UseCase u501: Batch import annotations
// ============================================================================

/// Загруженный файл из multipart-запроса
struct UploadedFile {
    file_name: String,
    data: Vec<u8>,
}

/// Прочитать ровно один файл из поля `file`
async fn read_single_file(multipart: &mut Multipart) -> Result<UploadedFile, ApiError> {
    let mut uploaded: Option<UploadedFile> = None;
    let mut files = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        let is_file_field = field.name() == Some(FILE_FIELD);
        if field.file_name().is_none() && !is_file_field {
            continue;
        }
        files += 1;

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Multipart(e.to_string()))?;

        if is_file_field && uploaded.is_none() {
            uploaded = Some(UploadedFile {
                file_name,
                data: data.to_vec(),
            });
        }
    }

    let uploaded = uploaded.ok_or(ApiError::NoFileUploaded)?;
    if files > 1 {
        return Err(ApiError::TooManyFiles);
    }
    if !is_csv_file_name(&uploaded.file_name) {
        return Err(ApiError::InvalidFileType(uploaded.file_name));
    }
    Ok(uploaded)
}

/// POST /api/apps/:app_id/annotations/batch-import
pub async fn u501_batch_import(
    State(executor): State<Arc<BatchImportExecutor>>,
    Path(app_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<BatchImportResponse>, ApiError> {
    if executor.quota(&app_id).is_exhausted() {
        return Err(ApiError::QuotaExceeded);
    }

    let file = read_single_file(&mut multipart).await?;
    Ok(Json(executor.start_import(&app_id, &file.file_name, file.data)))
}

/// GET /api/apps/:app_id/annotations/batch-import-status/:job_id
pub async fn u501_batch_import_status(
    State(executor): State<Arc<BatchImportExecutor>>,
    Path((app_id, job_id)): Path<(String, String)>,
) -> Result<Json<BatchImportStatusResponse>, ApiError> {
    executor
        .get_status(&app_id, &job_id)
        .map(Json)
        .ok_or(ApiError::JobNotFound(job_id))
}

/// GET /api/apps/:app_id/annotations/quota
pub async fn u501_quota(
    State(executor): State<Arc<BatchImportExecutor>>,
    Path(app_id): Path<String>,
) -> Json<AnnotationQuota> {
    Json(executor.quota(&app_id))
}
