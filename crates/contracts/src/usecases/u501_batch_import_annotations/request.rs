use std::sync::Arc;

use super::error::BatchImportError;

/// MIME-тип, с которым файл уходит на сервер
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Имя multipart-поля с файлом
pub const FILE_FIELD: &str = "file";

/// Выбранный пользователем CSV-файл для пакетного импорта аннотаций.
///
/// Содержимое лежит за `Arc`, поэтому клонирование дешевое: сессия хранит
/// свою копию, а клиент отправляет ту же самую.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportArtifact {
    file_name: String,
    content_type: String,
    data: Arc<[u8]>,
}

impl ImportArtifact {
    /// Создать артефакт с проверками, которые повторяют проверки сервера:
    /// расширение `.csv` и непустое содержимое.
    pub fn new(file_name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Result<Self, BatchImportError> {
        let file_name = file_name.into();
        let data = data.into();

        if file_name.trim().is_empty() {
            return Err(BatchImportError::InvalidArtifact(
                "Имя файла не указано".to_string(),
            ));
        }
        if !is_csv_file_name(&file_name) {
            return Err(BatchImportError::InvalidArtifact(format!(
                "Допускаются только CSV файлы: {}",
                file_name
            )));
        }
        if data.is_empty() {
            return Err(BatchImportError::InvalidArtifact(format!(
                "Файл пуст: {}",
                file_name
            )));
        }

        Ok(Self {
            file_name,
            content_type: CSV_CONTENT_TYPE.to_string(),
            data,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Проверка расширения без учета регистра
pub fn is_csv_file_name(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".csv")
}
