use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::csv_parser::AnnotationDraft;

pub const LIMIT_EXCEEDED_MESSAGE: &str =
    "The number of annotations exceeds the limit of your subscription.";

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Аннотации по приложениям (in-memory)
#[derive(Clone, Default)]
pub struct AnnotationStore {
    apps: Arc<RwLock<HashMap<String, Vec<Annotation>>>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, app_id: &str) -> u64 {
        let apps = self.apps.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        apps.get(app_id).map(|a| a.len() as u64).unwrap_or(0)
    }

    /// Добавить аннотации одной пачкой; возвращает сколько добавлено.
    ///
    /// При `limit = Some(n)` итоговое количество не может превысить `n`:
    /// проверка и запись идут под одной блокировкой, поэтому параллельные
    /// импорты одного приложения не обходят лимит.
    pub fn append_within(
        &self,
        app_id: &str,
        drafts: Vec<AnnotationDraft>,
        limit: Option<u64>,
    ) -> Result<usize> {
        let now = Utc::now();
        let mut apps = self.apps.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let entries = apps.entry(app_id.to_string()).or_default();
        let added = drafts.len();

        if let Some(limit) = limit {
            if (entries.len() + added) as u64 > limit {
                bail!(LIMIT_EXCEEDED_MESSAGE);
            }
        }

        entries.extend(drafts.into_iter().map(|d| Annotation {
            id: Uuid::new_v4(),
            question: d.question,
            answer: d.answer,
            created_at: now,
        }));
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drafts(n: usize) -> Vec<AnnotationDraft> {
        (0..n)
            .map(|i| AnnotationDraft {
                question: format!("q{}", i),
                answer: format!("a{}", i),
            })
            .collect()
    }

    #[test]
    fn test_append_and_count_per_app() {
        let store = AnnotationStore::new();
        assert_eq!(store.append_within("app-a", drafts(2), None).unwrap(), 2);
        assert_eq!(store.count("app-a"), 2);
        assert_eq!(store.count("app-b"), 0);
    }

    #[test]
    fn test_append_up_to_limit() {
        let store = AnnotationStore::new();
        assert_eq!(store.append_within("app", drafts(2), Some(3)).unwrap(), 2);
        assert_eq!(store.append_within("app", drafts(1), Some(3)).unwrap(), 1);
        assert_eq!(store.count("app"), 3);
    }

    #[test]
    fn test_append_over_limit_adds_nothing() {
        let store = AnnotationStore::new();
        store.append_within("app", drafts(2), Some(3)).unwrap();

        let err = store.append_within("app", drafts(2), Some(3)).unwrap_err();
        assert_eq!(err.to_string(), LIMIT_EXCEEDED_MESSAGE);
        assert_eq!(store.count("app"), 2);
    }

    #[test]
    fn test_parallel_appends_respect_limit() {
        let store = AnnotationStore::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.append_within("app", drafts(2), Some(5)).is_ok())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(accepted, 2);
        assert_eq!(store.count("app"), 4);
    }
}
