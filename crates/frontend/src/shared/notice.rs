//! Уведомления уровня страницы.
//!
//! Живут дольше модального окна, которое их отправило: окно импорта
//! закрывается сразу после успеха, а сообщение остается на странице.

use contracts::usecases::u501_batch_import_annotations::{NotificationKind, NotificationSink};
use leptos::prelude::*;
use thaw::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NotificationKind,
    pub message: String,
}

/// Сервис уведомлений, раздается через context
#[derive(Clone, Copy)]
pub struct NoticeService {
    current: RwSignal<Option<Notice>>,
}

impl NoticeService {
    pub fn new() -> Self {
        Self {
            current: RwSignal::new(None),
        }
    }

    pub fn show(&self, kind: NotificationKind, message: impl Into<String>) {
        // Сигнал мог быть уничтожен вместе со страницей
        let _ = self.current.try_set(Some(Notice {
            kind,
            message: message.into(),
        }));
    }

    pub fn clear(&self) {
        let _ = self.current.try_set(None);
    }

    pub fn current(&self) -> Option<Notice> {
        self.current.get()
    }
}

impl Default for NoticeService {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for NoticeService {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.show(kind, message);
    }
}

/// Полоса с последним уведомлением
#[component]
pub fn NoticeBar() -> impl IntoView {
    let notices = use_context::<NoticeService>().expect("NoticeService not provided in context");

    move || {
        notices.current().map(|notice| {
            let intent = match notice.kind {
                NotificationKind::Success => MessageBarIntent::Success,
                NotificationKind::Error => MessageBarIntent::Error,
            };
            view! {
                <div style="margin-bottom: var(--spacing-md); display: flex; gap: var(--spacing-sm); align-items: center;">
                    <MessageBar intent=intent>{notice.message}</MessageBar>
                    <Button appearance=ButtonAppearance::Transparent on_click=move |_| notices.clear()>
                        "×"
                    </Button>
                </div>
            }
        })
    }
}
