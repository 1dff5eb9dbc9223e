use crate::shared::notice::NoticeService;
use crate::usecases::u501_batch_import_annotations::BatchImportPage;
use leptos::prelude::*;

const DEFAULT_APP_ID: &str = "default";

/// Приложение из строки запроса (`?app_id=...`), значение декодируется
fn app_id_from_query(search: &str) -> String {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "app_id")
        .and_then(|(_, value)| {
            urlencoding::decode(&value.replace('+', " "))
                .ok()
                .map(|v| v.into_owned())
        })
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_APP_ID.to_string())
}

fn app_id_from_location() -> String {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    app_id_from_query(&search)
}

#[component]
pub fn App() -> impl IntoView {
    // Уведомления живут на уровне приложения
    provide_context(NoticeService::new());

    view! {
        <BatchImportPage app_id=app_id_from_location() />
    }
}
