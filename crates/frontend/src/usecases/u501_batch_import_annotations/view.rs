use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u501_batch_import_annotations::{
    run_batch_import, BatchImportAnnotations, AnnotationQuota, BatchImportError, ControllerState, ImportArtifact,
    NotificationKind, Outcome, PollingConfig, PollingController,
};
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::api::{self, HttpJobStatusClient};
use crate::shared::export::{build_csv, download_csv};
use crate::shared::modal_frame::{defer, ModalFrame};
use crate::shared::notice::{NoticeBar, NoticeService};

const TEMPLATE_FILE_NAME: &str = "annotations_template.csv";

/// Пауза между проверками статуса
async fn sleep(delay: Duration) {
    let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
    TimeoutFuture::new(millis).await;
}

async fn read_artifact(file: web_sys::File) -> Result<ImportArtifact, String> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("Ошибка чтения файла: {:?}", e))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    ImportArtifact::new(file.name(), bytes).map_err(|e| e.to_string())
}

fn download_template() {
    let content = build_csv(
        &["question", "answer"],
        &[
            vec!["Как сбросить пароль?".into(), "Откройте профиль и нажмите «Сбросить пароль».".into()],
            vec!["Сколько хранятся данные?".into(), "30 дней".into()],
        ],
    );
    if let Err(e) = download_csv(&content, TEMPLATE_FILE_NAME) {
        log::error!("[u501] template download failed: {}", e);
    }
}

/// Модальное окно пакетного импорта аннотаций из CSV.
///
/// Окно владеет своим контроллером: закрытие окна отменяет импорт, и
/// поздние ответы сервера уже ничего не меняют.
#[component]
pub fn BatchImportModal(
    #[prop(into)] app_id: String,
    /// Пользователь закрыл окно
    on_cancel: Callback<()>,
    /// Импорт завершен, хосту пора обновить данные
    on_added: Callback<()>,
) -> impl IntoView {
    let notices = use_context::<NoticeService>().expect("NoticeService not provided in context");

    let state = RwSignal::new(ControllerState::Idle);
    let selected = RwSignal::new(None::<ImportArtifact>);
    let file_error = RwSignal::new(None::<String>);
    let quota = RwSignal::new(None::<AnnotationQuota>);
    let checking_quota = RwSignal::new(false);

    let controller = PollingController::new(PollingConfig::default(), notices, move || defer(on_added))
        .on_transition(move |next| {
            let _ = state.try_set(next);
        });
    let controller = StoredValue::new_local(Rc::new(RefCell::new(controller)));
    let app_id = StoredValue::new(app_id);

    // Квота при открытии окна
    Effect::new(move || {
        spawn_local(async move {
            match api::fetch_quota(&app_id.get_value()).await {
                Ok(q) => {
                    let _ = quota.try_set(Some(q));
                }
                Err(e) => log::warn!("[u501] quota load failed: {}", e),
            }
        });
    });

    on_cleanup(move || {
        controller.try_with_value(|controller| {
            if let Ok(mut controller) = controller.try_borrow_mut() {
                controller.cancel();
            }
        });
    });

    let quota_full = move || quota.get().map(|q| q.is_exhausted()).unwrap_or(false);
    let is_busy = move || state.get().is_active();
    let run_disabled =
        Signal::derive(move || selected.get().is_none() || quota_full() || is_busy() || checking_quota.get());

    let handle_file_select = move |ev: web_sys::Event| {
        let file = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));

        let Some(file) = file else {
            selected.set(None);
            return;
        };

        spawn_local(async move {
            match read_artifact(file).await {
                Ok(artifact) => {
                    let _ = file_error.try_set(None);
                    let _ = selected.try_set(Some(artifact));
                }
                Err(e) => {
                    let _ = selected.try_set(None);
                    let _ = file_error.try_set(Some(e));
                }
            }
        });
    };

    let handle_run = move |_| {
        let Some(artifact) = selected.get_untracked() else {
            return;
        };
        let controller = controller.get_value();
        let app_id = app_id.get_value();
        checking_quota.set(true);
        notices.clear();

        spawn_local(async move {
            // Квота могла измениться, пока окно было открыто
            let fresh = api::fetch_quota(&app_id).await;
            let _ = checking_quota.try_set(false);
            let fresh = match fresh {
                Ok(q) => q,
                Err(e) => {
                    notices.show(NotificationKind::Error, format!("Не удалось проверить квоту: {}", e));
                    return;
                }
            };
            let _ = quota.try_set(Some(fresh));

            let client = HttpJobStatusClient::new(app_id);
            match run_batch_import(&controller, &client, artifact, &fresh, sleep).await {
                Ok(Some(Outcome::Completed { job_id })) => {
                    log::info!("[u501] job {} completed", job_id);
                }
                Ok(Some(Outcome::Failed(err))) => log::warn!("[u501] import failed: {}", err),
                Ok(None) => log::debug!("[u501] import discarded"),
                Err(BatchImportError::QuotaExceeded) => {
                    log::info!("[u501] import blocked by quota");
                }
                Err(err) if err.is_fatal() => log::error!("[u501] {}", err),
                Err(err) => log::warn!("[u501] {}", err),
            }
        });
    };

    let handle_cancel = move |_| {
        controller.with_value(|controller| {
            if let Ok(mut controller) = controller.try_borrow_mut() {
                controller.cancel();
            }
        });
        defer(on_cancel);
    };

    let status_text = move || match state.get() {
        ControllerState::Submitting => "Загрузка файла...",
        ControllerState::Waiting => "Задача в очереди...",
        ControllerState::Processing => "Импорт аннотаций...",
        _ => "",
    };

    view! {
        <ModalFrame title=BatchImportAnnotations::display_name() on_close=on_cancel>
            <div class="modal__body" style="display: flex; flex-direction: column; gap: var(--spacing-md);">
                <Show when=quota_full>
                    <MessageBar intent=MessageBarIntent::Warning>
                        {move || {
                            let (usage, total) = quota.get().map(|q| (q.usage, q.total)).unwrap_or_default();
                            format!("Квота аннотаций исчерпана ({} из {}). Повысьте тариф, чтобы продолжить.", usage, total)
                        }}
                    </MessageBar>
                </Show>

                <div>
                    <input type="file" accept=".csv" on:change=handle_file_select />
                    {move || {
                        selected.get().map(|a| view! {
                            <span style="margin-left: var(--spacing-sm);">
                                {format!("{} ({} байт)", a.file_name(), a.len())}
                            </span>
                        })
                    }}
                </div>

                {move || file_error.get().map(|e| view! {
                    <MessageBar intent=MessageBarIntent::Error>{e}</MessageBar>
                })}

                <div style="font-size: 0.9em;">
                    "CSV: первая строка содержит заголовок "<code>"question,answer"</code>", далее пары вопрос/ответ. "
                    <a href="#" on:click=move |ev: leptos::ev::MouseEvent| {
                        ev.prevent_default();
                        download_template();
                    }>"Скачать шаблон"</a>
                </div>

                <div style="color: var(--color-text-secondary);">{status_text}</div>

                <div class="modal__footer" style="display: flex; justify-content: flex-end; gap: var(--spacing-sm);">
                    <Button appearance=ButtonAppearance::Secondary on_click=handle_cancel>
                        "Отмена"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Primary
                        loading=Signal::derive(is_busy)
                        disabled=run_disabled
                        on_click=handle_run
                    >
                        "Импортировать"
                    </Button>
                </div>
            </div>
        </ModalFrame>
    }
}

/// Страница аннотаций приложения с кнопкой пакетного импорта
#[component]
pub fn BatchImportPage(#[prop(into)] app_id: String) -> impl IntoView {
    let show_modal = RwSignal::new(false);
    let quota = RwSignal::new(None::<AnnotationQuota>);
    let refresh = RwSignal::new(0u32);
    let app_id = StoredValue::new(app_id);
    let page_id = format!("{}--usecase", BatchImportAnnotations::full_name());

    Effect::new(move || {
        refresh.track();
        spawn_local(async move {
            match api::fetch_quota(&app_id.get_value()).await {
                Ok(q) => {
                    let _ = quota.try_set(Some(q));
                }
                Err(e) => log::warn!("[u501] quota load failed: {}", e),
            }
        });
    });

    let on_cancel = Callback::new(move |_| show_modal.set(false));
    let on_added = Callback::new(move |_| {
        show_modal.set(false);
        refresh.update(|n| *n += 1);
    });

    view! {
        <div id=page_id class="page" data-page-category="usecase">
            <div class="page__header" style="display: flex; align-items: center; gap: var(--spacing-md);">
                <h2>"Аннотации"</h2>
                <Button appearance=ButtonAppearance::Primary on_click=move |_| show_modal.set(true)>
                    "Пакетный импорт"
                </Button>
            </div>
            <div class="page__content">
                <NoticeBar />
                {move || quota.get().map(|q| {
                    let text = match q.remaining() {
                        Some(_) => format!("Аннотаций: {} из {}", q.usage, q.total),
                        None => format!("Аннотаций: {}", q.usage),
                    };
                    view! { <div>{text}</div> }
                })}
            </div>
            <Show when=move || show_modal.get()>
                <BatchImportModal app_id=app_id.get_value() on_cancel=on_cancel on_added=on_added />
            </Show>
        </div>
    }
}
