use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// Запустить callback на следующем тике.
///
/// Хост может размонтировать окно прямо в обработчике; синхронный вызов
/// оставил бы Leptos с удаленным обработчиком события.
pub fn defer(callback: Callback<()>) {
    spawn_local(async move {
        TimeoutFuture::new(0).await;
        callback.run(());
    });
}

/// Оверлей и карточка модального окна с заголовком
#[component]
pub fn ModalFrame(
    /// Заголовок окна
    #[prop(into)]
    title: String,
    /// Закрытие по клику на оверлей или кнопке ×
    on_close: Callback<()>,
    children: Children,
) -> impl IntoView {
    let overlay_mouse_down = RwSignal::new(false);

    let is_direct_overlay_event = |ev: &ev::MouseEvent| -> bool {
        match (ev.target(), ev.current_target()) {
            (Some(t), Some(ct)) => t == ct,
            _ => false,
        }
    };

    // Закрываем, только если и нажатие, и отпускание были на самом оверлее
    let handle_overlay_mouse_down = move |ev: ev::MouseEvent| {
        overlay_mouse_down.set(is_direct_overlay_event(&ev));
    };

    let handle_overlay_click = move |ev: ev::MouseEvent| {
        let should_close = overlay_mouse_down.get_untracked() && is_direct_overlay_event(&ev);
        overlay_mouse_down.set(false);
        if should_close {
            defer(on_close);
        }
    };

    view! {
        <div
            class="modal-overlay"
            style="z-index: 1000;"
            on:mousedown=handle_overlay_mouse_down
            on:click=handle_overlay_click
        >
            <div class="modal" style="position: relative;" on:click=|ev: ev::MouseEvent| ev.stop_propagation()>
                <div class="modal__header">
                    <span class="modal__title">{title}</span>
                    <button class="modal__close" on:click=move |_| defer(on_close)>
                        "×"
                    </button>
                </div>
                {children()}
            </div>
        </div>
    }
}
