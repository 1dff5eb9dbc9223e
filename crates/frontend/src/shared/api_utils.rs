//! Адрес backend-сервера для запросов из браузера

/// Порт backend (см. `[server] port` в config.toml)
const BACKEND_PORT: u16 = 3000;

/// Базовый URL API: схема и хост текущей страницы, порт backend.
///
/// Пустая строка, если `window` недоступен (тогда пути остаются относительными).
pub fn api_base() -> String {
    let window = match web_sys::window() {
        Some(w) => w,
        None => return String::new(),
    };
    let location = window.location();
    let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
    let hostname = location
        .hostname()
        .unwrap_or_else(|_| "127.0.0.1".to_string());
    format!("{}//{}:{}", protocol, hostname, BACKEND_PORT)
}

/// Полный URL из пути вида `/api/...`
pub fn api_url(path: &str) -> String {
    format!("{}{}", api_base(), path)
}
