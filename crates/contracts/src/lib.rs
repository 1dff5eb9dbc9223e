//! Общие контракты frontend/backend: DTO запросов и ответов, а также
//! клиентское ядро пакетного импорта, которое не зависит от браузера.

pub mod usecases;
