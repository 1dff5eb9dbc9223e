//! Машина состояний пакетного импорта.
//!
//! Контроллер синхронный и сам никогда не ждет: каждое событие
//! (`submit`, результат создания задачи, результат проверки статуса, отмена)
//! применяется сразу, а наружу возвращается `Step`: что делать дальше.
//! Таймеры и сетевые вызовы принадлежат хосту (см. `runner`).
//!
//! Каждая отправка получает свой `Ticket`. Результаты со старым тикетом
//! или пришедшие после отмены отбрасываются без побочных эффектов.

use std::time::Duration;

use super::error::{BatchImportError, TransportError};
use super::request::ImportArtifact;
use super::response::{BatchImportStatusResponse, JobStatus};
use super::session::{BatchImportSession, SessionStatus};

/// Пауза между проверками статуса
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

const SUCCESS_MESSAGE: &str = "Пакетный импорт аннотаций завершен";
const UNKNOWN_REMOTE_ERROR: &str = "Неизвестная ошибка";

/// Настройки опроса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Фиксированная пауза между проверками (без экспоненциального роста)
    pub interval: Duration,
    /// Максимум незавершенных ответов подряд; `None`: опрашивать до конца
    pub max_polls: Option<u32>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
        }
    }
}

/// Разрешено ли сейчас запускать импорт (квота тарифа)
pub trait QuotaGate {
    fn is_allowed(&self) -> bool;
}

impl QuotaGate for bool {
    fn is_allowed(&self) -> bool {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Куда показывать итог пользователю. Ничего не возвращает.
pub trait NotificationSink {
    fn notify(&self, kind: NotificationKind, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    Idle,
    Submitting,
    Waiting,
    Processing,
    Completed,
    Error,
    Cancelled,
}

impl ControllerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ControllerState::Completed | ControllerState::Error | ControllerState::Cancelled
        )
    }

    /// Есть задача в работе
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ControllerState::Submitting | ControllerState::Waiting | ControllerState::Processing
        )
    }

    fn from_job_status(status: JobStatus) -> Self {
        match status {
            JobStatus::Waiting => ControllerState::Waiting,
            JobStatus::Processing => ControllerState::Processing,
            JobStatus::Completed => ControllerState::Completed,
            JobStatus::Error => ControllerState::Error,
        }
    }
}

/// Поколение отправки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ticket(u64);

impl Ticket {
    fn next(self) -> Self {
        Ticket(self.0 + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { job_id: String },
    Failed(BatchImportError),
}

/// Что хост должен сделать после события
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Запланировать следующую проверку через `delay`
    Reschedule { delay: Duration },
    /// Сессия завершена, уведомление уже отправлено
    Finished(Outcome),
    /// Результат относится к отмененной или замененной сессии
    Discarded,
}

pub struct PollingController {
    config: PollingConfig,
    state: ControllerState,
    session: Option<BatchImportSession>,
    ticket: Ticket,
    polls: u32,
    notifier: Box<dyn NotificationSink>,
    on_completed: Box<dyn FnMut()>,
    on_transition: Option<Box<dyn FnMut(ControllerState)>>,
}

impl PollingController {
    pub fn new(
        config: PollingConfig,
        notifier: impl NotificationSink + 'static,
        on_completed: impl FnMut() + 'static,
    ) -> Self {
        Self {
            config,
            state: ControllerState::Idle,
            session: None,
            ticket: Ticket::default(),
            polls: 0,
            notifier: Box::new(notifier),
            on_completed: Box::new(on_completed),
            on_transition: None,
        }
    }

    /// Наблюдатель получает каждое новое состояние по порядку
    pub fn on_transition(mut self, observer: impl FnMut(ControllerState) + 'static) -> Self {
        self.on_transition = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn session(&self) -> Option<&BatchImportSession> {
        self.session.as_ref()
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Начать новую сессию. Квота проверяется при каждом вызове.
    pub fn submit(
        &mut self,
        artifact: ImportArtifact,
        quota: &dyn QuotaGate,
    ) -> Result<Ticket, BatchImportError> {
        if self.state.is_active() {
            log::warn!("[u501] submit rejected: import already in flight ({:?})", self.state);
            return Err(BatchImportError::AlreadyInFlight);
        }
        if !quota.is_allowed() {
            log::info!("[u501] submit rejected: annotation quota exhausted");
            return Err(BatchImportError::QuotaExceeded);
        }

        log::info!(
            "[u501] submitting {} ({} bytes)",
            artifact.file_name(),
            artifact.len()
        );
        self.ticket = self.ticket.next();
        self.session = Some(BatchImportSession::new(artifact));
        self.polls = 0;
        self.enter(ControllerState::Submitting);
        Ok(self.ticket)
    }

    /// Результат создания задачи на сервере
    pub fn on_created(
        &mut self,
        ticket: Ticket,
        result: Result<String, TransportError>,
    ) -> Result<Step, BatchImportError> {
        if !self.is_current(ticket) || self.state != ControllerState::Submitting {
            log::debug!("[u501] discarding create result for stale ticket {:?}", ticket);
            return Ok(Step::Discarded);
        }

        let job_id = match result {
            Ok(job_id) => job_id,
            Err(e) => return self.fail(BatchImportError::SubmissionFailed(e)),
        };

        if let Some(session) = self.session.as_mut() {
            session.assign_job_id(job_id.as_str())?;
            session.advance(SessionStatus::Waiting)?;
            log::info!(
                "[u501] job {} created for {}",
                job_id,
                session.input_artifact().file_name()
            );
        }
        self.enter(ControllerState::Waiting);
        Ok(Step::Reschedule {
            delay: self.config.interval,
        })
    }

    /// Идентификатор задачи для запланированной проверки. `None` означает,
    /// что сессия отменена или заменена и проверку выполнять не нужно.
    pub fn pending_job(&self, ticket: Ticket) -> Option<String> {
        if !self.is_current(ticket) || !self.is_polling() {
            return None;
        }
        self.session
            .as_ref()
            .and_then(|s| s.job_id())
            .map(str::to_string)
    }

    /// Результат очередной проверки статуса
    pub fn on_polled(
        &mut self,
        ticket: Ticket,
        result: Result<BatchImportStatusResponse, TransportError>,
    ) -> Result<Step, BatchImportError> {
        if !self.is_current(ticket) || !self.is_polling() {
            log::debug!("[u501] discarding poll result for stale ticket {:?}", ticket);
            return Ok(Step::Discarded);
        }

        let report = match result {
            Ok(report) => report,
            Err(e) => return self.fail(BatchImportError::PollingTransport(e)),
        };
        let job_id = self.current_job_id();

        match report.job_status {
            JobStatus::Waiting | JobStatus::Processing => {
                if let Some(session) = self.session.as_mut() {
                    session.advance(report.job_status.into())?;
                }
                self.enter(ControllerState::from_job_status(report.job_status));
                self.polls += 1;

                if let Some(max) = self.config.max_polls {
                    if self.polls >= max {
                        return self.fail(BatchImportError::PollingTimedOut {
                            job_id,
                            attempts: self.polls,
                        });
                    }
                }
                Ok(Step::Reschedule {
                    delay: self.config.interval,
                })
            }
            JobStatus::Completed => {
                if let Some(session) = self.session.as_mut() {
                    session.advance(SessionStatus::Completed)?;
                }
                self.polls += 1;
                log::info!("[u501] job {} completed after {} checks", job_id, self.polls);
                self.enter(ControllerState::Completed);
                self.session = None;
                self.notifier.notify(NotificationKind::Success, SUCCESS_MESSAGE);
                (self.on_completed)();
                Ok(Step::Finished(Outcome::Completed { job_id }))
            }
            JobStatus::Error => {
                self.polls += 1;
                let message = report
                    .error_message()
                    .unwrap_or(UNKNOWN_REMOTE_ERROR)
                    .to_string();
                self.fail(BatchImportError::RemoteJob { job_id, message })
            }
        }
    }

    /// Отмена (хост закрыт или пользователь закрыл окно). Идемпотентна.
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        log::info!("[u501] import cancelled in state {:?}", self.state);
        self.session = None;
        self.enter(ControllerState::Cancelled);
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket == self.ticket && self.session.is_some()
    }

    fn is_polling(&self) -> bool {
        matches!(self.state, ControllerState::Waiting | ControllerState::Processing)
    }

    fn current_job_id(&self) -> String {
        self.session
            .as_ref()
            .and_then(|s| s.job_id())
            .unwrap_or_default()
            .to_string()
    }

    fn enter(&mut self, state: ControllerState) {
        log::debug!("[u501] {:?} -> {:?}", self.state, state);
        self.state = state;
        if let Some(observer) = self.on_transition.as_mut() {
            observer(state);
        }
    }

    fn fail(&mut self, error: BatchImportError) -> Result<Step, BatchImportError> {
        if let Some(session) = self.session.as_mut() {
            session.advance(SessionStatus::Error)?;
        }
        log::warn!("[u501] import failed: {}", error);
        self.enter(ControllerState::Error);
        self.session = None;
        self.notifier
            .notify(NotificationKind::Error, &error.to_string());
        Ok(Step::Finished(Outcome::Failed(error)))
    }
}
