//! Асинхронный драйвер: выполняет шаги контроллера, ходит в сеть и ждет
//! между проверками. Ожидание передается снаружи (в браузере это
//! `gloo_timers`, в тестах мгновенная заглушка).

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use super::client::JobStatusClient;
use super::controller::{Outcome, PollingController, QuotaGate, Step};
use super::error::BatchImportError;
use super::request::ImportArtifact;

/// Отправить файл и опрашивать статус до завершения.
///
/// Возвращает `Ok(Some(outcome))`, когда сессия дошла до конца (уведомление
/// уже показано), `Ok(None)`, если сессию отменили. `Err` означает отказ до
/// создания задачи (`QuotaExceeded`, `AlreadyInFlight`) либо нарушение
/// инварианта (`InvalidTransition`).
///
/// Заимствование контроллера никогда не держится через `.await`, поэтому
/// UI может вызвать `cancel()` в любой момент ожидания.
pub async fn run_batch_import<C, D, F>(
    controller: &Rc<RefCell<PollingController>>,
    client: &C,
    artifact: ImportArtifact,
    quota: &dyn QuotaGate,
    delay: D,
) -> Result<Option<Outcome>, BatchImportError>
where
    C: JobStatusClient + ?Sized,
    D: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let ticket = controller.borrow_mut().submit(artifact.clone(), quota)?;

    let created = client.create(&artifact).await;
    let mut step = controller.borrow_mut().on_created(ticket, created)?;

    loop {
        match step {
            Step::Reschedule { delay: wait } => {
                delay(wait).await;

                // Проверка могла быть отменена, пока шло ожидание
                let pending = controller.borrow().pending_job(ticket);
                let job_id = match pending {
                    Some(job_id) => job_id,
                    None => {
                        log::debug!("[u501] scheduled check skipped: session discarded");
                        return Ok(None);
                    }
                };

                let report = client.poll(&job_id).await;
                step = controller.borrow_mut().on_polled(ticket, report)?;
            }
            Step::Finished(outcome) => return Ok(Some(outcome)),
            Step::Discarded => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::super::controller::{ControllerState, NotificationKind, PollingConfig, DEFAULT_POLL_INTERVAL};
    use super::super::error::TransportError;
    use super::super::response::{BatchImportStatusResponse, JobStatus};
    use super::super::testing::{artifact, Recorder};
    use super::*;

    type PollHook = Box<dyn Fn(u32)>;

    /// Клиент с заранее заданными ответами
    #[derive(Default)]
    struct ScriptedClient {
        create: RefCell<VecDeque<Result<String, TransportError>>>,
        polls: RefCell<VecDeque<Result<BatchImportStatusResponse, TransportError>>>,
        create_calls: Cell<u32>,
        poll_calls: Cell<u32>,
        on_poll: Option<PollHook>,
    }

    impl ScriptedClient {
        fn new(
            create: Result<String, TransportError>,
            polls: Vec<Result<BatchImportStatusResponse, TransportError>>,
        ) -> Self {
            Self {
                create: RefCell::new(VecDeque::from(vec![create])),
                polls: RefCell::new(VecDeque::from(polls)),
                ..Self::default()
            }
        }
    }

    #[async_trait(?Send)]
    impl JobStatusClient for ScriptedClient {
        async fn create(&self, _artifact: &ImportArtifact) -> Result<String, TransportError> {
            self.create_calls.set(self.create_calls.get() + 1);
            self.create
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("no scripted create")))
        }

        async fn poll(&self, job_id: &str) -> Result<BatchImportStatusResponse, TransportError> {
            let n = self.poll_calls.get() + 1;
            self.poll_calls.set(n);
            if let Some(hook) = &self.on_poll {
                hook(n);
            }
            self.polls
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new(format!("no scripted poll for {job_id}"))))
        }
    }

    fn status(status: JobStatus) -> Result<BatchImportStatusResponse, TransportError> {
        Ok(BatchImportStatusResponse::new("J1", status))
    }

    fn shared(rec: &Recorder) -> Rc<RefCell<PollingController>> {
        Rc::new(RefCell::new(rec.controller(PollingConfig::default())))
    }

    #[tokio::test]
    async fn test_submit_poll_until_completed() {
        let rec = Recorder::default();
        let controller = shared(&rec);
        let client = ScriptedClient::new(
            Ok("J1".into()),
            vec![
                status(JobStatus::Waiting),
                status(JobStatus::Processing),
                status(JobStatus::Completed),
            ],
        );
        let delays = RefCell::new(Vec::new());

        let outcome = run_batch_import(&controller, &client, artifact(), &true, |d| {
            delays.borrow_mut().push(d);
            async {}
        })
        .await
        .unwrap();

        assert_eq!(outcome, Some(Outcome::Completed { job_id: "J1".into() }));
        assert_eq!(rec.success_count(), 1);
        assert_eq!(rec.error_count(), 0);
        assert_eq!(rec.completions(), 1);
        assert_eq!(client.create_calls.get(), 1);
        assert_eq!(client.poll_calls.get(), 3);
        assert_eq!(*delays.borrow(), vec![DEFAULT_POLL_INTERVAL; 3]);

        let c = controller.borrow();
        assert_eq!(c.state(), ControllerState::Completed);
        assert!(c.session().is_none());
    }

    #[tokio::test]
    async fn test_quota_denied_creates_no_job() {
        let rec = Recorder::default();
        let controller = shared(&rec);
        let client = ScriptedClient::new(Ok("J1".into()), vec![]);

        let result = run_batch_import(&controller, &client, artifact(), &false, |_| async {}).await;

        assert_eq!(result, Err(BatchImportError::QuotaExceeded));
        assert_eq!(client.create_calls.get(), 0);
        assert_eq!(controller.borrow().state(), ControllerState::Idle);
        assert!(rec.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_first_poll_transport_failure() {
        let rec = Recorder::default();
        let controller = shared(&rec);
        let client = ScriptedClient::new(
            Ok("J1".into()),
            vec![
                Err(TransportError::new("Failed to send request: network down")),
                status(JobStatus::Completed),
            ],
        );

        let outcome = run_batch_import(&controller, &client, artifact(), &true, |_| async {})
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            Some(Outcome::Failed(BatchImportError::PollingTransport(_)))
        ));
        assert_eq!(rec.error_count(), 1);
        assert_eq!(rec.success_count(), 0);
        assert!(rec.notifications()[0].1.contains("network down"));
        assert_eq!(client.poll_calls.get(), 1);
        assert_eq!(controller.borrow().state(), ControllerState::Error);
    }

    #[tokio::test]
    async fn test_cancel_while_check_scheduled() {
        let rec = Recorder::default();
        let controller = shared(&rec);
        let client = ScriptedClient::new(
            Ok("J1".into()),
            vec![status(JobStatus::Waiting), status(JobStatus::Completed)],
        );
        let sleeps = Cell::new(0u32);

        // Хост закрывается во время второго ожидания
        let outcome = run_batch_import(&controller, &client, artifact(), &true, |_| {
            sleeps.set(sleeps.get() + 1);
            if sleeps.get() == 2 {
                controller.borrow_mut().cancel();
            }
            async {}
        })
        .await
        .unwrap();

        assert_eq!(outcome, None);
        assert_eq!(client.poll_calls.get(), 1);
        assert!(rec.notifications().is_empty());
        assert_eq!(rec.completions(), 0);
        assert_eq!(controller.borrow().state(), ControllerState::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_while_check_in_flight() {
        let rec = Recorder::default();
        let controller = shared(&rec);
        let hook_controller = controller.clone();
        let client = ScriptedClient {
            on_poll: Some(Box::new(move |n| {
                if n == 2 {
                    hook_controller.borrow_mut().cancel();
                }
            })),
            ..ScriptedClient::new(
                Ok("J1".into()),
                vec![status(JobStatus::Processing), status(JobStatus::Completed)],
            )
        };

        let outcome = run_batch_import(&controller, &client, artifact(), &true, |_| async {})
            .await
            .unwrap();

        // Ответ "completed" пришел после отмены и не должен ничего показать
        assert_eq!(outcome, None);
        assert_eq!(client.poll_calls.get(), 2);
        assert!(rec.notifications().is_empty());
        assert_eq!(rec.completions(), 0);
        assert_eq!(controller.borrow().state(), ControllerState::Cancelled);
    }

    #[tokio::test]
    async fn test_submission_failure_single_notification() {
        let rec = Recorder::default();
        let controller = shared(&rec);
        let client = ScriptedClient::new(Err(TransportError::http(403, "HTTP error: 403")), vec![]);

        let outcome = run_batch_import(&controller, &client, artifact(), &true, |_| async {})
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            Some(Outcome::Failed(BatchImportError::SubmissionFailed(_)))
        ));
        assert_eq!(rec.notifications().len(), 1);
        assert_eq!(rec.notifications()[0].0, NotificationKind::Error);
        assert_eq!(client.poll_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_remote_error_after_submit_single_notification() {
        let rec = Recorder::default();
        let controller = shared(&rec);
        let client = ScriptedClient::new(
            Ok("J1".into()),
            vec![Ok(BatchImportStatusResponse::failed("J1", "The CSV file is empty."))],
        );

        run_batch_import(&controller, &client, artifact(), &true, |_| async {})
            .await
            .unwrap();

        assert_eq!(rec.notifications().len(), 1);
        assert_eq!(rec.error_count(), 1);
    }

    #[tokio::test]
    async fn test_second_run_rejected_while_first_active() {
        let rec = Recorder::default();
        let controller = shared(&rec);
        let first = ScriptedClient::new(Ok("J1".into()), vec![status(JobStatus::Completed)]);

        // Повторная отправка во время ожидания первой задачи
        let outcome = run_batch_import(&controller, &first, artifact(), &true, |_| {
            let nested = controller.borrow_mut().submit(artifact(), &true).map(|_| ());
            assert_eq!(nested, Err(BatchImportError::AlreadyInFlight));
            async {}
        })
        .await
        .unwrap();

        assert_eq!(outcome, Some(Outcome::Completed { job_id: "J1".into() }));
        assert_eq!(first.create_calls.get(), 1);
        assert_eq!(rec.success_count(), 1);
    }

    #[tokio::test]
    async fn test_max_polls_stops_unbounded_polling() {
        let rec = Recorder::default();
        let controller = Rc::new(RefCell::new(rec.controller(PollingConfig {
            max_polls: Some(3),
            ..PollingConfig::default()
        })));
        let client = ScriptedClient::new(
            Ok("J1".into()),
            vec![status(JobStatus::Waiting); 10],
        );

        let outcome = run_batch_import(&controller, &client, artifact(), &true, |_| async {})
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Some(Outcome::Failed(BatchImportError::PollingTimedOut {
                job_id: "J1".into(),
                attempts: 3,
            }))
        );
        assert_eq!(client.poll_calls.get(), 3);
        assert_eq!(rec.error_count(), 1);
    }
}
