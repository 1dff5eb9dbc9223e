//! Тестовые заглушки для контроллера и драйвера

use std::cell::RefCell;
use std::rc::Rc;

use super::controller::{ControllerState, NotificationKind, NotificationSink, PollingConfig, PollingController};
use super::request::ImportArtifact;

pub fn artifact() -> ImportArtifact {
    ImportArtifact::new("faq.csv", b"question,answer\n".to_vec()).unwrap()
}

/// Записывает уведомления, вызовы колбэка и переходы состояний
#[derive(Clone, Default)]
pub struct Recorder {
    notifications: Rc<RefCell<Vec<(NotificationKind, String)>>>,
    completions: Rc<RefCell<u32>>,
    states: Rc<RefCell<Vec<ControllerState>>>,
}

impl Recorder {
    pub fn controller(&self, config: PollingConfig) -> PollingController {
        let completions = self.completions.clone();
        let states = self.states.clone();
        PollingController::new(config, self.clone(), move || *completions.borrow_mut() += 1)
            .on_transition(move |state| states.borrow_mut().push(state))
    }

    pub fn notifications(&self) -> Vec<(NotificationKind, String)> {
        self.notifications.borrow().clone()
    }

    pub fn error_count(&self) -> usize {
        self.notifications
            .borrow()
            .iter()
            .filter(|(kind, _)| *kind == NotificationKind::Error)
            .count()
    }

    pub fn success_count(&self) -> usize {
        self.notifications
            .borrow()
            .iter()
            .filter(|(kind, _)| *kind == NotificationKind::Success)
            .count()
    }

    pub fn completions(&self) -> u32 {
        *self.completions.borrow()
    }

    pub fn states(&self) -> Vec<ControllerState> {
        self.states.borrow().clone()
    }
}

impl NotificationSink for Recorder {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.notifications.borrow_mut().push((kind, message.to_string()));
    }
}
