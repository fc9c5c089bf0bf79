use log::{error, info, warn};

use crate::activity::{ListenerFault, Observable, StackError};
use crate::api::{DataError, QandaApi};
use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// One line of feedback shown below the active screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// Shared state handed to every screen.
pub struct AppContext {
    data: QandaApi,
    settings: Settings,
    user_id: Observable<Option<String>>,
    status: Observable<Option<StatusMessage>>,
}

impl AppContext {
    pub fn new(data: QandaApi, settings: Settings) -> Self {
        Self {
            data,
            settings,
            user_id: Observable::new(None),
            status: Observable::new(None),
        }
    }

    pub fn data(&self) -> &QandaApi {
        &self.data
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Id of the logged in user; empty until login completes.
    pub fn user_id(&self) -> &Observable<Option<String>> {
        &self.user_id
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.user_id.get()
    }

    pub fn status(&self) -> &Observable<Option<StatusMessage>> {
        &self.status
    }

    pub fn notify(&self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text);
        self.status.set(Some(StatusMessage::info(text)));
    }

    /// Show a failed data request as `<what>: <error>`.
    pub fn report_error(&self, what: &str, err: &DataError) {
        warn!("{}: {} ({})", what, err, err.kind);
        self.status.set(Some(StatusMessage::error(format!("{}: {}", what, err))));
    }

    pub fn report_stack_error(&self, err: &StackError) {
        error!("Navigation failed: {}", err);
        self.status.set(Some(StatusMessage::error(format!("Navigation failed: {}", err))));
    }

    pub fn report_fault(&self, fault: &ListenerFault) {
        self.status.set(Some(StatusMessage::error(fault.to_string())));
    }

    pub fn clear_status(&self) {
        if self.status.with(Option::is_some) {
            self.status.set(None);
        }
    }
}
