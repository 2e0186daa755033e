//! User-facing feedback ("toasts").
//!
//! Controllers report every outcome through a [`Notifier`]; the console
//! collects notices in a [`NoticeBuffer`] and prints them with the command
//! result.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notice {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: None,
        }
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            description: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Collects notices in order of arrival.
#[derive(Default)]
pub struct NoticeBuffer {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Notifier for NoticeBuffer {
    fn notify(&self, notice: Notice) {
        log_notice(&notice);
        if let Ok(mut guard) = self.notices.lock() {
            guard.push(notice);
        }
    }
}

/// Only logs; used when nobody renders notices.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        log_notice(&notice);
    }
}

fn log_notice(notice: &Notice) {
    let description = notice.description.as_deref().unwrap_or("");
    match notice.level {
        NoticeLevel::Success => info!(title = %notice.title, description, "notice"),
        NoticeLevel::Warning => warn!(title = %notice.title, description, "notice"),
        NoticeLevel::Error => error!(title = %notice.title, description, "notice"),
    }
}

/// Feedback texts for one collection's mutations.
#[derive(Debug, Clone, Copy)]
pub struct ListMessages {
    pub created: &'static str,
    pub create_failed: &'static str,
    pub updated: &'static str,
    pub update_failed: &'static str,
    pub deleted: &'static str,
    pub delete_failed: &'static str,
    /// Warning shown when a create is rejected for insufficient stock.
    /// `None` means the collection never distinguishes that case.
    pub insufficient_on_create: Option<&'static str>,
    pub insufficient_on_update: Option<&'static str>,
    /// Update failures go to the log unless this is `false`.
    pub log_update_failures: bool,
}
