//! User-facing notices.
//!
//! Controllers never show dialogs themselves. Failures that the user must
//! see, and questions that need an answer, go through a [`Notifier`] the
//! host supplies. [`LogNotifier`] is the headless default.

use parking_lot::Mutex;
use swingset_core::logging::targets;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Informational message.
    Information,
    /// Something unexpected that did not stop the operation.
    Warning,
    /// An operation failed.
    Critical,
    /// A yes/no question.
    Question,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Dialog title.
    pub title: String,
    /// Message body.
    pub text: String,
}

impl Notice {
    fn with_level(level: NoticeLevel, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            text: text.into(),
        }
    }

    /// An informational notice.
    pub fn information(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Information, title, text)
    }

    /// A warning notice.
    pub fn warning(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Warning, title, text)
    }

    /// A failure notice.
    pub fn critical(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Critical, title, text)
    }

    /// A question for [`Notifier::confirm`].
    pub fn question(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Question, title, text)
    }
}

/// Shows notices to the user.
pub trait Notifier: Send + Sync {
    /// Show a modal notice.
    fn notify(&self, notice: &Notice);

    /// Ask a yes/no question. The default answers yes.
    fn confirm(&self, notice: &Notice) -> bool {
        self.notify(notice);
        true
    }
}

/// A notifier that writes notices to the log and answers every question yes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Critical => {
                tracing::error!(target: targets::NOTICE, title = %notice.title, "{}", notice.text)
            }
            NoticeLevel::Warning => {
                tracing::warn!(target: targets::NOTICE, title = %notice.title, "{}", notice.text)
            }
            NoticeLevel::Information | NoticeLevel::Question => {
                tracing::info!(target: targets::NOTICE, title = %notice.title, "{}", notice.text)
            }
        }
    }
}

/// A notifier that records notices and answers questions from a preset.
///
/// Useful in headless hosts and tests.
#[derive(Debug)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    answer: Mutex<bool>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingNotifier {
    /// Create a notifier that answers yes.
    pub fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            answer: Mutex::new(true),
        }
    }

    /// Set the answer given to later questions.
    pub fn set_answer(&self, answer: bool) {
        *self.answer.lock() = answer;
    }

    /// Notices shown so far, questions included.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Number of notices at `level`.
    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices
            .lock()
            .iter()
            .filter(|notice| notice.level == level)
            .count()
    }

    /// Forget recorded notices.
    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().push(notice.clone());
    }

    fn confirm(&self, notice: &Notice) -> bool {
        self.notices.lock().push(notice.clone());
        *self.answer.lock()
    }
}
