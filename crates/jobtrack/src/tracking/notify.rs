use serde::{Deserialize, Serialize};

/// Outcome category shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Abstract user-facing notification capability (toasts, e-mail, push).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
}
