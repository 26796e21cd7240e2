use std::time::Duration;

use serde::Serialize;

/// How long the page waits before leaving after a successful submit.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient notification. The page queues them; the caller drains and shows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Where the page asks to be taken next. Routing itself belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Back { delay: Duration },
    Login,
}
