//! User feedback channel.
//!
//! Delivery is fire-and-forget: nothing in the domain waits on or branches on
//! whether a notice was shown.

use std::sync::Mutex;

use derive_new::new;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct Notice {
    pub level: Level,
    #[new(into)]
    pub message: String,
}

pub trait NotificationChannel: Send + Sync {
    fn notify(&self, notice: Notice);

    fn success(&self, message: &str) {
        self.notify(Notice::new(Level::Success, message));
    }

    fn error(&self, message: &str) {
        self.notify(Notice::new(Level::Error, message));
    }
}

/// Writes notices to the log only.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl NotificationChannel for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            Level::Success => tracing::info!("{}", notice.message),
            Level::Error => tracing::warn!("{}", notice.message),
        }
    }
}

/// Buffers notices so a request handler can hand them back to the client.
#[derive(Debug, Default)]
pub struct Notices {
    inner: Mutex<Vec<Notice>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notice> {
        match self.inner.lock() {
            Ok(mut notices) => std::mem::take(&mut *notices),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl NotificationChannel for Notices {
    fn notify(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, "{}", notice.message);
        match self.inner.lock() {
            Ok(mut notices) => notices.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_are_drained_in_order() {
        let notices = Notices::new();
        notices.success("saved");
        notices.error("failed");

        let taken = notices.take();
        assert_eq!(
            taken,
            vec![
                Notice::new(Level::Success, "saved"),
                Notice::new(Level::Error, "failed"),
            ]
        );
        assert!(notices.take().is_empty());
    }
}
