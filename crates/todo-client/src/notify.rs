//! 利用者向けの一時的な通知

use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// 表示時間
    pub duration: Duration,
}

impl Notification {
    pub fn error(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            duration,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// 通知をログに出力する
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let duration_ms = notification.duration.as_millis() as u64;
        match notification.level {
            NotificationLevel::Error => error!(duration_ms, "通知: {}", notification.message),
            NotificationLevel::Info => info!(duration_ms, "通知: {}", notification.message),
        }
    }
}

/// 受け取った通知を記録する（画面やテストから参照）
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}
