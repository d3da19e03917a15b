//! OS-notification side channel.
//!
//! Once per newly arrived message, after its content resolves, the
//! controller publishes a notification carrying sender and subject (each
//! truncated for display) to an external notification surface. The core
//! does not own that surface; it only publishes through the sink trait.

use crate::model::FullMessage;
use tracing::info;

/// How long a notification stays on screen.
pub const NOTIFICATION_DURATION_MS: u64 = 5000;

/// Maximum characters for the title and body fields.
pub const NOTIFICATION_TEXT_LIMIT: usize = 50;

/// One notification to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Sender display string, truncated.
    pub title: String,
    /// Subject line, truncated.
    pub body: String,
    /// Display duration in milliseconds.
    pub duration_ms: u64,
}

impl Notification {
    /// Build the new-message notification for a resolved message.
    pub fn for_message(message: &FullMessage) -> Self {
        Self {
            title: truncate_display(&message.sender_display(), NOTIFICATION_TEXT_LIMIT),
            body: truncate_display(&message.subject, NOTIFICATION_TEXT_LIMIT),
            duration_ms: NOTIFICATION_DURATION_MS,
        }
    }
}

/// External notification surface the core publishes to.
pub trait NotificationSink: Send {
    /// Publish one notification.
    fn notify(&self, notification: &Notification);
}

impl<S: NotificationSink + ?Sized> NotificationSink for Box<S> {
    fn notify(&self, notification: &Notification) {
        (**self).notify(notification);
    }
}

/// Sink that records notifications in the log instead of showing them.
/// Used by the headless runtime and when notifications are disabled at the
/// OS integration level.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: &Notification) {
        info!(
            title = %notification.title,
            body = %notification.body,
            duration_ms = notification.duration_ms,
            "new message notification"
        );
    }
}

/// Sink that drops everything (notifications disabled).
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notification: &Notification) {}
}

/// Truncate to at most `max_chars` characters, respecting UTF-8 boundaries.
fn truncate_display(raw: &str, max_chars: usize) -> String {
    match raw.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => raw[..byte_idx].to_string(),
        None => raw.to_string(),
    }
}
