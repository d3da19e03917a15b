//! Selection-driven load coordination.
//!
//! Owns "what is currently being loaded or displayed". On every selection
//! change the previous load session is superseded: its cancellation handle
//! fires and any late delivery is identified by ticket mismatch and
//! dropped, regardless of arrival order. At most one session is active at a
//! time by construction.
//!
//! State machine per selection change:
//!
//! ```text
//! Idle -> Loading -> { Rendered, Failed }
//! ```
//!
//! with `Loading` reachable again from any state (a new selection always
//! restarts) and `Idle` entered whenever the selection becomes empty.

use crate::loader::{ContentLoader, LoadHandle, LoadTicket};
use crate::model::{FullMessage, LoadError, Mailbox, MessageEntry, MessageToken};
use crate::render::ArtifactStore;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Placeholder title shown when no message content is displayed.
pub const NEUTRAL_TITLE: &str = "Captured message";

/// The primary body handed to a display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedBody {
    /// Rich (structured) variant, materialized to a scratch file with
    /// inline references rewritten.
    Rich {
        /// Path of the rewritten HTML artifact.
        html_path: PathBuf,
    },
    /// Plain-text variant.
    Plain {
        /// The text content.
        text: String,
    },
    /// The message carried no body part at all.
    Empty,
}

/// Everything a display surface needs for one rendered message.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    /// Token of the rendered entry.
    pub token: MessageToken,
    /// Subject line (may be empty).
    pub subject: String,
    /// Sender mailboxes.
    pub from: Vec<Mailbox>,
    /// Primary recipients.
    pub to: Vec<Mailbox>,
    /// Carbon-copy recipients.
    pub cc: Vec<Mailbox>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<Mailbox>,
    /// Date header, when present.
    pub date: Option<DateTime<Utc>>,
    /// Display header list.
    pub headers: Vec<(String, String)>,
    /// The primary body.
    pub body: RenderedBody,
    /// Content for a secondary plain-text tab; `Some` only when a distinct
    /// plain part exists alongside a rich primary body.
    pub plain_alternative: Option<String>,
}

/// What the content pane currently shows.
#[derive(Debug, Clone)]
pub enum DisplayState {
    /// No selection: all fields cleared, dependent controls disabled.
    Idle,
    /// A load is in flight for the given entry; show a loading indicator
    /// and disable destructive actions until it resolves.
    Loading {
        /// Token being loaded.
        token: MessageToken,
    },
    /// Content resolved and was materialized.
    Rendered(Box<RenderedMessage>),
    /// The load failed terminally; content area blank, selection and list
    /// remain usable and re-selection works.
    Failed {
        /// Token whose load failed.
        token: MessageToken,
    },
}

impl DisplayState {
    /// Window/header title for the current state. Anything but `Rendered`
    /// shows the neutral placeholder.
    pub fn title(&self) -> &str {
        match self {
            DisplayState::Rendered(msg) if !msg.subject.is_empty() => &msg.subject,
            _ => NEUTRAL_TITLE,
        }
    }
}

struct ActiveSession {
    ticket: LoadTicket,
    handle: LoadHandle,
    entry: MessageEntry,
}

/// Coordinates the single active load session against selection changes.
pub struct SelectionLoadCoordinator {
    active: Option<ActiveSession>,
    display: DisplayState,
}

impl Default for SelectionLoadCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionLoadCoordinator {
    /// Start idle with no active session.
    pub fn new() -> Self {
        Self {
            active: None,
            display: DisplayState::Idle,
        }
    }

    /// Current display state.
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Ticket of the active session, if one exists.
    pub fn active_ticket(&self) -> Option<LoadTicket> {
        self.active.as_ref().map(|s| s.ticket)
    }

    /// Whether destructive actions (delete, forward) are currently enabled.
    ///
    /// Disabled while a load is pending; a resolution either way (rendered
    /// or failed) re-enables them so a broken message can still be deleted.
    pub fn destructive_enabled(&self) -> bool {
        matches!(
            self.display,
            DisplayState::Rendered(_) | DisplayState::Failed { .. }
        )
    }

    /// React to a selection change.
    ///
    /// Cancels any outstanding session first (idempotent, and its late
    /// delivery will be dropped by ticket mismatch). A `None` selection
    /// clears the display; a `Some` selection starts a fresh session.
    pub fn select(&mut self, entry: Option<&MessageEntry>, loader: &dyn ContentLoader) {
        if let Some(prev) = self.active.take() {
            prev.handle.cancel();
            debug!(ticket = %prev.ticket, token = %prev.entry.token(), "superseded load session");
        }
        match entry {
            None => {
                self.display = DisplayState::Idle;
            }
            Some(entry) => {
                let ticket = LoadTicket::allocate();
                let handle = loader.fetch(entry, ticket);
                self.display = DisplayState::Loading {
                    token: entry.token().clone(),
                };
                self.active = Some(ActiveSession {
                    ticket,
                    handle,
                    entry: entry.clone(),
                });
            }
        }
    }

    /// Handle a successful content delivery.
    ///
    /// Deliveries for superseded sessions are dropped; only the active
    /// ticket may transition the display. Returns `true` when the delivery
    /// was accepted and rendered.
    pub fn on_delivered(
        &mut self,
        ticket: LoadTicket,
        message: FullMessage,
        artifacts: &ArtifactStore,
    ) -> bool {
        let Some(session) = self.active.as_ref() else {
            debug!(%ticket, "load delivery with no active session, dropping");
            return false;
        };
        if session.ticket != ticket {
            debug!(
                delivered = %ticket,
                active = %session.ticket,
                "late delivery for superseded session, dropping"
            );
            return false;
        }

        let token = session.entry.token().clone();
        let body = if message.has_rich_body() {
            match artifacts.materialize(&token, &message) {
                Ok(materialized) => match materialized.html_path {
                    Some(html_path) => RenderedBody::Rich { html_path },
                    None => RenderedBody::Empty,
                },
                Err(error) => {
                    warn!(%token, %error, "failed to materialize rendering artifacts");
                    self.display = DisplayState::Failed { token };
                    return false;
                }
            }
        } else if let Some(text) = message.text_body.clone() {
            RenderedBody::Plain { text }
        } else {
            RenderedBody::Empty
        };

        let plain_alternative = if message.has_distinct_plain_part() {
            message.text_body.clone()
        } else {
            None
        };

        self.display = DisplayState::Rendered(Box::new(RenderedMessage {
            token,
            subject: message.subject,
            from: message.from,
            to: message.to,
            cc: message.cc,
            bcc: message.bcc,
            date: message.date,
            headers: message.headers,
            body,
            plain_alternative,
        }));
        true
    }

    /// Handle a terminal load failure for the active session.
    ///
    /// Mismatched tickets are dropped. The failure is logged with the
    /// originating entry's identity; the display reverts to a blank failed
    /// state with the neutral title.
    pub fn on_failed(&mut self, ticket: LoadTicket, error: &LoadError) {
        let Some(session) = self.active.as_ref() else {
            debug!(%ticket, "load failure with no active session, dropping");
            return;
        };
        if session.ticket != ticket {
            debug!(
                delivered = %ticket,
                active = %session.ticket,
                "late failure for superseded session, dropping"
            );
            return;
        }
        let token = session.entry.token().clone();
        warn!(%token, %error, "content load failed");
        self.display = DisplayState::Failed { token };
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
