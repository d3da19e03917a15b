//! Parsed message content.
//!
//! [`FullMessage`] is the content loader's output: everything the display
//! pane needs for one message. It is opaque to the rest of the core beyond
//! the accessors used for rendering decisions (which body part is primary,
//! whether a distinct plain-text tab should exist).

use chrono::{DateTime, Utc};
use std::fmt;

/// One addressing-field participant: optional display name plus address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name, when the header carried one.
    pub name: Option<String>,
    /// The bare address.
    pub address: String,
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if !name.is_empty() => write!(f, "{} <{}>", name, self.address),
            _ => f.write_str(&self.address),
        }
    }
}

/// An embedded inline resource (e.g. an image referenced as `cid:...` from
/// the rich body), keyed by its content identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineResource {
    /// Content identifier without the surrounding angle brackets.
    pub content_id: String,
    /// Media type such as `image/png`.
    pub media_type: String,
    /// Raw resource bytes.
    pub data: Vec<u8>,
}

/// Full content of one message, produced by a content loader.
#[derive(Debug, Clone, Default)]
pub struct FullMessage {
    /// Display header list (name, value) in header order.
    pub headers: Vec<(String, String)>,
    /// Sender mailboxes.
    pub from: Vec<Mailbox>,
    /// Primary recipients.
    pub to: Vec<Mailbox>,
    /// Carbon-copy recipients.
    pub cc: Vec<Mailbox>,
    /// Blind carbon-copy recipients (present for captured outbound mail).
    pub bcc: Vec<Mailbox>,
    /// Date header, when parseable.
    pub date: Option<DateTime<Utc>>,
    /// Subject, empty string when absent.
    pub subject: String,
    /// Rich (HTML) body part, when present.
    pub html_body: Option<String>,
    /// Plain-text body part, when present.
    pub text_body: Option<String>,
    /// Inline resources referenced from the rich body.
    pub inline_resources: Vec<InlineResource>,
}

impl FullMessage {
    /// Whether the rich (structured) variant is the primary body.
    ///
    /// The rich part wins whenever it exists; otherwise the plain part is
    /// primary; a message with neither renders an empty content area.
    pub fn has_rich_body(&self) -> bool {
        self.html_body.is_some()
    }

    /// Whether a secondary plain-text tab should be offered: a distinct
    /// plain part exists alongside the rich primary body.
    pub fn has_distinct_plain_part(&self) -> bool {
        self.html_body.is_some() && self.text_body.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Sender string for the notification side channel.
    pub fn sender_display(&self) -> String {
        self.from
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "(unknown sender)".to_string())
    }
}
