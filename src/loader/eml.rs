//! `.eml` file content loader backed by `mail-parser`.
//!
//! Each fetch reads the entry's backing file and parses it on a dedicated
//! background thread, then hands the completion to the delivery callback
//! (normally a clone of the controller's channel sender). The parser is an
//! external concern: the rest of the core only sees [`FullMessage`].

use crate::loader::{CancelToken, ContentLoader, LoadFinished, LoadHandle, LoadTicket};
use crate::model::{FullMessage, InlineResource, LoadError, Mailbox, MessageEntry, MessageToken};
use chrono::{DateTime, Utc};
use mail_parser::{Address, MessageParser, MimeHeaders};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Threaded loader for spool `.eml` files.
pub struct EmlLoader {
    deliver: Arc<dyn Fn(LoadFinished) + Send + Sync>,
}

impl EmlLoader {
    /// Create a loader delivering completions through `deliver`.
    pub fn new(deliver: impl Fn(LoadFinished) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    fn load_blocking(token: &MessageToken, path: &Path) -> Result<FullMessage, LoadError> {
        let raw = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = MessageParser::default()
            .parse(&raw)
            .ok_or_else(|| LoadError::Parse {
                token: token.clone(),
            })?;
        Ok(convert(&parsed))
    }
}

impl ContentLoader for EmlLoader {
    fn fetch(&self, entry: &MessageEntry, ticket: LoadTicket) -> LoadHandle {
        let cancel = CancelToken::new();
        let thread_cancel = cancel.clone();
        let deliver = Arc::clone(&self.deliver);
        let token = entry.token().clone();
        let path = entry.path().map(Path::to_path_buf);

        std::thread::spawn(move || {
            let result = match path {
                Some(path) => Self::load_blocking(&token, &path),
                None => Err(LoadError::NoBackingFile {
                    token: token.clone(),
                }),
            };
            if thread_cancel.is_cancelled() {
                debug!(%ticket, %token, "load cancelled before delivery, dropping");
                return;
            }
            deliver(LoadFinished {
                ticket,
                token,
                result,
            });
        });

        LoadHandle::new(cancel)
    }
}

/// Map the parser's message type onto the core content model.
fn convert(parsed: &mail_parser::Message<'_>) -> FullMessage {
    let from = mailboxes(parsed.from());
    let to = mailboxes(parsed.to());
    let cc = mailboxes(parsed.cc());
    let bcc = mailboxes(parsed.bcc());
    let date = parsed
        .date()
        .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0));
    let subject = parsed.subject().unwrap_or_default().to_string();

    let mut headers: Vec<(String, String)> = Vec::new();
    if !from.is_empty() {
        headers.push(("From".into(), join(&from)));
    }
    if !to.is_empty() {
        headers.push(("To".into(), join(&to)));
    }
    if !cc.is_empty() {
        headers.push(("Cc".into(), join(&cc)));
    }
    if !bcc.is_empty() {
        headers.push(("Bcc".into(), join(&bcc)));
    }
    if let Some(date) = date {
        headers.push(("Date".into(), date.to_rfc2822()));
    }
    if !subject.is_empty() {
        headers.push(("Subject".into(), subject.clone()));
    }
    if let Some(id) = parsed.message_id() {
        headers.push(("Message-ID".into(), id.to_string()));
    }

    let mut inline_resources = Vec::new();
    for part in parsed.attachments() {
        let Some(content_id) = part.content_id() else {
            continue;
        };
        let media_type = part
            .content_type()
            .map(|ct| match ct.subtype() {
                Some(sub) => format!("{}/{}", ct.ctype(), sub),
                None => ct.ctype().to_string(),
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());
        inline_resources.push(InlineResource {
            content_id: content_id.trim_matches(['<', '>']).to_string(),
            media_type,
            data: part.contents().to_vec(),
        });
    }

    FullMessage {
        headers,
        from,
        to,
        cc,
        bcc,
        date,
        subject,
        html_body: parsed.body_html(0).map(|c| c.into_owned()),
        text_body: parsed.body_text(0).map(|c| c.into_owned()),
        inline_resources,
    }
}

fn mailboxes(addr: Option<&Address<'_>>) -> Vec<Mailbox> {
    let mut out = Vec::new();
    match addr {
        Some(Address::List(list)) => {
            for a in list {
                push_addr(&mut out, a.name.as_deref(), a.address.as_deref());
            }
        }
        Some(Address::Group(groups)) => {
            for group in groups {
                for a in &group.addresses {
                    push_addr(&mut out, a.name.as_deref(), a.address.as_deref());
                }
            }
        }
        None => {}
    }
    out
}

fn push_addr(out: &mut Vec<Mailbox>, name: Option<&str>, address: Option<&str>) {
    let Some(address) = address else {
        return;
    };
    out.push(Mailbox {
        name: name.map(str::to_string),
        address: address.to_string(),
    });
}

fn join(boxes: &[Mailbox]) -> String {
    boxes
        .iter()
        .map(Mailbox::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::mpsc;
    use std::time::Duration;

    const PLAIN_EML: &[u8] = b"From: Ada Lovelace <ada@example.com>\r\n\
To: grace@example.com\r\n\
Subject: plain hello\r\n\
Date: Mon, 1 Jan 2024 10:00:00 +0000\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Just text.\r\n";

    const ALTERNATIVE_EML: &[u8] = b"From: ada@example.com\r\n\
To: grace@example.com\r\n\
Subject: rich hello\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
plain variant\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>rich variant</p>\r\n\
--b1--\r\n";

    fn entry_for(path: &std::path::Path, token: &str) -> MessageEntry {
        MessageEntry::new(
            MessageToken::new(token).unwrap(),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            0,
        )
        .with_path(path)
    }

    fn fetch_sync(bytes: &[u8], name: &str) -> FullMessage {
        let path = std::env::temp_dir().join(format!("cmv_loader_{name}.eml"));
        std::fs::write(&path, bytes).unwrap();

        let (tx, rx) = mpsc::channel();
        let loader = EmlLoader::new(move |fin| {
            let _ = tx.send(fin);
        });
        let _handle = loader.fetch(&entry_for(&path, name), LoadTicket::allocate());
        let finished = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("load should complete");

        let _ = std::fs::remove_file(&path);
        finished.result.expect("load should succeed")
    }

    #[test]
    fn plain_message_has_no_rich_body_and_no_secondary_tab() {
        let msg = fetch_sync(PLAIN_EML, "plain");
        assert_eq!(msg.subject, "plain hello");
        assert!(!msg.has_rich_body());
        assert!(!msg.has_distinct_plain_part());
        assert_eq!(msg.from[0].address, "ada@example.com");
        assert_eq!(msg.from[0].name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn alternative_message_keeps_rich_primary_and_distinct_plain() {
        let msg = fetch_sync(ALTERNATIVE_EML, "alt");
        assert!(msg.has_rich_body());
        assert!(msg.has_distinct_plain_part());
        assert!(msg.html_body.as_deref().unwrap().contains("rich variant"));
        assert!(msg.text_body.as_deref().unwrap().contains("plain variant"));
    }

    #[test]
    fn missing_backing_file_reports_no_backing_file() {
        let (tx, rx) = mpsc::channel();
        let loader = EmlLoader::new(move |fin| {
            let _ = tx.send(fin);
        });
        let entry = MessageEntry::new(
            MessageToken::new("orphan").unwrap(),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            0,
        );

        let _handle = loader.fetch(&entry, LoadTicket::allocate());
        let finished = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert!(matches!(
            finished.result,
            Err(LoadError::NoBackingFile { .. })
        ));
    }

    #[test]
    fn unreadable_path_reports_io_error() {
        let path = std::env::temp_dir().join("cmv_loader_definitely_missing.eml");
        let _ = std::fs::remove_file(&path);
        let (tx, rx) = mpsc::channel();
        let loader = EmlLoader::new(move |fin| {
            let _ = tx.send(fin);
        });

        let _handle = loader.fetch(&entry_for(&path, "missing"), LoadTicket::allocate());
        let finished = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert!(matches!(finished.result, Err(LoadError::Io { .. })));
    }
}
