//! Content loading: trait, load tickets, and cancellation.
//!
//! Loading full message content is the only suspending operation in the
//! core. A load is identified by a [`LoadTicket`] drawn from a process-wide
//! monotonic counter; completions carry their ticket so that deliveries for
//! superseded sessions can be identified and dropped regardless of arrival
//! order. Cancellation is a shared flag: idempotent, and safe to invoke
//! after the fetch already completed.

use crate::model::{FullMessage, LoadError, MessageEntry, MessageToken};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub mod eml;

pub use eml::EmlLoader;

/// Monotonically increasing identifier for one content fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Allocate the next ticket. Process-wide monotonic, never reused.
    pub fn allocate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw counter value, for logging.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared cancellation flag for one fetch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; a no-op after completion.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Handle to an in-flight fetch, owned by the coordinator's active session.
#[derive(Debug)]
pub struct LoadHandle {
    cancel: CancelToken,
}

impl LoadHandle {
    /// Wrap a cancellation token into a handle.
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }

    /// Cancel the fetch. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether this fetch was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Completion of one fetch, delivered back to the controller channel.
#[derive(Debug)]
pub struct LoadFinished {
    /// Ticket the fetch was started with.
    pub ticket: LoadTicket,
    /// Token of the fetched entry.
    pub token: MessageToken,
    /// Parsed content, or the failure to report.
    pub result: Result<FullMessage, LoadError>,
}

/// Asynchronous fetcher of full message content.
///
/// `fetch` must not block: implementations do their work on a background
/// thread and deliver a [`LoadFinished`] through whatever channel they were
/// constructed with. A fetch whose cancel token fires before delivery may
/// skip delivery entirely; the ticket check on the receiving side makes
/// either choice safe.
pub trait ContentLoader {
    /// Start fetching content for `entry` under `ticket`.
    fn fetch(&self, entry: &MessageEntry, ticket: LoadTicket) -> LoadHandle;
}
