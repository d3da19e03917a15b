//! Controller state machines (pure where possible).
//!
//! The live list and the selection/load coordinator are the only shared
//! mutable state in the core; both are owned by the controller thread.
//! All types here are testable without any I/O collaborators beyond the
//! traits they accept.

pub mod coordinator;
pub mod deletion;
pub mod export;
pub mod live_list;

// Re-export for convenience
pub use coordinator::{DisplayState, RenderedBody, RenderedMessage, SelectionLoadCoordinator};
pub use deletion::{DeleteReport, DeletionGuard};
pub use export::{ExportAdapter, ExportRequest, DRAG_THRESHOLD};
pub use live_list::{LiveList, SelectionChange};
