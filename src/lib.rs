//! Captured Mail Viewer (cmv)
//!
//! Controller core for a desktop viewer of locally captured email. A capture
//! service drops `.eml` files into a spool directory; cmv keeps a live,
//! timestamp-ordered list of message entries synchronized with that spool,
//! loads the content of exactly one selected entry at a time (cancelling any
//! in-flight load when the selection changes), serializes deletions, and
//! turns drag gestures into file exports.
//!
//! The crate is headless: it exposes a [`state::DisplayState`] that a window
//! layer would render, and consumes user actions as [`controller::Command`]
//! values sent into the single controller event loop.

pub mod config;
pub mod controller;
pub mod loader;
pub mod logging;
pub mod model;
pub mod notifications;
pub mod render;
pub mod repo;
pub mod state;
