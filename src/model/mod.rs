//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors where
//! validation is required. Nothing here performs I/O.

pub mod entry;
pub mod error;
pub mod full_message;

// Re-export for convenience
pub use entry::{InvalidToken, MessageEntry, MessageToken};
pub use error::{AppError, LoadError, RepoError};
pub use full_message::{FullMessage, InlineResource, Mailbox};
