//! Drag-to-export gesture tracking.
//!
//! A pointer press over the list arms a drag origin; once movement exceeds
//! the distance threshold the entry under the origin is resolved and, if it
//! has a backing file, a single file export is initiated. Gestures that
//! start over a scroll control, stay under the threshold, or land on an
//! entry without a backing path export nothing.

use crate::model::{MessageEntry, MessageToken};
use std::path::PathBuf;

/// Minimum pointer travel (in display units) before a drag becomes an
/// export.
pub const DRAG_THRESHOLD: f64 = 10.0;

/// A file export carrying exactly one backing path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Token of the exported entry.
    pub token: MessageToken,
    /// The single file path the drop operation carries.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy)]
struct DragOrigin {
    x: f64,
    y: f64,
    /// Display row under the press, resolved by the caller's hit test.
    row: Option<usize>,
}

/// Tracks one in-progress drag gesture.
#[derive(Debug, Default)]
pub struct ExportAdapter {
    origin: Option<DragOrigin>,
}

impl ExportAdapter {
    /// Fresh adapter with no armed gesture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer pressed at `(x, y)` over display row `row`.
    ///
    /// Presses over a scroll control never arm a gesture.
    pub fn pointer_down(&mut self, x: f64, y: f64, row: Option<usize>, over_scroll_control: bool) {
        self.origin = if over_scroll_control {
            None
        } else {
            Some(DragOrigin { x, y, row })
        };
    }

    /// Pointer moved to `(x, y)`.
    ///
    /// Once the travel from the origin reaches [`DRAG_THRESHOLD`], the
    /// origin row is resolved through `resolve` and the gesture is consumed
    /// (origin reset) whether or not an export results. Returns the export
    /// to initiate, if any.
    pub fn pointer_move(
        &mut self,
        x: f64,
        y: f64,
        resolve: impl FnOnce(usize) -> Option<MessageEntry>,
    ) -> Option<ExportRequest> {
        let origin = self.origin?;
        let distance = (x - origin.x).hypot(y - origin.y);
        if distance < DRAG_THRESHOLD {
            return None;
        }
        // Threshold crossed: the gesture is consumed either way.
        self.origin = None;

        let entry = resolve(origin.row?)?;
        let path = entry.path()?.to_path_buf();
        Some(ExportRequest {
            token: entry.token().clone(),
            path,
        })
    }

    /// Pointer released: disarm any pending gesture.
    pub fn pointer_up(&mut self) {
        self.origin = None;
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
