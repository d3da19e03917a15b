//! The controller event loop: the UI-affine queue.
//!
//! One thread drains a single channel of [`ControllerEvent`]s and is the
//! only context that mutates shared state (the live list and the active
//! load session). Repository watchers and content-loader threads never
//! touch that state directly; they re-marshal their results onto the
//! channel as events.
//!
//! User actions from a window layer arrive on the same channel as
//! [`Command`] values, which keeps ordering between repository events,
//! load completions, and user input well defined.

use crate::loader::{ContentLoader, LoadFinished, LoadTicket};
use crate::model::{MessageToken, RepoError};
use crate::notifications::{Notification, NotificationSink};
use crate::render::ArtifactStore;
use crate::repo::{RepoEvent, Repository};
use crate::state::{
    DeletionGuard, DisplayState, ExportAdapter, ExportRequest, LiveList, SelectionChange,
    SelectionLoadCoordinator,
};
use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info};

/// User action forwarded from the window layer.
#[derive(Debug, Clone)]
pub enum Command {
    /// Select the entry with the given token, or clear the selection.
    Select(Option<MessageToken>),
    /// Delete the current selection.
    DeleteSelected,
    /// Pointer pressed over the list.
    PointerDown {
        /// Pointer x coordinate.
        x: f64,
        /// Pointer y coordinate.
        y: f64,
        /// Display row under the pointer, if any.
        row: Option<usize>,
        /// Whether the press landed on a scroll control.
        over_scroll_control: bool,
    },
    /// Pointer moved.
    PointerMove {
        /// Pointer x coordinate.
        x: f64,
        /// Pointer y coordinate.
        y: f64,
    },
    /// Pointer released.
    PointerUp,
    /// Stop the event loop.
    Shutdown,
}

/// One event on the controller queue.
#[derive(Debug)]
pub enum ControllerEvent {
    /// Repository-originated change, delivered from its watcher thread.
    Repo(RepoEvent),
    /// Content-load completion, delivered from a loader thread.
    LoadFinished(LoadFinished),
    /// User action.
    Command(Command),
}

/// The viewer controller. Owns all shared mutable state.
pub struct Controller<R, L, S> {
    repo: R,
    loader: L,
    artifacts: ArtifactStore,
    sink: S,
    list: Mutex<LiveList>,
    coordinator: SelectionLoadCoordinator,
    guard: DeletionGuard,
    export: ExportAdapter,
    /// Tickets of pending notification fetches, routed before the
    /// coordinator ever sees them.
    notify_pending: HashMap<LoadTicket, MessageToken>,
    pending_exports: Vec<ExportRequest>,
}

impl<R, L, S> Controller<R, L, S>
where
    R: Repository,
    L: ContentLoader,
    S: NotificationSink,
{
    /// Create a controller and populate the list from the repository.
    ///
    /// The initial reset selects the newest entry, which immediately starts
    /// its content load.
    pub fn new(repo: R, loader: L, artifacts: ArtifactStore, sink: S) -> Result<Self, RepoError> {
        let mut controller = Self {
            repo,
            loader,
            artifacts,
            sink,
            list: Mutex::new(LiveList::new()),
            coordinator: SelectionLoadCoordinator::new(),
            guard: DeletionGuard::new(),
            export: ExportAdapter::new(),
            notify_pending: HashMap::new(),
            pending_exports: Vec::new(),
        };
        let entries = controller.repo.load_all()?;
        info!(count = entries.len(), "initial repository scan");
        let change = controller.lock_list(|list| list.reset(entries));
        if matches!(change, SelectionChange::Changed) {
            controller.sync_selection();
        }
        Ok(controller)
    }

    /// Drain events until `Shutdown` or channel disconnect.
    pub fn run(&mut self, events: Receiver<ControllerEvent>) {
        while let Ok(event) = events.recv() {
            if !self.handle_event(event) {
                break;
            }
        }
        debug!("controller loop stopped");
    }

    /// Handle one event. Returns `false` when the loop should stop.
    pub fn handle_event(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::Repo(RepoEvent::NewMessage(entry)) => {
                let token = entry.token().clone();
                let change = self.lock_list(|list| list.insert(entry.clone()));
                debug_assert!(matches!(change, SelectionChange::Unchanged));
                // Fetch content off-selection so the arrival notification
                // can carry sender and subject once it resolves.
                let ticket = LoadTicket::allocate();
                self.notify_pending.insert(ticket, token);
                let _handle = self.loader.fetch(&entry, ticket);
            }
            ControllerEvent::Repo(RepoEvent::RefreshNeeded) => self.refresh(),
            ControllerEvent::LoadFinished(finished) => self.route_load(finished),
            ControllerEvent::Command(command) => return self.handle_command(command),
        }
        true
    }

    /// Current display state for the content pane.
    pub fn display(&self) -> &DisplayState {
        self.coordinator.display()
    }

    /// Whether delete/forward are currently enabled.
    pub fn destructive_enabled(&self) -> bool {
        self.coordinator.destructive_enabled()
    }

    /// Inspect the live list.
    pub fn with_list<T>(&self, f: impl FnOnce(&LiveList) -> T) -> T {
        f(&self.list.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Take the export operations initiated since the last call.
    pub fn drain_exports(&mut self) -> Vec<ExportRequest> {
        std::mem::take(&mut self.pending_exports)
    }

    fn lock_list<T>(&self, f: impl FnOnce(&mut LiveList) -> T) -> T {
        f(&mut self.list.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Select(token) => {
                let change = self.lock_list(|list| match &token {
                    Some(token) => list.select_token(token),
                    None => list.select_index(None),
                });
                if matches!(change, SelectionChange::Changed) {
                    self.sync_selection();
                }
            }
            Command::DeleteSelected => self.delete_selected(),
            Command::PointerDown {
                x,
                y,
                row,
                over_scroll_control,
            } => self.export.pointer_down(x, y, row, over_scroll_control),
            Command::PointerMove { x, y } => {
                let list = &self.list;
                let request = self.export.pointer_move(x, y, |row| {
                    list.lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get(row)
                        .cloned()
                });
                if let Some(request) = request {
                    info!(token = %request.token, path = ?request.path, "export initiated");
                    self.pending_exports.push(request);
                }
            }
            Command::PointerUp => self.export.pointer_up(),
            Command::Shutdown => return false,
        }
        true
    }

    fn delete_selected(&mut self) {
        if matches!(self.coordinator.display(), DisplayState::Loading { .. }) {
            debug!("delete ignored while content load is pending");
            return;
        }
        match self.guard.delete_selected(&self.list, &self.repo) {
            Ok(report) => {
                if matches!(report.selection, SelectionChange::Changed) {
                    self.sync_selection();
                }
            }
            Err(error) => {
                // Contained: the list stays usable; a refresh reconciles.
                error!(%error, "delete failed");
                self.refresh();
            }
        }
    }

    fn refresh(&mut self) {
        match self.repo.load_all() {
            Ok(entries) => {
                let change = self.lock_list(|list| list.reset(entries));
                if matches!(change, SelectionChange::Changed) {
                    self.sync_selection();
                }
            }
            Err(error) => error!(%error, "repository rescan failed"),
        }
    }

    /// Point the coordinator at the list's current effective selection.
    fn sync_selection(&mut self) {
        let entry = self.lock_list(|list| list.selected_entry().cloned());
        self.coordinator.select(entry.as_ref(), &self.loader);
    }

    fn route_load(&mut self, finished: LoadFinished) {
        if let Some(token) = self.notify_pending.remove(&finished.ticket) {
            match finished.result {
                Ok(message) => self.sink.notify(&Notification::for_message(&message)),
                Err(error) => debug!(%token, %error, "notification fetch failed, skipping"),
            }
            return;
        }
        match finished.result {
            Ok(message) => {
                self.coordinator
                    .on_delivered(finished.ticket, message, &self.artifacts);
            }
            Err(error) => self.coordinator.on_failed(finished.ticket, &error),
        }
    }
}
