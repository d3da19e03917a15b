//! End-to-end controller tests over the event queue.
//!
//! A manual loader stands in for the background fetch threads so tests can
//! deliver completions in any order and verify ticket-based routing, and a
//! collecting sink records published notifications.

use chrono::{TimeZone, Utc};
use cmv::controller::{Command, Controller, ControllerEvent};
use cmv::loader::{CancelToken, ContentLoader, LoadFinished, LoadHandle, LoadTicket};
use cmv::model::{FullMessage, LoadError, Mailbox, MessageEntry, MessageToken};
use cmv::notifications::{Notification, NotificationSink};
use cmv::render::ArtifactStore;
use cmv::repo::{MemoryRepository, RepoEvent};
use cmv::state::{DisplayState, RenderedBody};
use std::sync::{Arc, Mutex};

// ===== Test Doubles =====

/// Loader that records fetches and lets the test deliver completions.
#[derive(Clone, Default)]
struct ManualLoader {
    fetches: Arc<Mutex<Vec<(MessageToken, LoadTicket, CancelToken)>>>,
}

impl ManualLoader {
    fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    fn last_fetch(&self) -> (MessageToken, LoadTicket, CancelToken) {
        self.fetches
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("a fetch was issued")
    }

    fn fetch_for(&self, token: &str) -> (MessageToken, LoadTicket, CancelToken) {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(t, _, _)| t.as_str() == token)
            .cloned()
            .unwrap_or_else(|| panic!("no fetch issued for {token}"))
    }
}

impl ContentLoader for ManualLoader {
    fn fetch(&self, entry: &MessageEntry, ticket: LoadTicket) -> LoadHandle {
        let cancel = CancelToken::new();
        self.fetches
            .lock()
            .unwrap()
            .push((entry.token().clone(), ticket, cancel.clone()));
        LoadHandle::new(cancel)
    }
}

/// Sink that collects every published notification.
#[derive(Clone, Default)]
struct CollectingSink {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl CollectingSink {
    fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, notification: &Notification) {
        self.seen.lock().unwrap().push(notification.clone());
    }
}

// ===== Helpers =====

fn entry(token: &str, secs: i64) -> MessageEntry {
    MessageEntry::new(
        MessageToken::new(token).unwrap(),
        Utc.timestamp_opt(secs, 0).unwrap(),
        64,
    )
}

fn plain_message(subject: &str) -> FullMessage {
    FullMessage {
        subject: subject.to_string(),
        from: vec![Mailbox {
            name: Some("Ada".into()),
            address: "ada@example.com".into(),
        }],
        text_body: Some("hello".into()),
        ..Default::default()
    }
}

fn artifacts() -> ArtifactStore {
    ArtifactStore::new(std::env::temp_dir().join("cmv_controller_it"))
}

type TestController = Controller<MemoryRepository, ManualLoader, CollectingSink>;

fn build(tokens: &[(&str, i64)]) -> (TestController, ManualLoader, CollectingSink) {
    let repo = MemoryRepository::new();
    for (t, secs) in tokens {
        repo.insert(entry(t, *secs));
    }
    let loader = ManualLoader::default();
    let sink = CollectingSink::default();
    let controller = Controller::new(repo, loader.clone(), artifacts(), sink.clone())
        .expect("memory repo never fails");
    (controller, loader, sink)
}

fn deliver(controller: &mut TestController, ticket: LoadTicket, token: &MessageToken, message: FullMessage) {
    controller.handle_event(ControllerEvent::LoadFinished(LoadFinished {
        ticket,
        token: token.clone(),
        result: Ok(message),
    }));
}

// ===== Startup =====

#[test]
fn startup_selects_newest_and_starts_its_load() {
    let (controller, loader, _sink) = build(&[("old", 100), ("new", 300), ("mid", 200)]);

    let selected = controller.with_list(|l| l.selected_entry().unwrap().token().clone());
    assert_eq!(selected.as_str(), "new");

    assert_eq!(loader.fetch_count(), 1);
    assert_eq!(loader.last_fetch().0.as_str(), "new");
    assert!(matches!(controller.display(), DisplayState::Loading { .. }));
    assert!(!controller.destructive_enabled());
}

#[test]
fn empty_spool_starts_idle() {
    let (controller, loader, _sink) = build(&[]);

    assert!(controller.with_list(|l| l.is_empty()));
    assert_eq!(loader.fetch_count(), 0);
    assert!(matches!(controller.display(), DisplayState::Idle));
    assert!(!controller.destructive_enabled());
}

// ===== Selection and supersede =====

#[test]
fn delivery_for_current_session_renders() {
    let (mut controller, loader, _sink) = build(&[("a", 100)]);
    let (token, ticket, _) = loader.last_fetch();

    deliver(&mut controller, ticket, &token, plain_message("greetings"));

    match controller.display() {
        DisplayState::Rendered(rendered) => {
            assert_eq!(rendered.subject, "greetings");
            assert!(matches!(&rendered.body, RenderedBody::Plain { text } if text == "hello"));
        }
        other => panic!("expected Rendered, got {other:?}"),
    }
    assert!(controller.destructive_enabled());
}

#[test]
fn reselection_supersedes_and_late_delivery_is_dropped() {
    let (mut controller, loader, _sink) = build(&[("a", 100), ("b", 200)]);

    // Startup selected "b"; switch to "a".
    controller.handle_event(ControllerEvent::Command(Command::Select(Some(
        MessageToken::new("a").unwrap(),
    ))));

    let (b_token, b_ticket, b_cancel) = loader.fetch_for("b");
    let (a_token, a_ticket, _) = loader.fetch_for("a");
    assert!(b_cancel.is_cancelled(), "superseded fetch must be cancelled");

    // The stale completion arrives anyway and must change nothing.
    deliver(&mut controller, b_ticket, &b_token, plain_message("stale"));
    assert!(
        matches!(controller.display(), DisplayState::Loading { .. }),
        "stale delivery must not render"
    );

    deliver(&mut controller, a_ticket, &a_token, plain_message("current"));
    match controller.display() {
        DisplayState::Rendered(rendered) => assert_eq!(rendered.subject, "current"),
        other => panic!("expected Rendered, got {other:?}"),
    }
}

#[test]
fn load_failure_shows_failed_state_and_keeps_destructive_enabled() {
    let (mut controller, loader, _sink) = build(&[("a", 100)]);
    let (token, ticket, _) = loader.last_fetch();

    controller.handle_event(ControllerEvent::LoadFinished(LoadFinished {
        ticket,
        token: token.clone(),
        result: Err(LoadError::Parse {
            token: token.clone(),
        }),
    }));

    assert!(matches!(controller.display(), DisplayState::Failed { .. }));
    assert!(
        controller.destructive_enabled(),
        "a failed message must still be deletable"
    );
}

#[test]
fn clearing_selection_returns_to_idle() {
    let (mut controller, loader, _sink) = build(&[("a", 100)]);
    let (_, _, cancel) = loader.last_fetch();

    controller.handle_event(ControllerEvent::Command(Command::Select(None)));

    assert!(cancel.is_cancelled());
    assert!(matches!(controller.display(), DisplayState::Idle));
}

// ===== Deletion =====

#[test]
fn delete_is_ignored_while_content_is_loading() {
    let (mut controller, _loader, _sink) = build(&[("a", 100), ("b", 200)]);
    assert!(matches!(controller.display(), DisplayState::Loading { .. }));

    controller.handle_event(ControllerEvent::Command(Command::DeleteSelected));

    assert_eq!(controller.with_list(|l| l.len()), 2, "delete must be a no-op");
}

#[test]
fn delete_selected_removes_entry_and_reselects() {
    let (mut controller, loader, _sink) = build(&[("a", 100), ("b", 200)]);
    let (token, ticket, _) = loader.last_fetch();
    deliver(&mut controller, ticket, &token, plain_message("b body"));

    controller.handle_event(ControllerEvent::Command(Command::DeleteSelected));

    assert_eq!(controller.with_list(|l| l.len()), 1);
    let selected = controller.with_list(|l| l.selected_entry().unwrap().token().clone());
    assert_eq!(selected.as_str(), "a", "selection falls back to the remaining entry");
    // Reselection starts a fresh load for the new selection.
    assert_eq!(loader.last_fetch().0.as_str(), "a");
    assert!(matches!(controller.display(), DisplayState::Loading { .. }));
}

#[test]
fn deleting_the_only_entry_disables_destructive_actions() {
    let (mut controller, loader, _sink) = build(&[("only", 100)]);
    let (token, ticket, _) = loader.last_fetch();
    deliver(&mut controller, ticket, &token, plain_message("x"));

    controller.handle_event(ControllerEvent::Command(Command::DeleteSelected));

    assert!(controller.with_list(|l| l.is_empty()));
    assert!(matches!(controller.display(), DisplayState::Idle));
    assert!(!controller.destructive_enabled());
}

// ===== Arrivals and notifications =====

#[test]
fn new_message_inserts_without_stealing_selection() {
    let (mut controller, _loader, _sink) = build(&[("a", 100)]);

    controller.handle_event(ControllerEvent::Repo(RepoEvent::NewMessage(entry(
        "b", 200,
    ))));

    assert_eq!(controller.with_list(|l| l.len()), 2);
    let selected = controller.with_list(|l| l.selected_entry().unwrap().token().clone());
    assert_eq!(selected.as_str(), "a", "arrival must not move the selection");
}

#[test]
fn notification_fires_once_after_arrival_content_resolves() {
    let (mut controller, loader, sink) = build(&[("a", 100)]);

    controller.handle_event(ControllerEvent::Repo(RepoEvent::NewMessage(entry(
        "b", 200,
    ))));
    assert_eq!(sink.count(), 0, "nothing to announce before content resolves");

    let (token, ticket, _) = loader.fetch_for("b");
    deliver(&mut controller, ticket, &token, plain_message("fresh mail"));

    assert_eq!(sink.count(), 1);
    let seen = sink.seen.lock().unwrap();
    assert_eq!(seen[0].title, "Ada <ada@example.com>");
    assert_eq!(seen[0].body, "fresh mail");
    drop(seen);

    // The notification fetch never touches the content pane.
    assert!(matches!(controller.display(), DisplayState::Loading { .. }));
}

#[test]
fn failed_notification_fetch_is_swallowed() {
    let (mut controller, loader, sink) = build(&[("a", 100)]);

    controller.handle_event(ControllerEvent::Repo(RepoEvent::NewMessage(entry(
        "b", 200,
    ))));
    let (token, ticket, _) = loader.fetch_for("b");

    controller.handle_event(ControllerEvent::LoadFinished(LoadFinished {
        ticket,
        token: token.clone(),
        result: Err(LoadError::Parse { token }),
    }));

    assert_eq!(sink.count(), 0);
    assert_eq!(controller.with_list(|l| l.len()), 2, "the entry stays listed");
}

// ===== Refresh =====

#[test]
fn refresh_reconciles_list_with_repository() {
    use cmv::repo::Repository;

    let repo = Arc::new(MemoryRepository::new());
    repo.insert(entry("a", 100));
    repo.insert(entry("b", 200));
    let loader = ManualLoader::default();
    let mut controller = Controller::new(
        Arc::clone(&repo),
        loader.clone(),
        artifacts(),
        CollectingSink::default(),
    )
    .expect("memory repo never fails");
    assert_eq!(controller.with_list(|l| l.len()), 2);

    // The repo loses "b" behind the controller's back.
    repo.delete(&entry("b", 200)).unwrap();

    controller.handle_event(ControllerEvent::Repo(RepoEvent::RefreshNeeded));

    assert_eq!(controller.with_list(|l| l.len()), 1);
    let selected = controller.with_list(|l| l.selected_entry().unwrap().token().clone());
    assert_eq!(selected.as_str(), "a");
}

// ===== Shutdown and export =====

#[test]
fn shutdown_stops_the_loop() {
    let (mut controller, _loader, _sink) = build(&[]);
    assert!(!controller.handle_event(ControllerEvent::Command(Command::Shutdown)));
}

#[test]
fn drag_past_threshold_queues_one_export() {
    let (mut controller, _loader, _sink) = build(&[]);
    controller.handle_event(ControllerEvent::Repo(RepoEvent::NewMessage(
        entry("a", 100).with_path("/spool/a.eml"),
    )));

    controller.handle_event(ControllerEvent::Command(Command::PointerDown {
        x: 0.0,
        y: 0.0,
        row: Some(0),
        over_scroll_control: false,
    }));
    controller.handle_event(ControllerEvent::Command(Command::PointerMove {
        x: 20.0,
        y: 0.0,
    }));
    controller.handle_event(ControllerEvent::Command(Command::PointerUp));

    let exports = controller.drain_exports();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].token.as_str(), "a");
    assert_eq!(exports[0].path.to_string_lossy(), "/spool/a.eml");
    assert!(controller.drain_exports().is_empty(), "drain consumes the queue");
}
