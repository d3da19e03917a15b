//! Spool-directory repository with live watching.
//!
//! The capture service drops one `.eml` file per message into a spool
//! directory. The file stem is the identity token; the file's modification
//! time and size become the entry metadata. A debounced filesystem watcher
//! raises [`RepoEvent`]s from a background thread.

use crate::model::{MessageEntry, MessageToken, RepoError};
use crate::repo::{RepoEvent, Repository};
use chrono::{DateTime, Utc};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const EML_EXTENSION: &str = "eml";

/// Repository backed by a directory of `.eml` files.
#[derive(Debug, Clone)]
pub struct SpoolRepository {
    root: PathBuf,
}

impl SpoolRepository {
    /// Open (creating if needed) the spool directory at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The spool directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build an entry from a spool file path. Returns `None` for paths that
    /// are not `.eml` files or that vanished between event and stat.
    fn entry_for_path(path: &Path) -> Option<MessageEntry> {
        if path.extension().and_then(|e| e.to_str()) != Some(EML_EXTENSION) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let token = MessageToken::new(stem).ok()?;
        let meta = fs::metadata(path).ok()?;
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Some(MessageEntry::new(token, modified, meta.len()).with_path(path))
    }

    /// Start watching the spool directory in a background thread.
    ///
    /// Each debounced filesystem event becomes either `NewMessage` (the path
    /// still exists) or `RefreshNeeded` (it does not, so something was
    /// removed). The watcher stops when the returned [`SpoolWatcher`] is
    /// dropped.
    pub fn watch(
        &self,
        debounce: Duration,
        on_event: impl Fn(RepoEvent) + Send + 'static,
    ) -> Result<SpoolWatcher, RepoError> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(debounce, tx).map_err(std::io::Error::other)?;
        debouncer
            .watcher()
            .watch(&self.root, notify::RecursiveMode::NonRecursive)
            .map_err(std::io::Error::other)?;

        let root = self.root.clone();
        let handle = std::thread::spawn(move || {
            // Ends when the debouncer (sender side) is dropped.
            while let Ok(result) = rx.recv() {
                match result {
                    Ok(events) => {
                        for event in events {
                            if !matches!(event.kind, DebouncedEventKind::Any) {
                                continue;
                            }
                            if event.path.exists() {
                                if let Some(entry) = Self::entry_for_path(&event.path) {
                                    debug!(token = %entry.token(), "spool ingest");
                                    on_event(RepoEvent::NewMessage(entry));
                                }
                            } else {
                                debug!(path = ?event.path, "spool path gone, refresh");
                                on_event(RepoEvent::RefreshNeeded);
                            }
                        }
                    }
                    Err(error) => {
                        warn!(spool = ?root, %error, "spool watch error");
                        on_event(RepoEvent::RefreshNeeded);
                    }
                }
            }
        });

        Ok(SpoolWatcher {
            _debouncer: debouncer,
            _handle: handle,
        })
    }
}

impl Repository for SpoolRepository {
    fn load_all(&self) -> Result<Vec<MessageEntry>, RepoError> {
        let mut entries = Vec::new();
        for dirent in fs::read_dir(&self.root)? {
            let dirent = dirent?;
            if let Some(entry) = Self::entry_for_path(&dirent.path()) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn delete(&self, entry: &MessageEntry) -> Result<(), RepoError> {
        let path = match entry.path() {
            Some(path) => path.to_path_buf(),
            None => self.root.join(format!("{}.{EML_EXTENSION}", entry.token())),
        };
        if !path.exists() {
            return Err(RepoError::NotFound {
                token: entry.token().clone(),
            });
        }
        fs::remove_file(&path)?;
        Ok(())
    }
}

/// Keeps the filesystem watcher and its delivery thread alive.
///
/// Dropping stops the watch; the background thread exits once the debouncer
/// channel disconnects.
#[derive(Debug)]
pub struct SpoolWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    _handle: std::thread::JoinHandle<()>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_spool(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cmv_spool_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn load_all_lists_only_eml_files() {
        let root = temp_spool("list");
        let repo = SpoolRepository::new(&root).unwrap();
        fs::write(root.join("a.eml"), b"Subject: a\r\n\r\nbody").unwrap();
        fs::write(root.join("b.eml"), b"Subject: b\r\n\r\nbody").unwrap();
        fs::write(root.join("ignore.txt"), b"nope").unwrap();

        let entries = repo.load_all().unwrap();

        let _ = fs::remove_dir_all(&root);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.path().is_some()));
    }

    #[test]
    fn tokens_are_stable_across_scans() {
        let root = temp_spool("stable");
        let repo = SpoolRepository::new(&root).unwrap();
        fs::write(root.join("m1.eml"), b"x").unwrap();

        let first = repo.load_all().unwrap();
        let second = repo.load_all().unwrap();

        let _ = fs::remove_dir_all(&root);
        assert_eq!(first[0].token(), second[0].token());
        assert_eq!(first[0].token().as_str(), "m1");
    }

    #[test]
    fn delete_removes_backing_file() {
        let root = temp_spool("delete");
        let repo = SpoolRepository::new(&root).unwrap();
        fs::write(root.join("m1.eml"), b"x").unwrap();
        let entry = repo.load_all().unwrap().remove(0);

        repo.delete(&entry).unwrap();

        let gone = !root.join("m1.eml").exists();
        let second = repo.delete(&entry);
        let _ = fs::remove_dir_all(&root);
        assert!(gone, "backing file should be removed");
        assert!(matches!(second, Err(RepoError::NotFound { .. })));
    }

    #[test]
    fn watch_reports_new_files() {
        let root = temp_spool("watch");
        let repo = SpoolRepository::new(&root).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let watcher = repo
            .watch(Duration::from_millis(50), move |ev| {
                let _ = tx.send(ev);
            })
            .unwrap();

        fs::write(root.join("fresh.eml"), b"Subject: hi\r\n\r\nbody").unwrap();

        let event = rx.recv_timeout(Duration::from_secs(5));
        drop(watcher);
        let _ = fs::remove_dir_all(&root);

        match event {
            Ok(RepoEvent::NewMessage(entry)) => assert_eq!(entry.token().as_str(), "fresh"),
            Ok(RepoEvent::RefreshNeeded) => {} // some platforms coalesce events
            Err(e) => panic!("no watch event received: {e}"),
        }
    }
}
