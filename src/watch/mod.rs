//! Filesystem watching for `watch` mode.
//!
//! notify delivers events on its own thread; they are forwarded over a tokio
//! channel so the watch loop can `select!` on changes, the debounce deadline
//! and Ctrl+C from one task.

mod debounce;

pub use debounce::{Debouncer, WATCH_DEBOUNCE};

use crate::discovery::SKIP_DIRS;
use crate::error::WatchError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};


pub struct ChangeWatcher {
    /// Dropping the watcher stops the notify thread
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<PathBuf>,
}

impl ChangeWatcher {
    /// Watch `root` recursively. Paths under any of `ignored` (besides the
    /// built-in tool directories) are dropped before they reach the loop.
    pub fn start(root: &Path, ignored: Vec<PathBuf>) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if !is_relevant(&event.kind) {
                        return;
                    }
                    for path in event.paths {
                        if is_ignored(&path, &ignored) {
                            continue;
                        }
                        let _ = tx.send(path);
                    }
                }
                Err(e) => warn!("File watcher error: {}", e),
            })?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        info!("Watching {:?} for changes", root);

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Next changed path; `None` once the watcher is gone
    pub async fn next(&mut self) -> Option<PathBuf> {
        self.rx.recv().await
    }

    /// Discard queued events, returning how many there were
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(path) = self.rx.try_recv() {
            debug!("Changed during run: {:?}", path);
            count += 1;
        }
        count
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

pub fn is_ignored(path: &Path, ignored: &[PathBuf]) -> bool {
    if ignored.iter().any(|dir| path.starts_with(dir)) {
        return true;
    }
    path.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .map(|name| SKIP_DIRS.contains(&name))
            .unwrap_or(false),
        _ => false,
    })
}
