use crate::coordinator::{ModelCoordinator, RebuildOutcome};
use crate::error::Result;
use log::{debug, info, warn};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct WatcherConfig {
    /// Window for coalescing a burst of filesystem events into one
    /// rebuild.
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(750),
        }
    }
}

enum Message {
    Fs(notify::Result<Event>),
    Stop,
}

/// Watches the project tree and rebuilds the model when a document
/// that contributes to the current hierarchy changes.
///
/// Events are debounced and filtered: only `.json` files that are the
/// configured root or one of the currently included documents trigger
/// a rebuild. Dropping the watcher stops the background thread.
pub struct ChangeWatcher {
    // Held to keep the OS watch registration alive.
    _watcher: RecommendedWatcher,
    sender: mpsc::Sender<Message>,
    thread: Option<JoinHandle<()>>,
}

impl ChangeWatcher {
    pub fn spawn(
        coordinator: Arc<ModelCoordinator>,
        watch_root: &Path,
        config: WatcherConfig,
    ) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let event_sender = sender.clone();
        let mut watcher = notify::recommended_watcher(move |event| {
            let _ = event_sender.send(Message::Fs(event));
        })?;
        watcher.watch(watch_root, RecursiveMode::Recursive)?;
        info!("Watching {} for document changes", watch_root.display());

        let thread = thread::spawn(move || run_loop(coordinator, receiver, config.debounce));
        Ok(Self {
            _watcher: watcher,
            sender,
            thread: Some(thread),
        })
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Stop);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_loop(coordinator: Arc<ModelCoordinator>, receiver: mpsc::Receiver<Message>, debounce: Duration) {
    while let Ok(message) = receiver.recv() {
        let mut changed = Vec::new();
        match message {
            Message::Stop => return,
            Message::Fs(Err(err)) => {
                warn!("File watcher error: {err}");
                continue;
            }
            Message::Fs(Ok(event)) => changed.extend(event.paths),
        }

        // Coalesce the rest of the burst before deciding.
        loop {
            match receiver.recv_timeout(debounce) {
                Ok(Message::Fs(Ok(event))) => changed.extend(event.paths),
                Ok(Message::Fs(Err(err))) => warn!("File watcher error: {err}"),
                Ok(Message::Stop) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        let interesting = coordinator.interesting_paths();
        if !changed.iter().any(|path| is_relevant(&interesting, path)) {
            debug!("Ignoring {} unrelated change(s)", changed.len());
            continue;
        }

        match coordinator.rebuild() {
            Ok(RebuildOutcome::Built { snapshot, .. }) => {
                info!("Rebuilt hierarchy: {} concepts", snapshot.concepts.len());
            }
            Ok(RebuildOutcome::NoRoot) => debug!("Change seen but no root configured"),
            Err(err) => warn!("Rebuild failed, previous snapshot retained: {err}"),
        }
    }
}

/// A change matters when it is a `.json` document (case-insensitive)
/// whose path is the root or one of the included documents.
fn is_relevant(interesting: &HashSet<String>, path: &Path) -> bool {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return false;
    }
    if interesting.contains(&path.to_string_lossy().into_owned()) {
        return true;
    }
    // Editors often replace files, changing inode identity; fall back
    // to the canonicalized spelling.
    std::fs::canonicalize(path)
        .map(|canonical| interesting.contains(&canonical.to_string_lossy().into_owned()))
        .unwrap_or(false)
}
