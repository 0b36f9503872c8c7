//! File watching for automatic refreshes.
//!
//! Uses `notify-debouncer-full` to watch the documents and templates
//! directories for changes.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{
    Config as NotifyConfig, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher,
};
use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer, new_debouncer_opt,
};

use super::paths::MARKDOWN_EXTENSION;
use crate::config::WatchConfig;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}

// =============================================================================
// Watch events
// =============================================================================

/// A change that requires the library to be refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// A markdown document was created, modified or deleted.
    Document { path: PathBuf, deleted: bool },
    /// A template fragment changed.
    Template { path: PathBuf },
}

/// Events sent from the file watcher.
#[derive(Debug)]
pub enum WatchEvent {
    /// Files changed, refresh needed.
    FilesChanged(Vec<ChangeKind>),
    /// Watcher error occurred.
    Error(String),
}

// =============================================================================
// Path classification
// =============================================================================

/// Directories to watch for changes.
#[derive(Debug, Clone)]
pub struct WatchPaths {
    /// Markdown sources.
    pub documents_dir: PathBuf,
    /// Template fragments.
    pub templates_dir: PathBuf,
}

impl WatchPaths {
    /// Canonicalize both directories so they match the paths notify reports.
    pub fn canonical(documents_dir: &Path, templates_dir: &Path) -> Self {
        let canonical = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
        Self {
            documents_dir: canonical(documents_dir),
            templates_dir: canonical(templates_dir),
        }
    }

    /// Classify a changed path into a ChangeKind.
    pub fn classify(&self, path: &Path, deleted: bool) -> Option<ChangeKind> {
        // Editors drop swap and backup files next to the real ones
        let hidden_editor_file = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .is_some_and(|n| n.ends_with('~') || n.ends_with(".swp"));
        if hidden_editor_file {
            return None;
        }

        // Templates first: the templates directory may live inside the
        // documents directory
        if path.starts_with(&self.templates_dir) {
            return Some(ChangeKind::Template {
                path: path.to_path_buf(),
            });
        }

        if path.starts_with(&self.documents_dir)
            && path.extension().is_some_and(|e| e == MARKDOWN_EXTENSION)
        {
            return Some(ChangeKind::Document {
                path: path.to_path_buf(),
                deleted,
            });
        }

        None
    }
}

// =============================================================================
// File watcher
// =============================================================================

/// A file watcher that can use either native or polling backend.
pub enum FileWatcher {
    /// Native file system watcher (recommended for local development).
    Native {
        _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
    /// Polling-based watcher (for network filesystems, Docker, etc.).
    Polling {
        _debouncer: Debouncer<PollWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
}

impl FileWatcher {
    /// Create a new file watcher.
    pub fn new(config: &WatchConfig, paths: WatchPaths) -> Result<Self, WatchError> {
        let debounce_timeout = Duration::from_millis(config.debounce_ms);

        let (tx, rx) = mpsc::channel();

        let classifier = paths.clone();
        let callback = move |result: DebounceEventResult| match result {
            Ok(events) => {
                let changes: Vec<ChangeKind> = events
                    .iter()
                    .filter(|event| is_relevant_event(&event.kind))
                    .filter_map(|event| {
                        let deleted = matches!(event.kind, EventKind::Remove(_));
                        event
                            .paths
                            .first()
                            .and_then(|p| classifier.classify(p, deleted))
                    })
                    .collect();

                if !changes.is_empty() {
                    let _ = tx.send(WatchEvent::FilesChanged(changes));
                }
            }
            Err(errors) => {
                for e in errors {
                    let _ = tx.send(WatchEvent::Error(e.to_string()));
                }
            }
        };

        if config.poll {
            let poll_interval = Duration::from_millis(config.poll_interval_ms);
            let notify_config = NotifyConfig::default().with_poll_interval(poll_interval);

            let mut debouncer = new_debouncer_opt::<_, PollWatcher, RecommendedCache>(
                debounce_timeout,
                None,
                callback,
                RecommendedCache::default(),
                notify_config,
            )
            .map_err(WatchError::Notify)?;

            add_watch_paths_to_debouncer(&mut debouncer, &paths)?;

            Ok(FileWatcher::Polling {
                _debouncer: debouncer,
                rx,
            })
        } else {
            let mut debouncer =
                new_debouncer(debounce_timeout, None, callback).map_err(WatchError::Notify)?;

            add_watch_paths_to_debouncer(&mut debouncer, &paths)?;

            Ok(FileWatcher::Native {
                _debouncer: debouncer,
                rx,
            })
        }
    }

    /// Receive the next watch event (blocking).
    pub fn recv(&self) -> Option<WatchEvent> {
        match self {
            FileWatcher::Native { rx, .. } => rx.recv().ok(),
            FileWatcher::Polling { rx, .. } => rx.recv().ok(),
        }
    }
}

fn add_watch_paths_to_debouncer<W: Watcher, C: notify_debouncer_full::FileIdCache>(
    debouncer: &mut Debouncer<W, C>,
    paths: &WatchPaths,
) -> Result<(), WatchError> {
    for dir in [&paths.documents_dir, &paths.templates_dir] {
        if dir.exists() {
            debouncer.watch(dir, RecursiveMode::Recursive)?;
        } else {
            tracing::warn!(dir = %dir.display(), "not watching missing directory");
        }
    }
    Ok(())
}

/// Check if an event kind is relevant for refreshes.
fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
    )
}
