//! Structured reporting of what each poll cycle did.
//!
//! Components emit [`Event`] values through an injected [`Reporter`] rather
//! than formatting log lines themselves. [`TracingReporter`] turns events into
//! `tracing` records; [`MemoryReporter`] keeps them for inspection.

use crate::file_router::ClassificationOutcome;
use std::sync::Mutex;

/// Something worth reporting from a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The tracked subdirectory set changed.
    DirectoriesReconciled {
        added: Vec<String>,
        removed: Vec<String>,
    },
    /// A newly seen subdirectory was scanned.
    DirectoryChecked {
        dir: String,
        handled: usize,
        outcome: ClassificationOutcome,
    },
    /// A subdirectory could not be listed.
    DirectoryFailed { dir: String, error: String },
    /// A file could not be moved to the target directory.
    MoveFailed {
        dir: String,
        file: String,
        error: String,
    },
    /// A dispatched handler reported failure.
    HandlerFailed {
        dir: String,
        file: String,
        pattern: String,
        error: String,
    },
    /// The daily purge ran.
    PurgeCompleted {
        cutoff_day: Option<u32>,
        purged: usize,
        failed: usize,
    },
    /// A target-directory file could not be deleted.
    PurgeFailed { file: String, error: String },
    /// The poll loop is stopping because of an unrecoverable error.
    CycleFailed { error: String },
}

/// Receives events from the routing components.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &Event);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &Event) {}
}

/// Emits events as `tracing` records.
///
/// Directory summaries go out at `info`, with the per-category file lists at
/// `debug`; failures go out at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &Event) {
        match event {
            Event::DirectoriesReconciled { added, removed } => {
                tracing::debug!(?added, ?removed, "Source directories changed");
            }
            Event::DirectoryChecked {
                dir,
                handled,
                outcome,
            } => {
                tracing::info!(dir = %dir, handled, "Folder \"{}\" checked, {} files handled", dir, handled);
                for (category, files) in outcome.categories() {
                    if !files.is_empty() {
                        tracing::debug!(dir = %dir, category, ?files, "Handled files");
                    }
                }
                if !outcome.failed().is_empty() {
                    tracing::debug!(dir = %dir, failed = ?outcome.failed(), "Files left in place after errors");
                }
            }
            Event::DirectoryFailed { dir, error } => {
                tracing::error!(dir = %dir, error = %error, "Failed to check folder");
            }
            Event::MoveFailed { dir, file, error } => {
                tracing::error!(dir = %dir, file = %file, error = %error, "Failed to move file");
            }
            Event::HandlerFailed {
                dir,
                file,
                pattern,
                error,
            } => {
                tracing::error!(dir = %dir, file = %file, pattern = %pattern, error = %error, "Handler failed");
            }
            Event::PurgeCompleted {
                cutoff_day,
                purged,
                failed,
            } => {
                tracing::info!(?cutoff_day, purged, failed, "Purged {} files", purged);
            }
            Event::PurgeFailed { file, error } => {
                tracing::error!(file = %file, error = %error, "Failed to purge file");
            }
            Event::CycleFailed { error } => {
                tracing::error!(error = %error, "Poll loop stopped");
            }
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<Event>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events seen so far.
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
