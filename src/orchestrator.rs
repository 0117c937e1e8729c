//! The polling loop tying directory tracking, routing, and purging together.
//!
//! One cycle:
//! 1. list the source directory and reconcile it against the tracked set
//! 2. route the files of every newly seen subdirectory
//! 3. run the daily purge if it is due
//!
//! Between cycles the loop sleeps for the configured delay. Shutdown is only
//! observed during that sleep, so a cycle that has started always finishes.

use crate::clock::Clock;
use crate::collaborators::Collaborators;
use crate::config::ValidatedConfig;
use crate::file_router::{ClassificationOutcome, FileRouter, RouteError};
use crate::fs_ops;
use crate::purge::{PurgeManager, PurgeSummary};
use crate::report::{Event, Reporter};
use crate::tracker::DirectoryTracker;
use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failures that stop the poll loop.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The source directory itself could not be listed.
    #[error("Source directory unavailable: {0}")]
    SourceUnavailable(#[source] RouteError),
    /// The target directory could not be listed for purging.
    #[error("Target directory unavailable: {0}")]
    TargetUnavailable(#[source] RouteError),
}

/// Where the loop is between and during cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Scanning,
}

/// What one poll cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Subdirectories seen for the first time this cycle.
    pub added: Vec<String>,
    /// Subdirectories that disappeared since the last cycle.
    pub removed: BTreeSet<String>,
    /// Scan results for each added subdirectory that could be listed.
    pub scanned: Vec<(String, ClassificationOutcome)>,
    /// Added subdirectories that could not be listed. They are untracked
    /// again and retried on the next cycle.
    pub failed: Vec<String>,
    /// Set when the purge ran this cycle.
    pub purge: Option<PurgeSummary>,
}

impl CycleSummary {
    /// Files moved or dispatched across all scanned subdirectories.
    pub fn handled_count(&self) -> usize {
        self.scanned
            .iter()
            .map(|(_, outcome)| outcome.handled_count())
            .sum()
    }
}

/// Runs poll cycles against a validated configuration.
///
/// # Examples
///
/// ```no_run
/// use dirsweep::collaborators::Collaborators;
/// use dirsweep::config::Config;
/// use dirsweep::orchestrator::Orchestrator;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::load(None)?.validate()?;
///     let mut orchestrator = Orchestrator::new(&config, Collaborators::default());
///
///     // Run until Ctrl+C
///     orchestrator
///         .run(async {
///             let _ = tokio::signal::ctrl_c().await;
///         })
///         .await?;
///     Ok(())
/// }
/// ```
pub struct Orchestrator {
    source_dir: PathBuf,
    excluded_dirs: BTreeSet<String>,
    poll_delay: Duration,
    tracker: DirectoryTracker,
    router: FileRouter,
    purge: PurgeManager,
    state: OrchestratorState,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("source_dir", &self.source_dir)
            .field("poll_delay", &self.poll_delay)
            .field("state", &self.state)
            .field("tracker", &self.tracker)
            .field("router", &self.router)
            .field("purge", &self.purge)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(config: &ValidatedConfig, collaborators: Collaborators) -> Self {
        Self {
            source_dir: config.source_dir().to_path_buf(),
            excluded_dirs: config.excluded_dirs().clone(),
            poll_delay: config.poll_delay(),
            tracker: DirectoryTracker::new(),
            router: FileRouter::new(config, &collaborators),
            purge: PurgeManager::new(config, &collaborators),
            state: OrchestratorState::Idle,
            clock: collaborators.clock,
            reporter: collaborators.reporter,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn tracker(&self) -> &DirectoryTracker {
        &self.tracker
    }

    /// Runs one complete cycle.
    ///
    /// Per-directory and per-file failures are reported and do not fail the
    /// cycle.
    ///
    /// # Errors
    ///
    /// Fails if the source or target directory itself cannot be listed.
    pub fn run_cycle(&mut self) -> Result<CycleSummary, OrchestratorError> {
        self.state = OrchestratorState::Scanning;
        let result = self.scan_and_purge();
        self.state = OrchestratorState::Idle;
        result
    }

    fn scan_and_purge(&mut self) -> Result<CycleSummary, OrchestratorError> {
        let current = fs_ops::list_subdirectories(&self.source_dir, &self.excluded_dirs)
            .map_err(|e| {
                OrchestratorError::SourceUnavailable(RouteError::ListFailed {
                    path: self.source_dir.clone(),
                    source: e,
                })
            })?;

        let reconciliation = self.tracker.reconcile(current);
        if !reconciliation.is_empty() {
            self.reporter.report(&Event::DirectoriesReconciled {
                added: reconciliation.added.clone(),
                removed: reconciliation.removed.iter().cloned().collect(),
            });
        }

        let mut summary = CycleSummary {
            added: reconciliation.added,
            removed: reconciliation.removed,
            ..CycleSummary::default()
        };

        for dir in &summary.added {
            match self.router.process_directory(dir) {
                Ok(outcome) => {
                    self.reporter.report(&Event::DirectoryChecked {
                        dir: dir.clone(),
                        handled: outcome.handled_count(),
                        outcome: outcome.clone(),
                    });
                    summary.scanned.push((dir.clone(), outcome));
                }
                Err(e) => {
                    // Not scanned, so it is new again next cycle.
                    self.tracker.forget(dir);
                    self.reporter.report(&Event::DirectoryFailed {
                        dir: dir.clone(),
                        error: e.to_string(),
                    });
                    summary.failed.push(dir.clone());
                }
            }
        }

        summary.purge = self
            .purge
            .purge_if_due(self.clock.now())
            .map_err(OrchestratorError::TargetUnavailable)?;

        Ok(summary)
    }

    /// Runs cycles until `shutdown` completes.
    ///
    /// `shutdown` is polled only while sleeping between cycles. A loop-level
    /// failure is reported and returned, ending the loop.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), OrchestratorError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            source = %self.source_dir.display(),
            delay = ?self.poll_delay,
            "Start main loop"
        );

        loop {
            if let Err(e) = self.run_cycle() {
                self.reporter.report(&Event::CycleFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
            tracing::debug!(tracked = self.tracker.len(), "Cycle complete");

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, stopping");
                    break;
                }
                _ = tokio::time::sleep(self.poll_delay) => {}
            }
        }

        Ok(())
    }
}
