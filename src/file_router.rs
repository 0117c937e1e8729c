/// Routing of files found in a source subdirectory.
///
/// Every regular file directly inside the subdirectory is classified by the
/// [`PatternMatcher`]. Default matches, and secondary matches without a
/// handler, are moved into the target directory under an age-marked name.
/// Secondary matches with a handler are passed to it and left where they are.
/// Unmatched files stay put and are only recorded.
use crate::age_marker;
use crate::clock::Clock;
use crate::collaborators::Collaborators;
use crate::config::ValidatedConfig;
use crate::fs_ops::{self, Mover};
use crate::handler::{FileHandler, SourceFile};
use crate::pattern::{Classification, PatternMatcher};
use crate::report::{Event, Reporter};
use chrono::Datelike;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while routing or purging files.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A directory could not be listed.
    #[error("Failed to list {}: {source}", .path.display())]
    ListFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A file could not be moved to the target directory.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// A file could not be deleted.
    #[error("Failed to remove {}: {source}", .path.display())]
    RemoveFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// The files seen in one directory scan, grouped by the rule they matched.
///
/// Categories are fixed when the outcome is created: the default pattern, one
/// slot per secondary pattern (in configured order), and unhandled. Files keep
/// their discovery order within each category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationOutcome {
    default: Vec<String>,
    others: Vec<(String, Vec<String>)>,
    unhandled: Vec<String>,
    failed: Vec<String>,
}

impl ClassificationOutcome {
    /// Creates an empty outcome with one slot per secondary pattern.
    pub fn new<I, S>(other_patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default: Vec::new(),
            others: other_patterns
                .into_iter()
                .map(|pattern| (pattern.into(), Vec::new()))
                .collect(),
            unhandled: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn for_matcher(matcher: &PatternMatcher) -> Self {
        Self::new((0..matcher.other_count()).filter_map(|index| matcher.other_pattern(index)))
    }

    /// Records `file_name` under `category`.
    ///
    /// # Panics
    ///
    /// Panics if `category` is `Other(index)` with no slot at `index`.
    pub fn record(&mut self, category: Classification, file_name: impl Into<String>) {
        let file_name = file_name.into();
        match category {
            Classification::Default => self.default.push(file_name),
            Classification::Other(index) => self.others[index].1.push(file_name),
            Classification::Unhandled => self.unhandled.push(file_name),
        }
    }

    /// Marks a recorded file whose move or handler failed.
    pub fn record_failure(&mut self, file_name: impl Into<String>) {
        self.failed.push(file_name.into());
    }

    /// Files recorded under `category`.
    pub fn files(&self, category: Classification) -> &[String] {
        match category {
            Classification::Default => &self.default,
            Classification::Other(index) => self
                .others
                .get(index)
                .map_or(&[][..], |(_, files)| files.as_slice()),
            Classification::Unhandled => &self.unhandled,
        }
    }

    /// Every category with its label, in order: `default`, each secondary
    /// pattern's source text, then `unhandled`.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        std::iter::once(("default", self.default.as_slice()))
            .chain(
                self.others
                    .iter()
                    .map(|(pattern, files)| (pattern.as_str(), files.as_slice())),
            )
            .chain(std::iter::once(("unhandled", self.unhandled.as_slice())))
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    /// Files that matched a pattern and were moved or dispatched successfully.
    pub fn handled_count(&self) -> usize {
        let matched = self.default.len()
            + self
                .others
                .iter()
                .map(|(_, files)| files.len())
                .sum::<usize>();
        matched.saturating_sub(self.failed.len())
    }

    /// Every file seen, including unhandled ones.
    pub fn total(&self) -> usize {
        self.categories().map(|(_, files)| files.len()).sum()
    }
}

/// Classifies and routes the files of one source subdirectory at a time.
pub struct FileRouter {
    source_dir: PathBuf,
    target_dir: PathBuf,
    matcher: PatternMatcher,
    /// Handler for each secondary pattern, by pattern index.
    handlers: Vec<Option<Arc<dyn FileHandler>>>,
    mover: Arc<dyn Mover>,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for FileRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dispatching: Vec<usize> = self
            .handlers
            .iter()
            .enumerate()
            .filter_map(|(index, handler)| handler.as_ref().map(|_| index))
            .collect();
        f.debug_struct("FileRouter")
            .field("source_dir", &self.source_dir)
            .field("target_dir", &self.target_dir)
            .field("matcher", &self.matcher)
            .field("dispatching", &dispatching)
            .finish_non_exhaustive()
    }
}

impl FileRouter {
    /// Builds a router, resolving each secondary pattern's `exec` reference
    /// through the collaborators' handler registry.
    pub fn new(config: &ValidatedConfig, collaborators: &Collaborators) -> Self {
        let handlers = config
            .other_patterns()
            .iter()
            .map(|rule| {
                rule.exec()
                    .and_then(|exec| collaborators.handlers.resolve(exec))
            })
            .collect();

        Self {
            source_dir: config.source_dir().to_path_buf(),
            target_dir: config.target_dir().to_path_buf(),
            matcher: PatternMatcher::new(config),
            handlers,
            mover: Arc::clone(&collaborators.mover),
            clock: Arc::clone(&collaborators.clock),
            reporter: Arc::clone(&collaborators.reporter),
        }
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Returns true if files matching secondary pattern `index` are dispatched
    /// to a handler instead of being moved.
    pub fn dispatches(&self, index: usize) -> bool {
        self.handlers.get(index).is_some_and(Option::is_some)
    }

    /// Where a file moved on `day` ends up.
    pub fn target_path(&self, file_name: &str, day: u32) -> PathBuf {
        self.target_dir.join(age_marker::mark(day, file_name))
    }

    /// Scans `source_dir/dir_name` and routes every file in it.
    ///
    /// A file that fails to move, or whose handler fails, is reported and
    /// recorded as failed; the remaining files are still processed.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::ListFailed` if the directory cannot be listed.
    pub fn process_directory(&self, dir_name: &str) -> RouteResult<ClassificationOutcome> {
        let dir_path = self.source_dir.join(dir_name);
        let files = fs_ops::list_files(&dir_path).map_err(|e| RouteError::ListFailed {
            path: dir_path.clone(),
            source: e,
        })?;

        let mut outcome = ClassificationOutcome::for_matcher(&self.matcher);
        for file_name in files {
            self.route_file(dir_name, &dir_path, file_name, &mut outcome);
        }
        Ok(outcome)
    }

    fn route_file(
        &self,
        dir_name: &str,
        dir_path: &Path,
        file_name: String,
        outcome: &mut ClassificationOutcome,
    ) {
        let category = self.matcher.classify(&file_name);
        let handler = match category {
            Classification::Unhandled => {
                outcome.record(category, file_name);
                return;
            }
            Classification::Default => None,
            Classification::Other(index) => self.handlers.get(index).cloned().flatten(),
        };

        let source_path = dir_path.join(&file_name);
        let succeeded = match handler {
            Some(handler) => self.dispatch(dir_name, &source_path, &file_name, category, &*handler),
            None => self.move_to_target(dir_name, &source_path, &file_name),
        };

        if !succeeded {
            outcome.record_failure(file_name.clone());
        }
        outcome.record(category, file_name);
    }

    fn move_to_target(&self, dir_name: &str, source_path: &Path, file_name: &str) -> bool {
        let day = self.clock.now().day();
        let destination = self.target_path(file_name, day);

        match self.mover.move_file(source_path, &destination) {
            Ok(()) => true,
            Err(e) => {
                let error = RouteError::MoveFailed {
                    from: source_path.to_path_buf(),
                    to: destination,
                    source: e,
                };
                self.reporter.report(&Event::MoveFailed {
                    dir: dir_name.to_string(),
                    file: file_name.to_string(),
                    error: error.to_string(),
                });
                false
            }
        }
    }

    fn dispatch(
        &self,
        dir_name: &str,
        source_path: &Path,
        file_name: &str,
        category: Classification,
        handler: &dyn FileHandler,
    ) -> bool {
        let file = SourceFile {
            dir_name: dir_name.to_string(),
            file_name: file_name.to_string(),
            path: source_path.to_path_buf(),
        };

        match handler.handle(&file) {
            Ok(()) => true,
            Err(e) => {
                let pattern = match category {
                    Classification::Other(index) => self.matcher.other_pattern(index),
                    _ => None,
                };
                self.reporter.report(&Event::HandlerFailed {
                    dir: dir_name.to_string(),
                    file: file_name.to_string(),
                    pattern: pattern.unwrap_or_default().to_string(),
                    error: e.to_string(),
                });
                false
            }
        }
    }
}
