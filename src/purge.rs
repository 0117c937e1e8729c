//! Daily purge of aged files from the target directory.
//!
//! Files routed into the target directory carry a `<day>_` prefix recording
//! the day of month they arrived. Once per calendar day the purge pass
//! computes the day of month `purge_after` days ago and deletes every marked
//! file whose day is at or below it.
//!
//! The comparison is on day-of-month integers only, with no month or year.
//! A file marked `28` last month and one marked `28` yesterday look the same,
//! and early in a month the cutoff wraps to a high day number from the
//! previous month. Unmarked files are never touched.

use crate::age_marker;
use crate::collaborators::Collaborators;
use crate::config::ValidatedConfig;
use crate::file_router::{RouteError, RouteResult};
use crate::fs_ops::{self, Remover};
use crate::report::{Event, Reporter};
use chrono::{DateTime, Datelike, Local, TimeDelta};
use std::path::PathBuf;
use std::sync::Arc;

/// What one purge run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Day of month at or below which marked files were deleted. `None` if
    /// the retention window reaches past the supported date range.
    pub cutoff_day: Option<u32>,
    pub purged: usize,
    /// Marked files that were old enough but could not be deleted.
    pub failed: usize,
    /// Marked files still inside the retention window.
    pub kept: usize,
    /// Files without a day marker.
    pub skipped: usize,
}

/// Deletes expired files from the target directory at most once per day.
pub struct PurgeManager {
    target_dir: PathBuf,
    purge_after_days: u64,
    last_run: Option<DateTime<Local>>,
    remover: Arc<dyn Remover>,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for PurgeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurgeManager")
            .field("target_dir", &self.target_dir)
            .field("purge_after_days", &self.purge_after_days)
            .field("last_run", &self.last_run)
            .finish_non_exhaustive()
    }
}

impl PurgeManager {
    pub fn new(config: &ValidatedConfig, collaborators: &Collaborators) -> Self {
        Self {
            target_dir: config.target_dir().to_path_buf(),
            purge_after_days: config.purge_after_days(),
            last_run: None,
            remover: Arc::clone(&collaborators.remover),
            reporter: Arc::clone(&collaborators.reporter),
        }
    }

    pub fn last_run(&self) -> Option<DateTime<Local>> {
        self.last_run
    }

    /// True unless a purge already ran on a day with the same day-of-month as `now`.
    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        self.last_run.is_none_or(|last| last.day() != now.day())
    }

    /// Runs the purge if it has not yet run today.
    ///
    /// The run is recorded before anything is deleted, so a failure partway
    /// through does not trigger a second run later the same day. Files that
    /// fail to delete are reported and skipped.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::ListFailed` if the target directory cannot be listed.
    pub fn purge_if_due(&mut self, now: DateTime<Local>) -> RouteResult<Option<PurgeSummary>> {
        if !self.is_due(now) {
            return Ok(None);
        }
        self.last_run = Some(now);

        let files = fs_ops::list_files(&self.target_dir).map_err(|e| RouteError::ListFailed {
            path: self.target_dir.clone(),
            source: e,
        })?;

        let cutoff_day = cutoff_day(now, self.purge_after_days);
        let mut summary = PurgeSummary {
            cutoff_day,
            ..PurgeSummary::default()
        };

        for file_name in files {
            let Some(file_day) = age_marker::parse(&file_name) else {
                summary.skipped += 1;
                continue;
            };
            let Some(cutoff) = cutoff_day else {
                summary.kept += 1;
                continue;
            };
            if file_day > cutoff {
                summary.kept += 1;
                continue;
            }

            let path = self.target_dir.join(&file_name);
            match self.remover.remove_file(&path) {
                Ok(()) => summary.purged += 1,
                Err(e) => {
                    summary.failed += 1;
                    let error = RouteError::RemoveFailed { path, source: e };
                    self.reporter.report(&Event::PurgeFailed {
                        file: file_name,
                        error: error.to_string(),
                    });
                }
            }
        }

        self.reporter.report(&Event::PurgeCompleted {
            cutoff_day: summary.cutoff_day,
            purged: summary.purged,
            failed: summary.failed,
        });
        Ok(Some(summary))
    }
}

/// Day of month of `now` minus `days` days.
pub fn cutoff_day(now: DateTime<Local>, days: u64) -> Option<u32> {
    let days = i64::try_from(days).ok()?;
    let delta = TimeDelta::try_days(days)?;
    now.checked_sub_signed(delta).map(|then| then.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::report::MemoryReporter;
    use chrono::TimeZone;
    use std::fs;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    fn at(month: u32, day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, month, day, 9, 30, 0).unwrap()
    }

    struct Setup {
        _temp: TempDir,
        target: PathBuf,
        reporter: Arc<MemoryReporter>,
        manager: PurgeManager,
    }

    fn setup_with(purge_after: i64, remover: Arc<dyn Remover>) -> Setup {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let target = temp.path().to_path_buf();
        let mut config = Config::new(temp.path(), temp.path(), "^x$");
        config.purge_after = purge_after;
        let config = config.validate().unwrap();
        let reporter = Arc::new(MemoryReporter::new());
        let collaborators = Collaborators::default()
            .with_remover(remover)
            .with_reporter(reporter.clone());
        Setup {
            _temp: temp,
            target,
            reporter,
            manager: PurgeManager::new(&config, &collaborators),
        }
    }

    fn setup(purge_after: i64) -> Setup {
        setup_with(purge_after, Arc::new(crate::fs_ops::LocalFs))
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name).unwrap();
    }

    #[test]
    fn test_cutoff_day() {
        assert_eq!(cutoff_day(at(5, 10), 3), Some(7));
        assert_eq!(cutoff_day(at(5, 10), 0), Some(10));
        assert_eq!(cutoff_day(at(3, 2), 3), Some(28));
        assert_eq!(cutoff_day(at(5, 10), u64::MAX), None);
    }

    #[test]
    fn test_purge_boundary() {
        let mut s = setup(3);
        touch(&s.target, "7_old.jpg");
        touch(&s.target, "8_new.jpg");
        touch(&s.target, "1_older.jpg");

        let summary = s.manager.purge_if_due(at(5, 10)).unwrap().unwrap();

        assert_eq!(summary.cutoff_day, Some(7));
        assert_eq!(summary.purged, 2);
        assert_eq!(summary.kept, 1);
        assert!(!s.target.join("7_old.jpg").exists());
        assert!(!s.target.join("1_older.jpg").exists());
        assert!(s.target.join("8_new.jpg").exists());
    }

    #[test]
    fn test_unmarked_files_are_left_alone() {
        let mut s = setup(0);
        touch(&s.target, "report.txt");
        touch(&s.target, "12");

        let summary = s.manager.purge_if_due(at(5, 31)).unwrap().unwrap();

        assert_eq!(summary.purged, 0);
        assert_eq!(summary.skipped, 2);
        assert!(s.target.join("report.txt").exists());
        assert!(s.target.join("12").exists());
    }

    #[test]
    fn test_runs_once_per_day() {
        let mut s = setup(0);
        let morning = at(5, 10);
        assert!(s.manager.purge_if_due(morning).unwrap().is_some());
        assert_eq!(s.manager.last_run(), Some(morning));

        touch(&s.target, "10_late.jpg");
        let evening = Local.with_ymd_and_hms(2024, 5, 10, 22, 0, 0).unwrap();
        assert!(!s.manager.is_due(evening));
        assert!(s.manager.purge_if_due(evening).unwrap().is_none());
        assert!(s.target.join("10_late.jpg").exists());

        let summary = s.manager.purge_if_due(at(5, 11)).unwrap().unwrap();
        assert_eq!(summary.purged, 1);
    }

    #[test]
    fn test_same_day_number_next_month_is_not_due() {
        let mut s = setup(0);
        s.manager.purge_if_due(at(5, 10)).unwrap();
        assert!(!s.manager.is_due(at(6, 10)));
    }

    #[test]
    fn test_missing_target_records_run_and_fails() {
        let mut s = setup(0);
        let gone = s.target.join("gone");
        s.manager.target_dir = gone;

        let result = s.manager.purge_if_due(at(5, 10));
        assert!(matches!(result, Err(RouteError::ListFailed { .. })));
        assert_eq!(s.manager.last_run(), Some(at(5, 10)));
    }

    struct FailingRemover;

    impl Remover for FailingRemover {
        fn remove_file(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        }
    }

    #[test]
    fn test_delete_failure_is_reported_and_skipped() {
        let mut s = setup_with(0, Arc::new(FailingRemover));
        touch(&s.target, "1_a.jpg");
        touch(&s.target, "2_b.jpg");

        let summary = s.manager.purge_if_due(at(5, 10)).unwrap().unwrap();

        assert_eq!(summary.purged, 0);
        assert_eq!(summary.failed, 2);
        let events = s.reporter.events();
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, Event::PurgeFailed { .. }))
                .count(),
            2
        );
        assert!(matches!(
            events.last(),
            Some(Event::PurgeCompleted { purged: 0, failed: 2, .. })
        ));
    }
}
