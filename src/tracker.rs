//! Tracking of which source subdirectories have already been scanned.
//!
//! Each subdirectory (typically a mounted USB stick) is scanned once, on the
//! poll cycle it first appears. It is forgotten when it disappears, so the
//! same name showing up again later counts as new media and is scanned again.

use std::collections::BTreeSet;

/// What changed between the tracked set and the latest listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Names seen for the first time, in listing order.
    pub added: Vec<String>,
    /// Tracked names no longer present.
    pub removed: BTreeSet<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The set of subdirectory names scanned at least once while present.
#[derive(Debug, Clone, Default)]
pub struct DirectoryTracker {
    tracked: BTreeSet<String>,
}

impl DirectoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the tracked set in line with `current` and reports the difference.
    ///
    /// `current` is the live listing of the source directory with excluded
    /// names already removed. Duplicate names in `current` are reported once.
    pub fn reconcile<I, S>(&mut self, current: I) -> Reconciliation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let current: Vec<String> = current.into_iter().map(Into::into).collect();
        let present: BTreeSet<&str> = current.iter().map(String::as_str).collect();

        let removed: BTreeSet<String> = self
            .tracked
            .iter()
            .filter(|name| !present.contains(name.as_str()))
            .cloned()
            .collect();
        for name in &removed {
            self.tracked.remove(name);
        }

        let mut added = Vec::new();
        for name in current {
            if !self.tracked.contains(&name) {
                self.tracked.insert(name.clone());
                added.push(name);
            }
        }

        Reconciliation { added, removed }
    }

    /// Drops `name` from the tracked set so the next reconcile reports it as
    /// added again. Used when a new directory could not be scanned.
    pub fn forget(&mut self, name: &str) -> bool {
        self.tracked.remove(name)
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.tracked.contains(name)
    }

    pub fn tracked(&self) -> impl Iterator<Item = &str> {
        self.tracked.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_listing_adds_everything_in_order() {
        let mut tracker = DirectoryTracker::new();
        let result = tracker.reconcile(["usb_b", "usb_a"]);
        assert_eq!(result.added, vec!["usb_b", "usb_a"]);
        assert!(result.removed.is_empty());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut tracker = DirectoryTracker::new();
        tracker.reconcile(["usb_a", "usb_b"]);
        let second = tracker.reconcile(["usb_a", "usb_b"]);
        assert!(second.is_empty());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_missing_directory_is_removed() {
        let mut tracker = DirectoryTracker::new();
        tracker.reconcile(["usb_a", "usb_b"]);
        let result = tracker.reconcile(["usb_b"]);
        assert!(result.added.is_empty());
        assert_eq!(result.removed, BTreeSet::from(["usb_a".to_string()]));
        assert!(!tracker.is_tracked("usb_a"));
        assert!(tracker.is_tracked("usb_b"));
    }

    #[test]
    fn test_forgotten_directory_is_added_again() {
        let mut tracker = DirectoryTracker::new();
        tracker.reconcile(["usb_a", "usb_b"]);
        assert!(tracker.forget("usb_a"));
        assert!(!tracker.forget("usb_c"));

        let result = tracker.reconcile(["usb_a", "usb_b"]);
        assert_eq!(result.added, vec!["usb_a"]);
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_reappearing_directory_is_new_again() {
        let mut tracker = DirectoryTracker::new();
        tracker.reconcile(["usb_a"]);
        tracker.reconcile(Vec::<String>::new());
        let result = tracker.reconcile(["usb_a"]);
        assert_eq!(result.added, vec!["usb_a"]);
    }

    #[test]
    fn test_added_and_removed_in_same_pass() {
        let mut tracker = DirectoryTracker::new();
        tracker.reconcile(["old"]);
        let result = tracker.reconcile(["new"]);
        assert_eq!(result.added, vec!["new"]);
        assert_eq!(result.removed, BTreeSet::from(["old".to_string()]));
        assert_eq!(tracker.tracked().collect::<Vec<_>>(), vec!["new"]);
    }

    #[test]
    fn test_duplicate_names_reported_once() {
        let mut tracker = DirectoryTracker::new();
        let result = tracker.reconcile(["usb", "usb"]);
        assert_eq!(result.added, vec!["usb"]);
    }

    #[test]
    fn test_empty_listing_on_empty_tracker() {
        let mut tracker = DirectoryTracker::new();
        assert!(tracker.reconcile(Vec::<String>::new()).is_empty());
        assert!(tracker.is_empty());
    }
}
