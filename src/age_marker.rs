//! Day-of-month markers embedded in routed file names.
//!
//! A file moved into the target directory is renamed `<day>_<original>`, where
//! `<day>` is the calendar day (1-31) of the move. The purge pass reads the
//! marker back to decide whether the file has outlived the retention window.
//!
//! # Examples
//!
//! ```
//! use dirsweep::age_marker;
//!
//! let marked = age_marker::mark(7, "IMG001.jpg");
//! assert_eq!(marked, "7_IMG001.jpg");
//! assert_eq!(age_marker::parse(&marked), Some(7));
//! assert_eq!(age_marker::parse("report.txt"), None);
//! ```

/// Prefixes `file_name` with the day-of-month marker.
pub fn mark(day: u32, file_name: &str) -> String {
    format!("{}_{}", day, file_name)
}

/// Recovers the day marker from a target-directory file name.
///
/// Only a non-empty run of ASCII digits followed by `_` counts as a marker.
/// Anything else returns `None`, meaning the file is not owned by the purge pass.
pub fn parse(file_name: &str) -> Option<u32> {
    let (prefix, _) = file_name.split_once('_')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}
