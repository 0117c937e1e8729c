//! File-name classification against the configured pattern set.
//!
//! The default pattern is always checked first. Secondary patterns follow in
//! configured order and the first one that matches wins, so a broad pattern
//! listed early shadows narrower ones after it.
//!
//! # Examples
//!
//! ```no_run
//! use dirsweep::config::Config;
//! use dirsweep::pattern::{Classification, PatternMatcher};
//!
//! let mut config = Config::new("/media/usb", "/srv/drop", r"^IMG.*\.jpg$");
//! config.add_pattern(r"^.*\.pdf$", None);
//! let config = config.validate().unwrap();
//!
//! let matcher = PatternMatcher::new(&config);
//! assert_eq!(matcher.classify("IMG001.jpg"), Classification::Default);
//! assert_eq!(matcher.classify("scan.pdf"), Classification::Other(0));
//! assert_eq!(matcher.classify("notes.txt"), Classification::Unhandled);
//! ```

use crate::config::{ConfigError, ValidatedConfig};
use regex::Regex;
use std::fmt;

/// A validated `^...$` pattern compiled for whole-name matching.
///
/// The regex is compiled as `^(?:<pattern>)$` so alternations such as
/// `^a$|^ab$` cannot settle for a prefix or substring of the name.
#[derive(Debug, Clone)]
pub struct AnchoredPattern {
    source: String,
    regex: Regex,
}

impl AnchoredPattern {
    /// Compiles `pattern`, rejecting it unless it starts with `^` and ends with `$`.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        if !is_anchored(pattern) {
            return Err(ConfigError::PatternMalformed {
                pattern: pattern.to_string(),
                reason: "pattern must start with '^' and end with '$'".to_string(),
            });
        }
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            ConfigError::PatternMalformed {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_full_match(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

impl fmt::Display for AnchoredPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Returns true if `pattern` is anchored at both ends.
pub fn is_anchored(pattern: &str) -> bool {
    pattern.len() >= 2 && pattern.starts_with('^') && pattern.ends_with('$')
}

/// Which rule a file name fell under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classification {
    /// Matched the default pattern.
    Default,
    /// Matched the secondary pattern at this index (and not the default one).
    Other(usize),
    /// Matched nothing.
    Unhandled,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Default => write!(f, "default"),
            Classification::Other(index) => write!(f, "pattern #{}", index),
            Classification::Unhandled => write!(f, "unhandled"),
        }
    }
}

/// Evaluates the ordered rule set against a file name.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    default_pattern: AnchoredPattern,
    other_patterns: Vec<AnchoredPattern>,
}

impl PatternMatcher {
    pub fn new(config: &ValidatedConfig) -> Self {
        Self {
            default_pattern: config.default_pattern().clone(),
            other_patterns: config
                .other_patterns()
                .iter()
                .map(|rule| rule.pattern().clone())
                .collect(),
        }
    }

    /// Classifies `file_name`. Pure; the same name always yields the same result.
    pub fn classify(&self, file_name: &str) -> Classification {
        if self.default_pattern.is_full_match(file_name) {
            return Classification::Default;
        }

        self.other_patterns
            .iter()
            .position(|pattern| pattern.is_full_match(file_name))
            .map_or(Classification::Unhandled, Classification::Other)
    }

    /// Number of secondary patterns.
    pub fn other_count(&self) -> usize {
        self.other_patterns.len()
    }

    /// Source text of the secondary pattern at `index`.
    pub fn other_pattern(&self, index: usize) -> Option<&str> {
        self.other_patterns.get(index).map(AnchoredPattern::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn matcher(default: &str, others: &[&str]) -> (TempDir, PatternMatcher) {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let mut config = Config::new(temp.path(), temp.path(), default);
        for pattern in others {
            config.add_pattern(*pattern, None);
        }
        let config = config.validate().expect("config should validate");
        (temp, PatternMatcher::new(&config))
    }

    #[test]
    fn test_default_takes_precedence_over_others() {
        let (_temp, matcher) = matcher(r"^IMG.*\.jpg$", &[r"^.*\.jpg$"]);
        assert_eq!(matcher.classify("IMG001.jpg"), Classification::Default);
        assert_eq!(matcher.classify("DSC001.jpg"), Classification::Other(0));
    }

    #[test]
    fn test_first_matching_other_wins() {
        let (_temp, matcher) = matcher(r"^never$", &[r"^.*\.txt$", r"^notes.*$", r"^notes\.txt$"]);
        assert_eq!(matcher.classify("notes.txt"), Classification::Other(0));
        assert_eq!(matcher.classify("notes.md"), Classification::Other(1));
    }

    #[test]
    fn test_unmatched_is_unhandled() {
        let (_temp, matcher) = matcher(r"^IMG.*\.jpg$", &[r"^.*\.pdf$"]);
        assert_eq!(matcher.classify("notes.txt"), Classification::Unhandled);
        assert_eq!(matcher.classify(""), Classification::Unhandled);
    }

    #[test]
    fn test_whole_name_must_match() {
        let (_temp, matcher) = matcher(r"^IMG\d+$", &[r"^a|^ab$"]);
        assert_eq!(matcher.classify("IMG001"), Classification::Default);
        assert_eq!(matcher.classify("IMG001.jpg"), Classification::Unhandled);
        assert_eq!(matcher.classify("ab"), Classification::Other(0));
        assert_eq!(matcher.classify("a"), Classification::Other(0));
        assert_eq!(matcher.classify("abc"), Classification::Unhandled);
    }

    #[test]
    fn test_anchored_pattern_rejects_unanchored() {
        assert!(AnchoredPattern::new("^foo$").is_ok());
        for pattern in ["foo", "^foo", "foo$", "^", "$", ""] {
            assert!(
                matches!(
                    AnchoredPattern::new(pattern),
                    Err(ConfigError::PatternMalformed { .. })
                ),
                "pattern {:?} should be rejected",
                pattern
            );
        }
    }

    #[test]
    fn test_anchored_pattern_keeps_source_text() {
        let pattern = AnchoredPattern::new(r"^.*\.pdf$").unwrap();
        assert_eq!(pattern.as_str(), r"^.*\.pdf$");
        assert_eq!(pattern.to_string(), r"^.*\.pdf$");
    }

    #[test]
    fn test_other_pattern_lookup() {
        let (_temp, matcher) = matcher(r"^x$", &[r"^.*\.pdf$"]);
        assert_eq!(matcher.other_count(), 1);
        assert_eq!(matcher.other_pattern(0), Some(r"^.*\.pdf$"));
        assert_eq!(matcher.other_pattern(1), None);
    }

    #[test]
    fn test_classification_display() {
        assert_eq!(Classification::Default.to_string(), "default");
        assert_eq!(Classification::Other(2).to_string(), "pattern #2");
        assert_eq!(Classification::Unhandled.to_string(), "unhandled");
    }
}
