//! Output formatting and styling module.
//!
//! Terminal output for the `once` and `check` commands. The polling loop
//! itself reports through `tracing`; this module is only for results a user
//! asked to see.

use crate::config::ValidatedConfig;
use crate::orchestrator::CycleSummary;
use colored::*;

/// Manages CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// OutputFormatter::success("Configuration is valid");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the resolved settings of a validated configuration.
    pub fn settings(config: &ValidatedConfig) {
        Self::header("CONFIGURATION");
        for (key, value) in settings_rows(config) {
            println!("  {:<14} {}", key.bold(), value);
        }
    }

    /// Prints a table of what one cycle did, one row per category per
    /// scanned directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::orchestrator::CycleSummary;
    /// use dirsweep::output::OutputFormatter;
    ///
    /// OutputFormatter::cycle_summary(&CycleSummary::default());
    /// ```
    pub fn cycle_summary(summary: &CycleSummary) {
        Self::header("SUMMARY");

        if summary.scanned.is_empty() && summary.failed.is_empty() {
            Self::info("No new directories found.");
        }

        let rows = summary_rows(summary);
        if !rows.is_empty() {
            let width = rows
                .iter()
                .map(|(dir, category, _)| dir.len() + category.len() + 1)
                .max()
                .unwrap_or(0)
                .max(8);

            println!("{:<width$} | {}", "Category".bold(), "Files".bold(), width = width);
            println!("{}", "-".repeat(width + 10));
            for (dir, category, count) in &rows {
                println!(
                    "{:<width$} | {} {}",
                    format!("{dir}/{category}"),
                    count.to_string().green(),
                    plural(*count),
                    width = width
                );
            }
            println!("{}", "-".repeat(width + 10));
            let handled = summary.handled_count();
            println!(
                "{:<width$} | {} {}",
                "Handled".bold(),
                handled.to_string().green().bold(),
                plural(handled),
                width = width
            );
        }

        for dir in &summary.failed {
            Self::error(&format!("Could not read {dir}"));
        }

        for (dir, outcome) in &summary.scanned {
            for file in outcome.failed() {
                Self::warning(&format!("{dir}/{file} was left in place after an error"));
            }
        }

        if let Some(purge) = &summary.purge {
            let cutoff = purge
                .cutoff_day
                .map_or_else(|| "none".to_string(), |day| day.to_string());
            Self::info(&format!(
                "Purged {} {} (cutoff day {}, {} kept, {} failed)",
                purge.purged,
                plural(purge.purged),
                cutoff,
                purge.kept,
                purge.failed
            ));
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Non-empty `(directory, category, count)` rows in scan order.
fn summary_rows(summary: &CycleSummary) -> Vec<(String, String, usize)> {
    summary
        .scanned
        .iter()
        .flat_map(|(dir, outcome)| {
            outcome
                .categories()
                .filter(|(_, files)| !files.is_empty())
                .map(move |(category, files)| (dir.clone(), category.to_string(), files.len()))
        })
        .collect()
}

fn settings_rows(config: &ValidatedConfig) -> Vec<(String, String)> {
    let mut rows = vec![
        ("source_dir".to_string(), config.source_dir().display().to_string()),
        ("target_dir".to_string(), config.target_dir().display().to_string()),
        ("pattern".to_string(), config.default_pattern().to_string()),
    ];
    for (index, rule) in config.other_patterns().iter().enumerate() {
        let action = rule.exec().unwrap_or("move");
        rows.push((
            format!("pattern #{index}"),
            format!("{} -> {}", rule.pattern(), action),
        ));
    }
    let excluded: Vec<&str> = config.excluded_dirs().iter().map(String::as_str).collect();
    rows.push(("excluded_dirs".to_string(), excluded.join(", ")));
    rows.push((
        "delay".to_string(),
        format!("{}s", config.poll_delay().as_secs()),
    ));
    rows.push((
        "purge_after".to_string(),
        format!("{} days", config.purge_after_days()),
    ));
    rows.push(("verbose".to_string(), config.verbose().to_string()));
    if let Some(dir) = config.log_dir() {
        rows.push(("log_dir".to_string(), dir.display().to_string()));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::file_router::ClassificationOutcome;
    use crate::pattern::Classification;

    #[test]
    fn test_summary_rows_skip_empty_categories() {
        let mut outcome = ClassificationOutcome::new(["^a$"]);
        outcome.record(Classification::Default, "IMG1.jpg");
        outcome.record(Classification::Default, "IMG2.jpg");
        outcome.record(Classification::Unhandled, "notes.txt");
        let summary = CycleSummary {
            added: vec!["usb".to_string()],
            scanned: vec![("usb".to_string(), outcome)],
            ..CycleSummary::default()
        };

        let rows = summary_rows(&summary);
        assert_eq!(
            rows,
            vec![
                ("usb".to_string(), "default".to_string(), 2),
                ("usb".to_string(), "unhandled".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_settings_rows_list_handlers() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp directory");
        let mut config = Config::new(temp.path(), temp.path(), r"^IMG.*$");
        config.add_pattern(r"^.*\.mp4$", Some("transcode"));
        config.add_pattern(r"^.*\.png$", None);
        let config = config.validate().unwrap();

        let rows = settings_rows(&config);
        assert!(rows.contains(&("pattern #0".to_string(), r"^.*\.mp4$ -> transcode".to_string())));
        assert!(rows.contains(&("pattern #1".to_string(), r"^.*\.png$ -> move".to_string())));
        assert!(rows.iter().all(|(key, _)| key != "log_dir"));
    }
}
