//! dirsweep - move files off newly mounted directories and purge them later
//!
//! This library watches a source directory for new subdirectories (mounted
//! removable media, for instance), routes each file they hold by matching its
//! name against an ordered set of anchored patterns, and deletes routed files
//! from the target directory once they are older than a retention window.

pub mod age_marker;
pub mod cli;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod file_router;
pub mod fs_ops;
pub mod handler;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod pattern;
pub mod purge;
pub mod report;
pub mod tracker;

pub use collaborators::Collaborators;
pub use config::{Config, ConfigError, ValidatedConfig};
pub use file_router::{ClassificationOutcome, FileRouter, RouteError};
pub use handler::{CommandHandler, FileHandler, HandlerError, HandlerRegistry, SourceFile};
pub use orchestrator::{CycleSummary, Orchestrator, OrchestratorError, OrchestratorState};
pub use pattern::{Classification, PatternMatcher};
pub use purge::{PurgeManager, PurgeSummary};
pub use report::{Event, Reporter};
pub use tracker::DirectoryTracker;

pub use cli::{Cli, run_cli};
