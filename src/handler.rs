//! Handlers for files that match a secondary pattern with an `exec` reference.
//!
//! A handler takes ownership of the file's disposition: the router does not
//! move a dispatched file. Handlers run synchronously inside the poll cycle,
//! so a slow handler delays every directory after it.
//!
//! An `exec` reference is resolved once, when the router is built:
//! - a name registered in [`HandlerRegistry`] resolves to that handler
//! - anything else is treated as a command line and run with [`CommandHandler`]

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use thiserror::Error;

/// A file found in a scanned source subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Name of the subdirectory under `source_dir`.
    pub dir_name: String,
    pub file_name: String,
    /// Full path to the file.
    pub path: PathBuf,
}

/// Errors raised by a dispatched handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler command could not be started.
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The handler command ran but reported failure.
    #[error("'{program}' exited with {status}")]
    ExitStatus { program: String, status: ExitStatus },
    /// A library-supplied handler failed.
    #[error("{0}")]
    Failed(String),
}

/// Disposes of a file matched by a secondary pattern.
pub trait FileHandler: Send + Sync {
    fn handle(&self, file: &SourceFile) -> Result<(), HandlerError>;
}

/// Adapts a closure into a [`FileHandler`].
///
/// ```
/// use dirsweep::handler::{FnHandler, HandlerError, HandlerRegistry, SourceFile};
///
/// let mut registry = HandlerRegistry::new();
/// registry.register("print", FnHandler(|file: &SourceFile| -> Result<(), HandlerError> {
///     println!("printing {}", file.file_name);
///     Ok(())
/// }));
/// assert!(registry.contains("print"));
/// ```
pub struct FnHandler<F>(pub F);

impl<F> FileHandler for FnHandler<F>
where
    F: Fn(&SourceFile) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, file: &SourceFile) -> Result<(), HandlerError> {
        (self.0)(file)
    }
}

/// Runs an external program with the file's full path as its last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHandler {
    program: String,
    args: Vec<String>,
}

impl CommandHandler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits a command line on whitespace. Returns `None` for a blank line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl FileHandler for CommandHandler {
    fn handle(&self, file: &SourceFile) -> Result<(), HandlerError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&file.path)
            .status()
            .map_err(|e| HandlerError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(HandlerError::ExitStatus {
                program: self.program.clone(),
                status,
            })
        }
    }
}

/// Named handlers supplied by the embedding program.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn FileHandler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, handler: impl FileHandler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Resolves an `exec` reference to a handler.
    ///
    /// Registered names win; otherwise the reference is parsed as a command line.
    pub fn resolve(&self, exec: &str) -> Option<Arc<dyn FileHandler>> {
        if let Some(handler) = self.handlers.get(exec) {
            return Some(Arc::clone(handler));
        }
        CommandHandler::parse(exec).map(|command| Arc::new(command) as Arc<dyn FileHandler>)
    }
}
