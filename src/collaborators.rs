//! The external capabilities the routing components are built with.

use crate::clock::{Clock, SystemClock};
use crate::fs_ops::{LocalFs, Mover, Remover};
use crate::handler::HandlerRegistry;
use crate::report::{Reporter, TracingReporter};
use std::fmt;
use std::sync::Arc;

/// File-system, time, reporting, and handler capabilities shared by the
/// router, the purge manager, and the orchestrator.
///
/// The default uses the local file system, the system clock, `tracing`
/// output, and no registered handlers.
#[derive(Clone)]
pub struct Collaborators {
    pub mover: Arc<dyn Mover>,
    pub remover: Arc<dyn Remover>,
    pub clock: Arc<dyn Clock>,
    pub reporter: Arc<dyn Reporter>,
    pub handlers: HandlerRegistry,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            mover: Arc::new(LocalFs),
            remover: Arc::new(LocalFs),
            clock: Arc::new(SystemClock),
            reporter: Arc::new(TracingReporter),
            handlers: HandlerRegistry::new(),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

impl Collaborators {
    pub fn with_mover(mut self, mover: Arc<dyn Mover>) -> Self {
        self.mover = mover;
        self
    }

    pub fn with_remover(mut self, remover: Arc<dyn Remover>) -> Self {
        self.remover = remover;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }
}
