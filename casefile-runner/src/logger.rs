//! Diagnostics for test runs.
//!
//! A trait-based logger keeps runner output testable and free of
//! global state. The harness stays quiet by default so case output is
//! not drowned; opt in with a stderr logger when debugging data files.

use std::io::Write;
use std::sync::{Arc, RwLock};

/// Verbosity level of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Always shown when a logger is installed.
    Normal,
    /// Discovery and selection summaries.
    Verbose,
    /// Per-case lifecycle detail.
    Debug,
}

/// Sink for runner diagnostics.
///
/// Implementations must be thread-safe; a harness and its logger may
/// be shared across threads.
pub trait Logger: Send + Sync {
    /// Log a message at the given verbosity level.
    fn log(&self, level: Verbosity, message: &str);

    fn info(&self, message: &str) {
        self.log(Verbosity::Normal, message);
    }

    fn verbose(&self, message: &str) {
        self.log(Verbosity::Verbose, message);
    }

    fn debug(&self, message: &str) {
        self.log(Verbosity::Debug, message);
    }
}

/// Logger that writes to stderr, filtered by level.
#[derive(Debug)]
pub struct StderrLogger {
    level: Verbosity,
}

impl StderrLogger {
    pub fn new(level: Verbosity) -> Self {
        Self { level }
    }

    /// Show discovery and selection summaries.
    pub fn verbose() -> Self {
        Self::new(Verbosity::Verbose)
    }

    /// Show per-case lifecycle detail.
    pub fn debug() -> Self {
        Self::new(Verbosity::Debug)
    }
}

impl Logger for StderrLogger {
    fn log(&self, level: Verbosity, message: &str) {
        if level <= self.level {
            let _ = writeln!(std::io::stderr(), "{}", message);
        }
    }
}

/// Logger that captures every message for inspection in tests.
/// Cloning creates a new handle to the same captured entries.
#[derive(Debug, Clone, Default)]
pub struct MockLogger {
    entries: Arc<RwLock<Vec<LogEntry>>>,
}

/// A captured diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Verbosity,
    pub message: String,
}

impl MockLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured entry, in logging order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().unwrap().clone()
    }

    /// Just the message text of every captured entry.
    pub fn messages(&self) -> Vec<String> {
        self.entries().iter().map(|e| e.message.clone()).collect()
    }

    /// Whether any captured message contains the substring.
    pub fn contains(&self, substring: &str) -> bool {
        self.messages().iter().any(|m| m.contains(substring))
    }

    pub fn count(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

impl Logger for MockLogger {
    fn log(&self, level: Verbosity, message: &str) {
        // Capture regardless of level so tests see everything.
        self.entries.write().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }
}

/// Logger that discards everything. The harness default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl NullLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for NullLogger {
    fn log(&self, _level: Verbosity, _message: &str) {}
}
