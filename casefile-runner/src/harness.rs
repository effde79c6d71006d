//! Top-level harness: configuration, discovery, and case execution.
//!
//! One `run*` call per enclosing test drives every selected case of a
//! set and aggregates their outcomes. Discovery problems abort the run
//! before any case executes; per-case failures never stop the batch.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use casefile_data::{CaseList, DiscoverError, Labels, RefStore, TestCase};
use thiserror::Error;

use crate::handler::{CaseInfo, Handler};
use crate::logger::{Logger, NullLogger};
use crate::report::{CaseOutcome, CaseStatus, RunReport};

/// Name of the default data directory, resolved under the package root.
pub const DEFAULT_DATA_DIR: &str = "testdata";

/// Fatal errors that abort a run before any case executes.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),
}

/// Options for `run_with`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Label selector; the empty selector keeps every case.
    pub selector: Labels,
    /// Run cases concurrently, one fresh handler instance per case.
    pub parallel: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one selector entry.
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.selector.insert(key.to_string(), value.to_string());
        self
    }

    /// Replace the whole selector.
    pub fn with_selector(mut self, selector: Labels) -> Self {
        self.selector = selector;
        self
    }

    /// Switch to parallel scheduling.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }
}

/// Explicit context threaded through every run: the data directory,
/// the shared reference store, and a logger.
pub struct Harness {
    data_dir: PathBuf,
    refs: Arc<RefStore>,
    logger: Arc<dyn Logger>,
}

impl Harness {
    /// Harness over the `testdata` directory of the calling package.
    pub fn new() -> Self {
        Self::with_data_dir(DEFAULT_DATA_DIR)
    }

    /// Harness over a specific data directory. Absolute paths are used
    /// verbatim; relative ones resolve against the calling package's
    /// root.
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let data_dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            package_root().join(dir)
        };
        Self {
            data_dir,
            refs: Arc::new(RefStore::new()),
            logger: Arc::new(NullLogger),
        }
    }

    /// Share a reference store with other harnesses instead of owning
    /// a private cache.
    pub fn with_ref_store(mut self, refs: Arc<RefStore>) -> Self {
        self.refs = refs;
        self
    }

    /// Install a logger; the default discards diagnostics.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The reference store shared by this harness's cases.
    pub fn ref_store(&self) -> &Arc<RefStore> {
        &self.refs
    }

    /// Run every case of the set `name`, sequentially, reusing
    /// `handler` with a reset before each case.
    pub fn run<H: Handler>(&self, name: &str, handler: &mut H) -> Result<RunReport, HarnessError> {
        self.run_with(name, handler, RunOptions::new())
    }

    /// Run the set `name` with selection and scheduling options.
    ///
    /// Sequential runs reuse `handler`; parallel runs leave it
    /// untouched and fabricate a fresh instance per case. Outcomes are
    /// reported in selected list order either way.
    pub fn run_with<H: Handler>(
        &self,
        name: &str,
        handler: &mut H,
        options: RunOptions,
    ) -> Result<RunReport, HarnessError> {
        let list = CaseList::discover(&self.data_dir, name, Arc::clone(&self.refs))?;
        let selected = list.select(&options.selector);
        self.logger.verbose(&format!(
            "{name}: discovered {} cases, selected {}",
            list.len(),
            selected.len()
        ));

        let mut report = RunReport::new(name);
        if options.parallel {
            self.run_parallel::<H>(&selected, &mut report);
        } else {
            self.run_sequential(&selected, handler, &mut report);
        }
        Ok(report)
    }

    fn run_sequential<H: Handler>(
        &self,
        cases: &CaseList,
        handler: &mut H,
        report: &mut RunReport,
    ) {
        for (index, case) in cases.iter().enumerate() {
            handler.reset();
            let status = execute_case(case, index, handler);
            self.log_outcome(index, case, &status);
            report.push(CaseOutcome::new(case.description(), status));
        }
    }

    fn run_parallel<H: Handler>(&self, cases: &CaseList, report: &mut RunReport) {
        let statuses: Vec<CaseStatus> = thread::scope(|scope| {
            let handles: Vec<_> = cases
                .iter()
                .enumerate()
                .map(|(index, case)| {
                    scope.spawn(move || {
                        let mut handler = H::blank();
                        execute_case(case, index, &mut handler)
                    })
                })
                .collect();
            // Joining in spawn order keeps the report in list order
            // whatever the scheduler did.
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| CaseStatus::Failed(panic_message(payload)))
                })
                .collect()
        });

        for ((index, case), status) in cases.iter().enumerate().zip(statuses) {
            self.log_outcome(index, case, &status);
            report.push(CaseOutcome::new(case.description(), status));
        }
    }

    fn log_outcome(&self, index: usize, case: &TestCase, status: &CaseStatus) {
        match status {
            CaseStatus::Passed => self
                .logger
                .debug(&format!("case {index} ({}): passed", case.description())),
            CaseStatus::Failed(message) => self.logger.info(&format!(
                "case {index} ({}): failed: {message}",
                case.description()
            )),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

/// Decode into the handler, then run its assertions, catching panics
/// so one failing case never stops the batch. A decode failure fails
/// the case without running its assertions.
fn execute_case<H: Handler>(case: &TestCase, index: usize, handler: &mut H) -> CaseStatus {
    if let Err(err) = case.decode(handler) {
        return CaseStatus::Failed(err.to_string());
    }

    let info = CaseInfo::new(case.description(), case.labels().clone(), index);
    match catch_unwind(AssertUnwindSafe(|| handler.check(&info))) {
        Ok(()) => CaseStatus::Passed,
        Err(payload) => CaseStatus::Failed(panic_message(payload)),
    }
}

/// Best-effort text from a panic payload.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "case panicked".to_string()
    }
}

/// Root of the calling package: CARGO_MANIFEST_DIR as set by cargo
/// when tests run, else the current directory.
fn package_root() -> PathBuf {
    std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
