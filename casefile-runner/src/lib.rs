//! Data-driven test runner.
//!
//! Binds the case sets loaded by `casefile-data` to caller-defined
//! handler types and drives one check per selected case, with
//! per-case failure isolation and optional parallel scheduling.
//!
//! ```no_run
//! use casefile_runner::{CaseInfo, Handler, Harness};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct EchoCase {
//!     req: String,
//!     resp: String,
//! }
//!
//! impl Handler for EchoCase {
//!     fn check(&self, case: &CaseInfo) {
//!         assert_eq!(self.resp, self.req, "case {}", case.description());
//!     }
//! }
//!
//! # fn main() -> Result<(), casefile_runner::HarnessError> {
//! let mut handler = EchoCase::default();
//! let report = Harness::new().run("echo", &mut handler)?;
//! report.assert_all_passed();
//! # Ok(())
//! # }
//! ```

pub mod handler;
pub mod harness;
pub mod logger;
pub mod report;

pub use handler::{CaseInfo, Handler};
pub use harness::{Harness, HarnessError, RunOptions, DEFAULT_DATA_DIR};
pub use logger::{LogEntry, Logger, MockLogger, NullLogger, StderrLogger, Verbosity};
pub use report::{CaseOutcome, CaseStatus, RunReport};

// The loader surface consumers typically need alongside the runner.
pub use casefile_data::{CaseError, DiscoverError, Labels, RefStore};
