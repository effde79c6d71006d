//! Case model and loader for data-driven tests.
//!
//! Scenarios live in JSON or YAML files beside the tests that consume
//! them. This crate:
//! - discovers the files backing a named case set
//! - parses them into records with a format-agnostic canonical payload
//! - resolves shared reference payloads through a cached store
//! - merges and decodes case data into caller-defined types
//!
//! Execution lives in the companion runner crate; everything here is
//! inert data plus the loading rules.

pub mod case;
pub mod discover;
pub mod format;
pub mod record;
pub mod refs;

pub use case::{CaseError, TestCase};
pub use discover::{CaseList, DiscoverError};
pub use format::{CaseFormat, ParseError};
pub use record::{CaseRecord, Labels, Reference};
pub use refs::{RefError, RefStore, REF_DIR};
