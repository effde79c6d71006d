//! A single runnable case: label matching, reference merging, and
//! decoding into caller types.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::format::{CaseFormat, ParseError};
use crate::record::{CaseRecord, Labels};
use crate::refs::{RefError, RefStore};

/// Per-case failures raised while merging or decoding.
///
/// These never abort a batch; the runner records them against the one
/// case that raised them.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("reference {name} ({target}) could not be resolved: {source}")]
    Ref {
        name: String,
        target: String,
        #[source]
        source: RefError,
    },

    #[error("key {name} is defined more than once in the merged data")]
    Collision { name: String },

    #[error("reference {name} has a malformed payload: {source}")]
    RefParse {
        name: String,
        #[source]
        source: ParseError,
    },

    #[error("failed decoding merged data into the target type: {0}")]
    Decode(#[source] serde_json::Error),
}

/// One scenario bound to the directory and format it came from.
///
/// Cases are assembled at discovery time and never mutated. The store
/// is shared by every case of a run.
#[derive(Debug, Clone)]
pub struct TestCase {
    record: CaseRecord,
    data_dir: PathBuf,
    format: CaseFormat,
    refs: Arc<RefStore>,
}

impl TestCase {
    pub fn new(
        record: CaseRecord,
        data_dir: impl Into<PathBuf>,
        format: CaseFormat,
        refs: Arc<RefStore>,
    ) -> Self {
        Self {
            record,
            data_dir: data_dir.into(),
            format,
            refs,
        }
    }

    /// The record's description, verbatim.
    pub fn description(&self) -> &str {
        &self.record.description
    }

    /// Labels attached to the case.
    pub fn labels(&self) -> &Labels {
        &self.record.labels
    }

    /// Source format of the file this case came from.
    pub fn format(&self) -> CaseFormat {
        self.format
    }

    /// Data directory the case was discovered under. References
    /// resolve relative to it, not to the case's own file.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Superset label match: every selector entry must be present on
    /// the case with an equal value. The empty selector matches any
    /// case; labels present only on the case never cause a mismatch.
    /// Comparison is exact string equality.
    pub fn matches(&self, selector: &Labels) -> bool {
        selector
            .iter()
            .all(|(key, value)| self.record.labels.get(key) == Some(value))
    }

    /// Decode the merged case mapping into `target`, replacing its
    /// previous state. Fields absent from the merged mapping take the
    /// target's serde defaults.
    pub fn decode<T: DeserializeOwned>(&self, target: &mut T) -> Result<(), CaseError> {
        let merged = self.merged()?;
        *target = serde_json::from_value(Value::Object(merged)).map_err(CaseError::Decode)?;
        Ok(())
    }

    /// Merge inline data with resolved references, in declared order.
    /// A reference whose name is already taken, whether by `data` or
    /// by an earlier reference, is a collision.
    fn merged(&self) -> Result<Map<String, Value>, CaseError> {
        let mut merged = self.record.data.clone();

        for reference in &self.record.references {
            let bytes = self
                .refs
                .resolve(&self.data_dir, &reference.target)
                .map_err(|source| CaseError::Ref {
                    name: reference.name.clone(),
                    target: reference.target.clone(),
                    source,
                })?;

            if merged.contains_key(&reference.name) {
                return Err(CaseError::Collision {
                    name: reference.name.clone(),
                });
            }

            let value = self
                .format
                .parse_value(&bytes)
                .map_err(|source| CaseError::RefParse {
                    name: reference.name.clone(),
                    source,
                })?;
            merged.insert(reference.name.clone(), value);
        }

        Ok(merged)
    }
}
