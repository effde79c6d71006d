//! Case record model.
//!
//! One record per scenario, exactly as it appears in a source file.
//! Records are deserialized once at discovery time and never mutated
//! afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Labels attached to a case, and the selector shape used to filter.
pub type Labels = BTreeMap<String, String>;

/// One scenario as parsed from a source file.
///
/// Every field is optional in the source; absent fields deserialize to
/// their empty form so sparse case files stay valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Human-readable name. Duplicates across a case set are legal.
    #[serde(default)]
    pub description: String,

    /// Selection labels, matched exactly by key and value.
    #[serde(default)]
    pub labels: Labels,

    /// Inline payload, keyed by destination field name.
    #[serde(default)]
    pub data: Map<String, Value>,

    /// External payloads merged into `data` before decoding, in
    /// declared order.
    #[serde(default, rename = "refs")]
    pub references: Vec<Reference>,
}

/// Named pointer to an external payload file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Destination key in the merged mapping.
    pub name: String,

    /// File name, resolved under the data directory's `common`
    /// subdirectory.
    #[serde(rename = "ref")]
    pub target: String,
}
