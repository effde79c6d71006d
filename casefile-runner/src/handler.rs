//! Handler capability trait.
//!
//! A handler is a plain record type: decoded case fields land in its
//! own fields, then `check` runs assertions against them. The runner
//! fabricates and resets instances through the trait instead of
//! inspecting the concrete type.

use casefile_data::Labels;
use serde::de::DeserializeOwned;

/// Case metadata handed to a handler's assertions.
#[derive(Debug, Clone)]
pub struct CaseInfo {
    description: String,
    labels: Labels,
    index: usize,
}

impl CaseInfo {
    pub(crate) fn new(description: &str, labels: Labels, index: usize) -> Self {
        Self {
            description: description.to_string(),
            labels,
            index,
        }
    }

    /// The case's description; useful in assertion messages.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The case's labels.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Zero-based position of the case in the selected list.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Capability interface every case handler implements.
///
/// Sequential runs reuse one instance, resetting it before each case's
/// decode; parallel runs fabricate a fresh instance per case. Both
/// lifecycles go through `blank` and `reset`, so a handler with state
/// beyond its decoded fields can override them.
pub trait Handler: DeserializeOwned + Default {
    /// Produce an instance in its blank state.
    fn blank() -> Self {
        Self::default()
    }

    /// Restore this instance to its blank state.
    fn reset(&mut self) {
        *self = Self::blank();
    }

    /// Run assertions against the decoded fields. A panic fails the
    /// case; the rest of the batch keeps running.
    fn check(&self, case: &CaseInfo);
}
