//! Run outcome aggregation.
//!
//! The ambient test framework sees one enclosing test per case set, so
//! per-case results are collected into a report the enclosing test
//! asserts on. Outcome order always follows selected case order, even
//! for parallel runs.

use std::fmt;

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseStatus {
    Passed,
    Failed(String),
}

/// One case's outcome within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    description: String,
    status: CaseStatus,
}

impl CaseOutcome {
    pub(crate) fn new(description: &str, status: CaseStatus) -> Self {
        Self {
            description: description.to_string(),
            status,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }

    /// The failure message, if the case failed.
    pub fn failure(&self) -> Option<&str> {
        match &self.status {
            CaseStatus::Passed => None,
            CaseStatus::Failed(message) => Some(message),
        }
    }
}

/// Ordered outcomes of one run of a case set.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    name: String,
    outcomes: Vec<CaseOutcome>,
}

impl RunReport {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, outcome: CaseOutcome) {
        self.outcomes.push(outcome);
    }

    /// The case set name this report covers.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outcomes(&self) -> &[CaseOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(CaseOutcome::passed)
    }

    /// One line per failed case: `case <index> (<description>): <message>`.
    /// The index disambiguates duplicate descriptions.
    pub fn failures(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| {
                outcome.failure().map(|message| {
                    format!("case {index} ({}): {message}", outcome.description())
                })
            })
            .collect()
    }

    /// Panic with every failure listed unless the whole run passed.
    /// Meant as the last line of an enclosing test.
    #[track_caller]
    pub fn assert_all_passed(&self) {
        if !self.all_passed() {
            panic!("{self}");
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failures = self.failures();
        write!(
            f,
            "{}: {} of {} cases passed",
            self.name,
            self.len() - failures.len(),
            self.len()
        )?;
        for line in &failures {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}
