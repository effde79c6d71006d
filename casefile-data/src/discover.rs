//! Case file discovery and selection.
//!
//! A case set named `foo` is either a single file `foo.<ext>` directly
//! under the data directory or a directory `foo/` whose files are all
//! parsed and concatenated. Discovery failures are fatal: they abort a
//! run before any case executes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::Pattern;
use thiserror::Error;

use crate::case::TestCase;
use crate::format::{CaseFormat, ParseError};
use crate::record::Labels;
use crate::refs::RefStore;

/// Fatal errors raised while locating or loading case files.
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("found more than one case file for {name}: {}", join_paths(.matches))]
    Ambiguous { name: String, matches: Vec<PathBuf> },

    #[error("no case files for {name} under {}", .dir.display())]
    NotFound { name: String, dir: PathBuf },

    #[error("unrecognized case file extension: {}", .path.display())]
    Unrecognized { path: PathBuf },

    #[error("invalid case set name {name}: {source}")]
    Name {
        name: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed parsing case file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ordered collection of cases discovered for one case set.
///
/// Order is file-discovery order, then in-file order, and is preserved
/// by every operation here.
#[derive(Debug, Clone, Default)]
pub struct CaseList {
    cases: Vec<TestCase>,
}

impl CaseList {
    /// Locate and parse the case files for `name` under `data_dir`.
    ///
    /// Exactly one direct `<name>.<ext>` match wins; more than one is
    /// ambiguous. With no direct match the directory `<name>/` must
    /// exist and hold at least one file; its files are parsed in
    /// sorted order. Every discovered case shares `refs`.
    pub fn discover(
        data_dir: &Path,
        name: &str,
        refs: Arc<RefStore>,
    ) -> Result<CaseList, DiscoverError> {
        let files = find_case_files(data_dir, name)?;

        let mut cases = Vec::new();
        for path in files {
            let format = CaseFormat::from_path(&path)
                .ok_or_else(|| DiscoverError::Unrecognized { path: path.clone() })?;
            let bytes = fs::read(&path).map_err(|source| DiscoverError::Io {
                path: path.clone(),
                source,
            })?;
            let records = format
                .parse_cases(&bytes)
                .map_err(|source| DiscoverError::Parse {
                    path: path.clone(),
                    source,
                })?;
            cases.extend(
                records
                    .into_iter()
                    .map(|record| TestCase::new(record, data_dir, format, Arc::clone(&refs))),
            );
        }

        Ok(CaseList { cases })
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.cases.iter()
    }

    /// Order-preserving filter: the sub-list of cases whose labels
    /// match `selector`, in their original relative order, duplicates
    /// included.
    pub fn select(&self, selector: &Labels) -> CaseList {
        CaseList {
            cases: self
                .cases
                .iter()
                .filter(|case| case.matches(selector))
                .cloned()
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CaseList {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}

/// Resolve the files backing a case set: one direct `<name>.*` match,
/// else the files of the `<name>/` directory in sorted order.
fn find_case_files(data_dir: &Path, name: &str) -> Result<Vec<PathBuf>, DiscoverError> {
    let pattern = format!(
        "{}/{}.*",
        Pattern::escape(&data_dir.to_string_lossy()),
        Pattern::escape(name)
    );
    let paths = glob::glob(&pattern).map_err(|source| DiscoverError::Name {
        name: name.to_string(),
        source,
    })?;

    // glob yields matches in sorted order.
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| DiscoverError::Io {
            path: err.path().to_path_buf(),
            source: err.into_error(),
        })?;
        matches.push(path);
    }

    match matches.len() {
        1 => Ok(matches),
        0 => list_case_dir(data_dir, name),
        _ => Err(DiscoverError::Ambiguous {
            name: name.to_string(),
            matches,
        }),
    }
}

fn list_case_dir(data_dir: &Path, name: &str) -> Result<Vec<PathBuf>, DiscoverError> {
    let case_dir = data_dir.join(name);

    let mut files = Vec::new();
    if let Ok(entries) = fs::read_dir(&case_dir) {
        for entry in entries {
            let entry = entry.map_err(|source| DiscoverError::Io {
                path: case_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(DiscoverError::NotFound {
            name: name.to_string(),
            dir: data_dir.to_path_buf(),
        });
    }
    Ok(files)
}
