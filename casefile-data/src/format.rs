//! Source format recognition and parsing.
//!
//! Both formats deserialize into the same canonical value shape
//! (`serde_json::Value`), so merge and decode logic downstream never
//! depends on source syntax. Only this module knows which syntax a
//! file used.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::record::CaseRecord;

/// Errors from parsing case files or reference payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Source format of a case file, recognized from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFormat {
    Json,
    Yaml,
}

impl CaseFormat {
    /// Recognize a format from a file's extension. `.json`, `.yaml`
    /// and `.yml` are known, case-insensitively; anything else is
    /// `None`.
    pub fn from_path(path: &Path) -> Option<CaseFormat> {
        let ext = path.extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(CaseFormat::Json),
            "yaml" | "yml" => Some(CaseFormat::Yaml),
            _ => None,
        }
    }

    /// Parse a whole case file: a JSON array or YAML sequence of case
    /// objects, kept in file order.
    pub fn parse_cases(&self, bytes: &[u8]) -> Result<Vec<CaseRecord>, ParseError> {
        match self {
            CaseFormat::Json => Ok(serde_json::from_slice(bytes)?),
            CaseFormat::Yaml => Ok(serde_yaml::from_slice(bytes)?),
        }
    }

    /// Parse one reference payload into a canonical value.
    pub fn parse_value(&self, bytes: &[u8]) -> Result<Value, ParseError> {
        match self {
            CaseFormat::Json => Ok(serde_json::from_slice(bytes)?),
            CaseFormat::Yaml => Ok(serde_yaml::from_slice(bytes)?),
        }
    }
}
