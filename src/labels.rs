use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

/// Position of a label in its [`LabelTable`].
pub type LabelIndex = usize;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelTableError {
    #[error("label table is empty")]
    Empty,
    #[error("label code {0:?} must be one or two ASCII letters")]
    InvalidCode(String),
    #[error("label code {0} appears more than once")]
    DuplicateCode(String),
    #[error("label {0} has an empty region name")]
    EmptyRegion(String),
}

// ---------------------------------------------------------------------------
// Label – one configured region code
// ---------------------------------------------------------------------------

/// A configured plate code together with its numeric index and region name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub index: LabelIndex,
    pub code: String,
    pub region: String,
}

#[derive(Debug, Deserialize)]
struct LabelTableFile {
    labels: Vec<LabelEntry>,
}

#[derive(Debug, Deserialize)]
struct LabelEntry {
    code: String,
    region: String,
}

// ---------------------------------------------------------------------------
// LabelTable – code ↔ index ↔ region
// ---------------------------------------------------------------------------

/// Immutable lookup between plate codes, label indices and region names.
///
/// Built once at startup and shared by reference. The index of a label is its
/// position in the table, so the code ↔ index mapping is bijective as long as
/// codes are unique, which [`LabelTable::new`] enforces.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: Vec<Label>,
    by_code: BTreeMap<String, LabelIndex>,
}

impl LabelTable {
    /// Build a table from `(code, region)` pairs in index order.
    pub fn new<I, C, R>(entries: I) -> Result<Self, LabelTableError>
    where
        I: IntoIterator<Item = (C, R)>,
        C: Into<String>,
        R: Into<String>,
    {
        let mut labels = Vec::new();
        let mut by_code = BTreeMap::new();

        for (index, (code, region)) in entries.into_iter().enumerate() {
            let code: String = code.into();
            let code = code.trim().to_ascii_uppercase();
            let region: String = region.into();
            let region = region.trim().to_string();

            let valid = (1..=2).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_uppercase());
            if !valid {
                return Err(LabelTableError::InvalidCode(code));
            }
            if region.is_empty() {
                return Err(LabelTableError::EmptyRegion(code));
            }
            if by_code.insert(code.clone(), index).is_some() {
                return Err(LabelTableError::DuplicateCode(code));
            }
            labels.push(Label {
                index,
                code,
                region,
            });
        }

        if labels.is_empty() {
            return Err(LabelTableError::Empty);
        }
        Ok(LabelTable { labels, by_code })
    }

    /// The four-entry reference configuration.
    pub fn reference() -> Self {
        LabelTable::new([
            ("DN", "Sulawesi Tengah"),
            ("DD", "Sulawesi Selatan"),
            ("B", "DKI Jakarta"),
            ("D", "Bandung"),
        ])
        .unwrap_or_else(|e| unreachable!("reference label table is valid: {e}"))
    }

    /// Parse a table from JSON: `{"labels": [{"code": "DN", "region": "..."}, ...]}`.
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let file: LabelTableFile = serde_json::from_str(text).context("parsing label table JSON")?;
        let table = LabelTable::new(file.labels.into_iter().map(|e| (e.code, e.region)))?;
        Ok(table)
    }

    /// Read and parse a JSON label table from disk.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading label table {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in label table {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index of an exact (already uppercase) code.
    pub fn index_of(&self, code: &str) -> Option<LabelIndex> {
        self.by_code.get(code).copied()
    }

    pub fn get(&self, index: LabelIndex) -> Option<&Label> {
        self.labels.get(index)
    }

    pub fn code(&self, index: LabelIndex) -> Option<&str> {
        self.get(index).map(|l| l.code.as_str())
    }

    pub fn region(&self, index: LabelIndex) -> Option<&str> {
        self.get(index).map(|l| l.region.as_str())
    }

    /// Labels in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    /// Set of prefixes accepted by the interactive validator.
    pub fn allowed_prefixes(&self) -> BTreeSet<&str> {
        self.by_code.keys().map(String::as_str).collect()
    }

    /// Comma-separated codes in index order, for user-facing diagnostics.
    pub fn describe_codes(&self) -> String {
        self.labels
            .iter()
            .map(|l| l.code.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
