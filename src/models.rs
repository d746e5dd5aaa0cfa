//! Core data models for the contestant dataset.
//!
//! Rows are kept as ordered cell vectors aligned to [`Headers`]. Only the
//! handful of fields the tools interpret get a typed accessor
//! ([`ContestEntry`]); every other column is opaque pass-through text.

use std::fmt;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::config::{COL_COUNTRY, COL_PERFORMER, COL_YEAR};
use crate::error::{Error, Result};

// ============================================================================
// Headers
// ============================================================================

/// Ordered column names with a name -> position index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl Headers {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = FxHashMap::default();
        for (i, name) in names.iter().enumerate() {
            // First occurrence wins for duplicated column names
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a column the caller cannot work without.
    pub fn require(&self, name: &str, path: &Path) -> Result<usize> {
        self.position(name).ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
            path: path.to_path_buf(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

// ============================================================================
// Rows
// ============================================================================

/// One data record. `record` is the 1-based record number in the source
/// file, counting the header as record 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub record: u64,
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(record: u64, cells: Vec<String>) -> Self {
        Self { record, cells }
    }

    /// Cell at `idx`, or `""` when the row is shorter than the header.
    pub fn get(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Pads with empty cells or truncates so the row has exactly `width` cells.
    pub fn fit_to(&mut self, width: usize) {
        self.cells.resize(width, String::new());
    }
}

/// Headers plus rows in file order.
#[derive(Clone, Debug, Default)]
pub struct Table {
    pub headers: Headers,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Headers, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    pub fn shape(&self) -> Shape {
        Shape {
            rows: self.rows.len(),
            columns: self.headers.len(),
        }
    }
}

/// `(rows, columns)` dimensions printed for operator verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.rows, self.columns)
    }
}

// ============================================================================
// Typed accessors
// ============================================================================

/// Column positions of the interpreted fields, resolved once per file.
#[derive(Clone, Copy, Debug)]
pub struct EntryColumns {
    pub year: usize,
    pub country: usize,
    pub performer: usize,
}

impl EntryColumns {
    pub fn resolve(headers: &Headers, path: &Path) -> Result<Self> {
        Ok(Self {
            year: headers.require(COL_YEAR, path)?,
            country: headers.require(COL_COUNTRY, path)?,
            performer: headers.require(COL_PERFORMER, path)?,
        })
    }
}

/// Typed view over a row for the fields the tools actually read.
#[derive(Clone, Copy, Debug)]
pub struct ContestEntry<'a> {
    row: &'a Row,
    columns: EntryColumns,
}

impl<'a> ContestEntry<'a> {
    pub fn new(row: &'a Row, columns: EntryColumns) -> Self {
        Self { row, columns }
    }

    pub fn year(&self) -> &'a str {
        self.row.get(self.columns.year)
    }

    pub fn country(&self) -> &'a str {
        self.row.get(self.columns.country)
    }

    pub fn performer(&self) -> &'a str {
        self.row.get(self.columns.performer)
    }

    /// (year, country code, performer)
    pub fn key(&self) -> CompositeKey {
        CompositeKey {
            year: self.year().to_string(),
            country: self.country().to_string(),
            performer: self.performer().to_string(),
        }
    }
}

/// Natural key of a contest entry. Equal keys mean duplicate entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    pub year: String,
    pub country: String,
    pub performer: String,
}

// ============================================================================
// Row-level warnings
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// Field count differs from the header width.
    FieldCount { found: usize, expected: usize },
    /// Line could not be decoded and was skipped.
    Unreadable(String),
    /// Merged YouTube value carries no recognizable video id.
    NoVideoId(String),
}

/// A non-fatal problem tied to one record of the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowWarning {
    pub record: u64,
    pub kind: WarningKind,
}

impl RowWarning {
    pub fn new(record: u64, kind: WarningKind) -> Self {
        Self { record, kind }
    }
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::FieldCount { found, expected } => write!(
                f,
                "Row {} has {} fields, expected {}",
                self.record, found, expected
            ),
            WarningKind::Unreadable(reason) => {
                write!(f, "Skipping row {}: {}", self.record, reason)
            }
            WarningKind::NoVideoId(value) => write!(
                f,
                "Row {} youtube value '{}' has no extractable video id",
                self.record, value
            ),
        }
    }
}
