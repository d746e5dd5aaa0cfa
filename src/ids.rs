//! Three-character row identifiers.
//!
//! Codes enumerate the Cartesian product of `a..z` followed by `0..9`, taken
//! three at a time: `aaa, aab, ..., aa9, aba, ..., 999`. Row N of the input
//! always receives code N, so output depends only on row order. Blank lines
//! carry no data; they are dropped with a warning and take no code.

use crate::config::{IdGenConfig, COL_ID};
use crate::csv_io::{self, AtomicCsvWriter, RowEvent};
use crate::error::{Error, Result};
use crate::models::{RowWarning, WarningKind};
use crate::progress::Phase;
use crate::safety::validate_output_paths;

pub const ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const CODE_LEN: u32 = 3;
pub const CAPACITY: usize = 36 * 36 * 36;

/// Code at position `index` of the enumeration, `None` past the end.
pub fn code_at(index: usize) -> Option<String> {
    if index >= CAPACITY {
        return None;
    }
    let base = ALPHABET.len();
    let code: String = (0..CODE_LEN)
        .rev()
        .map(|pos| {
            let digit = (index / base.pow(pos)) % base;
            ALPHABET[digit] as char
        })
        .collect();
    Some(code)
}

/// Iterator over the whole code space, in enumeration order.
#[derive(Clone, Debug, Default)]
pub struct CodeSpace {
    next: usize,
}

impl CodeSpace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Iterator for CodeSpace {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let code = code_at(self.next)?;
        self.next += 1;
        Some(code)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = CAPACITY.saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for CodeSpace {}

#[derive(Clone, Debug)]
pub struct IdGenReport {
    pub rows: usize,
    pub last_code: Option<String>,
    pub warnings: Vec<RowWarning>,
}

/// Writes a copy of `config.input` with an `id` column prepended.
///
/// Fails without writing anything when the input has more rows than codes.
pub fn add_id_to_csv(config: &IdGenConfig) -> Result<IdGenReport> {
    validate_output_paths(&[&config.output], &[&config.input])?;

    let (headers, reader) = csv_io::open(&config.input)?;
    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    for event in reader {
        match event? {
            RowEvent::Row(row) => rows.push(row),
            RowEvent::Blank { record } => warnings.push(RowWarning::new(
                record,
                WarningKind::FieldCount {
                    found: 0,
                    expected: headers.len(),
                },
            )),
            RowEvent::Unreadable { error, .. } => return Err(Error::Csv(error)),
        }
    }
    if rows.len() > CAPACITY {
        return Err(Error::CodeSpaceExhausted {
            rows: rows.len(),
            capacity: CAPACITY,
        });
    }

    let mut writer = AtomicCsvWriter::new(&config.output)?;
    writer.write_record(std::iter::once(COL_ID).chain(headers.iter()))?;

    let mut codes = CodeSpace::new();
    let mut last_code = None;
    let mut phase = Phase::new("Assigning ids", rows.len());
    for row in &rows {
        let code = codes.next().ok_or(Error::CodeSpaceExhausted {
            rows: rows.len(),
            capacity: CAPACITY,
        })?;
        writer.write_record(std::iter::once(code.as_str()).chain(row.cells.iter().map(String::as_str)))?;
        last_code = Some(code);
        phase.inc();
    }
    writer.finish()?;
    phase.finish(format!("Assigned {} ids", rows.len()));

    Ok(IdGenReport {
        rows: rows.len(),
        last_code,
        warnings,
    })
}
