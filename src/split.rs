//! Column splitter: moves the large lyric columns into a side file.
//!
//! The main table keeps every column except `lyrics` and `eng_lyrics`; the
//! lyrics table holds `id, year, lyrics, eng_lyrics`. Both keep input row
//! order and render missing values as empty strings.

use std::path::Path;

use crate::config::{SplitConfig, LYRICS_TABLE_COLUMNS, LYRIC_COLUMNS, MISSING_VALUE_MARKERS};
use crate::csv_io::{self, AtomicCsvWriter, RowEvent, StagedOutput};
use crate::error::Result;
use crate::models::{Headers, Row, RowWarning, Shape, Table, WarningKind};
use crate::progress::Phase;
use crate::safety::validate_output_paths;

/// The two tables produced from one input.
#[derive(Clone, Debug)]
pub struct SplitTables {
    pub main: Table,
    pub lyrics: Table,
}

#[derive(Clone, Debug)]
pub struct SplitReport {
    pub input_shape: Shape,
    pub main_shape: Shape,
    pub lyrics_shape: Shape,
    pub warnings: Vec<RowWarning>,
}

pub fn is_missing(value: &str) -> bool {
    MISSING_VALUE_MARKERS.contains(&value)
}

fn fill_missing(value: &str) -> String {
    if is_missing(value) {
        String::new()
    } else {
        value.to_string()
    }
}

/// Reads the input, skipping blank lines and lines that are wider than the
/// header or undecodable. Short lines are padded with empty cells.
pub fn read_lenient(path: &Path) -> Result<(Table, Vec<RowWarning>)> {
    let (headers, rows) = csv_io::open(path)?;
    let width = headers.len();
    let mut table_rows = Vec::new();
    let mut warnings = Vec::new();

    for event in rows {
        match event? {
            RowEvent::Row(mut row) => {
                if row.len() > width {
                    warnings.push(RowWarning::new(
                        row.record,
                        WarningKind::Unreadable(format!(
                            "expected {} fields, saw {}",
                            width,
                            row.len()
                        )),
                    ));
                    continue;
                }
                row.fit_to(width);
                table_rows.push(row);
            }
            RowEvent::Blank { record } => {
                warnings.push(RowWarning::new(
                    record,
                    WarningKind::FieldCount {
                        found: 0,
                        expected: width,
                    },
                ));
            }
            RowEvent::Unreadable { record, error } => {
                warnings.push(RowWarning::new(
                    record,
                    WarningKind::Unreadable(error.to_string()),
                ));
            }
        }
    }

    Ok((Table::new(headers, table_rows), warnings))
}

fn project(row: &Row, columns: &[usize]) -> Row {
    let cells = columns.iter().map(|&i| fill_missing(row.get(i))).collect();
    Row::new(row.record, cells)
}

/// Partitions a table into the main and lyrics tables.
///
/// Fails when any column of the lyrics layout is absent from the input.
pub fn split_table(table: &Table, path: &Path) -> Result<SplitTables> {
    let lyrics_columns = LYRICS_TABLE_COLUMNS
        .iter()
        .map(|name| table.headers.require(name, path))
        .collect::<Result<Vec<usize>>>()?;

    let main_columns: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !LYRIC_COLUMNS.contains(name))
        .map(|(i, _)| i)
        .collect();

    let main_headers = Headers::new(main_columns.iter().map(|&i| table.headers.names()[i].clone()));
    let lyrics_headers = Headers::new(LYRICS_TABLE_COLUMNS);

    let mut phase = Phase::new("Splitting columns", table.rows.len());
    let mut main_rows = Vec::with_capacity(table.rows.len());
    let mut lyrics_rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        main_rows.push(project(row, &main_columns));
        lyrics_rows.push(project(row, &lyrics_columns));
        phase.inc();
    }
    phase.finish(format!("Split {} rows", table.rows.len()));

    Ok(SplitTables {
        main: Table::new(main_headers, main_rows),
        lyrics: Table::new(lyrics_headers, lyrics_rows),
    })
}

fn stage_table(table: &Table, path: &Path) -> Result<StagedOutput> {
    let mut writer = AtomicCsvWriter::new(path)?;
    writer.write_record(table.headers.iter())?;
    for row in &table.rows {
        writer.write_record(&row.cells)?;
    }
    writer.stage()
}

/// Splits `config.input` into the main and lyrics files.
///
/// Both outputs are fully written before either replaces its destination. If
/// the second cannot be put in place, the first destination is restored.
pub fn split_eurovision_csv(config: &SplitConfig) -> Result<SplitReport> {
    validate_output_paths(
        &[&config.main_output, &config.lyrics_output],
        &[&config.input],
    )?;

    let (table, warnings) = read_lenient(&config.input)?;
    let tables = split_table(&table, &config.input)?;

    let main = stage_table(&tables.main, &config.main_output)?;
    let lyrics = stage_table(&tables.lyrics, &config.lyrics_output)?;
    csv_io::persist_all(vec![main, lyrics])?;

    Ok(SplitReport {
        input_shape: table.shape(),
        main_shape: tables.main.shape(),
        lyrics_shape: tables.lyrics.shape(),
        warnings,
    })
}
