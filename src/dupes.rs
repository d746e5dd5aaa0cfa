//! Duplicate detection over (year, to_country_id, performer).
//!
//! Rows sharing a composite key are written to a review report: the original
//! rows, a `---` separator row, a composite row holding the first non-empty
//! value of each column, and a blank row. Keys seen only once are left out.

use rustc_hash::FxHashMap;

use crate::config::{DupeConfig, SEPARATOR_VALUE};
use crate::csv_io::{self, AtomicCsvWriter, RowEvent};
use crate::error::{Error, Result};
use crate::models::{CompositeKey, ContestEntry, EntryColumns, Row, RowWarning, WarningKind};
use crate::progress::Phase;
use crate::safety::validate_output_paths;

/// Index mapping a composite key to its position in the group list.
pub type GroupIndex = FxHashMap<CompositeKey, usize>;

/// Rows sharing one composite key, in encounter order.
#[derive(Clone, Debug)]
pub struct DuplicateGroup {
    pub key: CompositeKey,
    pub rows: Vec<Row>,
}

impl DuplicateGroup {
    pub fn is_duplicate(&self) -> bool {
        self.rows.len() > 1
    }

    /// First non-empty value of each column across the group, `""` if none.
    pub fn composite(&self, width: usize) -> Vec<String> {
        (0..width)
            .map(|col| {
                self.rows
                    .iter()
                    .map(|row| row.get(col))
                    .find(|value| !value.is_empty())
                    .unwrap_or("")
                    .to_string()
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct DupeReport {
    pub groups: usize,
    pub duplicate_rows: usize,
    pub warnings: Vec<RowWarning>,
}

/// Groups rows by composite key, keeping first-seen group order.
pub fn group_rows(rows: Vec<Row>, columns: EntryColumns) -> Vec<DuplicateGroup> {
    let mut index = GroupIndex::default();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for row in rows {
        let key = ContestEntry::new(&row, columns).key();
        match index.get(&key) {
            Some(&idx) => groups[idx].rows.push(row),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(DuplicateGroup {
                    key,
                    rows: vec![row],
                });
            }
        }
    }

    groups
}

/// Groups of more than one row, in first-seen order.
pub fn find_duplicates(rows: Vec<Row>, columns: EntryColumns) -> Vec<DuplicateGroup> {
    group_rows(rows, columns)
        .into_iter()
        .filter(DuplicateGroup::is_duplicate)
        .collect()
}

/// Writes `duplicates.csv` for `config.input` and returns the group count.
pub fn identify_duplicates(config: &DupeConfig) -> Result<DupeReport> {
    validate_output_paths(&[&config.output], &[&config.input])?;

    let (headers, reader) = csv_io::open(&config.input)?;
    let columns = EntryColumns::resolve(&headers, &config.input)?;
    let width = headers.len();

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    for event in reader {
        match event? {
            RowEvent::Row(mut row) => {
                if row.len() > width {
                    warnings.push(RowWarning::new(
                        row.record,
                        WarningKind::FieldCount {
                            found: row.len(),
                            expected: width,
                        },
                    ));
                }
                row.fit_to(width);
                rows.push(row);
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
            RowEvent::Unreadable { error, .. } => return Err(Error::Csv(error)),
        }
    }

    let duplicates = find_duplicates(rows, columns);

    let mut writer = AtomicCsvWriter::new(&config.output)?;
    writer.write_record(headers.iter())?;

    let mut phase = Phase::new("Writing duplicate sets", duplicates.len());
    let mut duplicate_rows = 0;
    for group in &duplicates {
        for row in &group.rows {
            writer.write_record(&row.cells)?;
        }
        duplicate_rows += group.rows.len();
        writer.write_filled(SEPARATOR_VALUE, width)?;
        writer.write_record(group.composite(width))?;
        writer.write_filled("", width)?;
        phase.inc();
    }
    writer.finish()?;
    phase.finish(format!("Wrote {} duplicate sets", duplicates.len()));

    Ok(DupeReport {
        groups: duplicates.len(),
        duplicate_rows,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Headers;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const HEADER: [&str; 4] = ["year", "to_country_id", "performer", "note"];

    fn rows(data: &[[&str; 4]]) -> Vec<Row> {
        data.iter()
            .enumerate()
            .map(|(i, r)| Row::new(i as u64 + 2, r.iter().map(|c| c.to_string()).collect()))
            .collect()
    }

    fn columns() -> EntryColumns {
        EntryColumns::resolve(&Headers::new(HEADER), Path::new("in.csv")).unwrap()
    }

    #[test]
    fn test_grouping_by_composite_key() {
        let groups = find_duplicates(
            rows(&[
                ["2020", "it", "X", "a"],
                ["2020", "fr", "Y", "b"],
                ["2020", "it", "X", "c"],
                ["2021", "it", "X", "d"],
                ["2020", "fr", "Y", "e"],
            ]),
            columns(),
        );

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key.country, "it");
        assert_eq!(groups[0].rows.iter().map(|r| r.record).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(groups[1].key.performer, "Y");
        assert_eq!(groups[1].rows.iter().map(|r| r.record).collect::<Vec<_>>(), vec![3, 6]);
    }

    #[test]
    fn test_singletons_excluded() {
        let groups = find_duplicates(
            rows(&[["2020", "it", "X", ""], ["2020", "it", "x", ""]]),
            columns(),
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn test_composite_first_non_empty() {
        let group = DuplicateGroup {
            key: CompositeKey {
                year: "2020".into(),
                country: "it".into(),
                performer: "X".into(),
            },
            rows: rows(&[["2020", "it", "X", ""], ["2020", "it", "X", "hi"], ["2020", "it", "X", "later"]]),
        };
        assert_eq!(group.composite(4), vec!["2020", "it", "X", "hi"]);
    }

    #[test]
    fn test_composite_all_empty() {
        let group = DuplicateGroup {
            key: CompositeKey {
                year: "2020".into(),
                country: "it".into(),
                performer: "X".into(),
            },
            rows: rows(&[["2020", "it", "X", ""], ["2020", "it", "X", ""]]),
        };
        assert_eq!(group.composite(4)[3], "");
    }

    #[test]
    fn test_report_layout() {
        let temp_dir = TempDir::new().unwrap();
        let config = DupeConfig {
            input: temp_dir.path().join("contestants.csv"),
            output: temp_dir.path().join("duplicates.csv"),
        };
        fs::write(
            &config.input,
            "year,to_country_id,performer,note\n\
             2020,it,X,\n\
             2019,fr,Z,solo\n\
             2020,it,X,hi\n",
        )
        .unwrap();

        let report = identify_duplicates(&config).unwrap();
        assert_eq!(report.groups, 1);
        assert_eq!(report.duplicate_rows, 2);

        let content = fs::read_to_string(&config.output).unwrap();
        assert_eq!(
            content.lines().collect::<Vec<_>>(),
            vec![
                "year,to_country_id,performer,note",
                "2020,it,X,",
                "2020,it,X,hi",
                "---,---,---,---",
                "2020,it,X,hi",
                ",,,",
            ]
        );
    }

    #[test]
    fn test_blank_line_skipped_with_warning() {
        let temp_dir = TempDir::new().unwrap();
        let config = DupeConfig {
            input: temp_dir.path().join("contestants.csv"),
            output: temp_dir.path().join("duplicates.csv"),
        };
        fs::write(&config.input, "year,to_country_id,performer\n2020,it,X\n\n2020,it,X\n").unwrap();

        let report = identify_duplicates(&config).unwrap();
        assert_eq!(report.groups, 1);
        assert_eq!(report.duplicate_rows, 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].to_string(), "Row 3 has 0 fields, expected 3");
    }

    #[test]
    fn test_no_duplicates_writes_header_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = DupeConfig {
            input: temp_dir.path().join("contestants.csv"),
            output: temp_dir.path().join("duplicates.csv"),
        };
        fs::write(&config.input, "year,to_country_id,performer\n2020,it,X\n").unwrap();

        let report = identify_duplicates(&config).unwrap();
        assert_eq!(report.groups, 0);
        assert_eq!(
            fs::read_to_string(&config.output).unwrap().trim_end(),
            "year,to_country_id,performer"
        );
    }

    #[test]
    fn test_missing_key_column() {
        let temp_dir = TempDir::new().unwrap();
        let config = DupeConfig {
            input: temp_dir.path().join("contestants.csv"),
            output: temp_dir.path().join("duplicates.csv"),
        };
        fs::write(&config.input, "year,performer\n2020,X\n").unwrap();

        let err = identify_duplicates(&config).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
        assert!(!config.output.exists());
    }
}
