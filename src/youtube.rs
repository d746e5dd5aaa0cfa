//! Merge YouTube links from the external contestant cache into the CSV.
//!
//! The cache is a JSON document `{"cache": [{countryKey, artist, youtube}]}`.
//! Rows whose `(to_country_id, performer)` pair appears in the cache get the
//! cached value in `youtube_url`; every other row keeps an empty (or its
//! existing) value so the output stays rectangular.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::config::{MergeConfig, COL_COUNTRY, COL_PERFORMER, COL_YOUTUBE_URL};
use crate::csv_io::{self, AtomicCsvWriter};
use crate::error::{Error, Result};
use crate::models::{Headers, Row, RowWarning, WarningKind};
use crate::progress::{create_spinner, Phase};
use crate::safety::validate_output_paths;

// ============================================================================
// Cache document
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "countryKey")]
    pub country_key: String,
    pub artist: String,
    /// `null` or absent in the cache means the entry has no link yet.
    #[serde(default)]
    pub youtube: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MetadataCache {
    pub cache: Vec<CacheEntry>,
}

/// (countryKey, artist) -> youtube
pub type YoutubeLookup = FxHashMap<(String, String), String>;

pub fn parse_cache(json: &str, path: &Path) -> Result<MetadataCache> {
    serde_json::from_str(json).map_err(|e| Error::json(path, e))
}

pub fn load_cache(path: &Path) -> Result<MetadataCache> {
    let spinner = create_spinner("Loading metadata cache");
    let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let cache = parse_cache(&json, path)?;
    spinner.finish_with_message(format!("Loaded {} cache entries", cache.cache.len()));
    Ok(cache)
}

/// Builds the lookup table. Later entries replace earlier ones on key clash.
pub fn build_lookup(entries: Vec<CacheEntry>) -> YoutubeLookup {
    let mut lookup = YoutubeLookup::default();
    for entry in entries {
        lookup.insert((entry.country_key, entry.artist), entry.youtube.unwrap_or_default());
    }
    lookup
}

// ============================================================================
// Video id audit
// ============================================================================

static WATCH_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([^&?/]+)").unwrap()
});

static BARE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// Extracts the video id from a watch/short URL or a bare 11-character id.
pub fn video_id(value: &str) -> Option<&str> {
    if let Some(caps) = WATCH_URL.captures(value) {
        return caps.get(1).map(|m| m.as_str());
    }
    let trimmed = value.trim();
    BARE_ID.is_match(trimmed).then_some(trimmed)
}

// ============================================================================
// Merge
// ============================================================================

/// Rows ready to be written, plus what happened while producing them.
#[derive(Clone, Debug)]
pub struct MergedTable {
    pub headers: Headers,
    pub rows: Vec<Vec<String>>,
    pub updated: usize,
    pub warnings: Vec<RowWarning>,
}

#[derive(Clone, Debug)]
pub struct MergeReport {
    pub fieldnames: Vec<String>,
    pub rows: usize,
    pub updated: usize,
    pub unverified: usize,
    pub warnings: Vec<RowWarning>,
}

/// Output header: the input header with `youtube_url` appended if absent.
pub fn output_headers(input: &Headers) -> Headers {
    if input.contains(COL_YOUTUBE_URL) {
        input.clone()
    } else {
        Headers::new(input.iter().chain(std::iter::once(COL_YOUTUBE_URL)))
    }
}

/// Applies the lookup to every row.
///
/// Rows whose width differs from the input header are reported and still
/// emitted: values are aligned to the output header by position, extras are
/// dropped and missing cells are empty.
pub fn merge_rows(input: &Headers, rows: Vec<Row>, lookup: &YoutubeLookup) -> MergedTable {
    let headers = output_headers(input);
    let width = headers.len();
    let country_col = input.position(COL_COUNTRY);
    let performer_col = input.position(COL_PERFORMER);
    // output_headers guarantees the column exists
    let youtube_col = headers.position(COL_YOUTUBE_URL).unwrap_or(width - 1);

    let mut out = Vec::with_capacity(rows.len());
    let mut updated = 0;
    let mut warnings = Vec::new();
    let mut phase = Phase::new("Merging YouTube links", rows.len());

    for row in rows {
        if row.len() != input.len() {
            warnings.push(RowWarning::new(
                row.record,
                WarningKind::FieldCount {
                    found: row.len(),
                    expected: input.len(),
                },
            ));
        }

        let country = country_col.map(|i| row.get(i)).unwrap_or("");
        let performer = performer_col.map(|i| row.get(i)).unwrap_or("");
        let hit = lookup.get(&(country.to_string(), performer.to_string()));

        let mut cells = row.cells;
        cells.resize(width, String::new());

        if let Some(url) = hit {
            if !url.is_empty() && video_id(url).is_none() {
                warnings.push(RowWarning::new(row.record, WarningKind::NoVideoId(url.clone())));
            }
            cells[youtube_col] = url.clone();
            updated += 1;
        }

        out.push(cells);
        phase.inc();
    }
    phase.finish(format!("{} rows updated", updated));

    MergedTable {
        headers,
        rows: out,
        updated,
        warnings,
    }
}

/// Loads the cache, merges it into `config.input` and writes `config.output`.
///
/// Nothing is written when the CSV or cache is missing, the cache is not
/// valid JSON, or the CSV is structurally broken.
pub fn update_csv_with_json(config: &MergeConfig) -> Result<MergeReport> {
    validate_output_paths(&[&config.output], &[&config.input, &config.cache])?;

    let cache = load_cache(&config.cache)?;
    let lookup = build_lookup(cache.cache);

    let (headers, reader) = csv_io::open(&config.input)?;
    let rows = csv_io::read_all_strict(reader)?;
    let row_count = rows.len();
    let merged = merge_rows(&headers, rows, &lookup);

    let mut writer = AtomicCsvWriter::new(&config.output)?;
    writer.write_record(merged.headers.iter())?;
    for cells in &merged.rows {
        writer.write_record(cells)?;
    }
    writer.finish()?;

    let unverified = merged
        .warnings
        .iter()
        .filter(|w| matches!(w.kind, WarningKind::NoVideoId(_)))
        .count();

    Ok(MergeReport {
        fieldnames: headers.names().to_vec(),
        rows: row_count,
        updated: merged.updated,
        unverified,
        warnings: merged.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CACHE: &str = r#"{"cache": [
        {"countryKey": "IT", "artist": "X", "youtube": "https://www.youtube.com/watch?v=abcdefghijk"},
        {"countryKey": "SE", "artist": "Loreen", "youtube": "old"},
        {"countryKey": "SE", "artist": "Loreen", "youtube": "https://youtu.be/Pfo-8z86x80", "extra": 1}
    ]}"#;

    fn lookup() -> YoutubeLookup {
        build_lookup(parse_cache(CACHE, Path::new("c.json")).unwrap().cache)
    }

    fn row(record: u64, cells: &[&str]) -> Row {
        Row::new(record, cells.iter().map(|c| c.to_string()).collect())
    }

    fn config(dir: &TempDir) -> MergeConfig {
        MergeConfig {
            input: dir.path().join("contestants.csv"),
            cache: dir.path().join("contestants.json"),
            output: dir.path().join("out").join("contestants_updated.csv"),
        }
    }

    #[test]
    fn test_last_write_wins() {
        let l = lookup();
        assert_eq!(
            l.get(&("SE".to_string(), "Loreen".to_string())).map(String::as_str),
            Some("https://youtu.be/Pfo-8z86x80")
        );
        assert_eq!(l.len(), 2);
    }

    #[test]
    fn test_video_id() {
        assert_eq!(video_id("https://www.youtube.com/watch?v=abc123&t=4"), Some("abc123"));
        assert_eq!(video_id("https://youtu.be/Pfo-8z86x80"), Some("Pfo-8z86x80"));
        assert_eq!(video_id("Pfo-8z86x80"), Some("Pfo-8z86x80"));
        assert_eq!(video_id("old"), None);
        assert_eq!(video_id(""), None);
    }

    #[test]
    fn test_hit_and_miss() {
        let headers = Headers::new(["to_country_id", "performer"]);
        let merged = merge_rows(
            &headers,
            vec![row(2, &["IT", "X"]), row(3, &["FR", "Y"])],
            &lookup(),
        );
        assert_eq!(merged.headers.names(), &["to_country_id", "performer", "youtube_url"]);
        assert_eq!(merged.rows[0][2], "https://www.youtube.com/watch?v=abcdefghijk");
        assert_eq!(merged.rows[1][2], "");
        assert_eq!(merged.updated, 1);
        assert!(merged.warnings.is_empty());
    }

    #[test]
    fn test_existing_column_overwritten_or_kept() {
        let headers = Headers::new(["youtube_url", "to_country_id", "performer"]);
        let merged = merge_rows(
            &headers,
            vec![row(2, &["stale", "IT", "X"]), row(3, &["keep", "FR", "Y"])],
            &lookup(),
        );
        assert_eq!(merged.headers.len(), 3);
        assert_eq!(merged.rows[0][0], "https://www.youtube.com/watch?v=abcdefghijk");
        assert_eq!(merged.rows[1][0], "keep");
    }

    #[test]
    fn test_short_row_warns_with_row_number() {
        let headers = Headers::new(["year", "to_country_id", "performer"]);
        let merged = merge_rows(
            &headers,
            vec![row(2, &["2020", "IT", "X"]), row(3, &["2021", "FR"])],
            &lookup(),
        );
        assert_eq!(merged.warnings.len(), 1);
        assert_eq!(merged.warnings[0].to_string(), "Row 3 has 2 fields, expected 3");
        assert_eq!(merged.rows[1], vec!["2021", "FR", "", ""]);
    }

    #[test]
    fn test_unverifiable_value_warns() {
        let mut l = YoutubeLookup::default();
        l.insert(("IT".into(), "X".into()), "not a link".into());
        let headers = Headers::new(["to_country_id", "performer"]);
        let merged = merge_rows(&headers, vec![row(2, &["IT", "X"])], &l);
        assert_eq!(merged.updated, 1);
        assert!(matches!(merged.warnings[0].kind, WarningKind::NoVideoId(_)));
    }

    #[test]
    fn test_update_end_to_end_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        fs::write(&cfg.cache, CACHE).unwrap();
        fs::write(&cfg.input, "year,to_country_id,performer\n2020,IT,X\n2020,FR,Y\n").unwrap();

        let report = update_csv_with_json(&cfg).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.rows, 2);
        assert_eq!(report.fieldnames, vec!["year", "to_country_id", "performer"]);
        let first = fs::read(&cfg.output).unwrap();

        update_csv_with_json(&cfg).unwrap();
        assert_eq!(fs::read(&cfg.output).unwrap(), first);

        let text = String::from_utf8(first).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "year,to_country_id,performer,youtube_url",
                "2020,IT,X,https://www.youtube.com/watch?v=abcdefghijk",
                "2020,FR,Y,",
            ]
        );
    }

    #[test]
    fn test_null_link_in_cache() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        fs::write(
            &cfg.cache,
            r#"{"cache": [
                {"countryKey": "IT", "artist": "X", "youtube": null},
                {"countryKey": "FR", "artist": "Y", "youtube": "u2"},
                {"countryKey": "SE", "artist": "Z"}
            ]}"#,
        )
        .unwrap();
        fs::write(&cfg.input, "to_country_id,performer,youtube_url\nIT,X,stale\nFR,Y,\nSE,Z,\n").unwrap();

        let report = update_csv_with_json(&cfg).unwrap();
        assert_eq!(report.updated, 3);
        assert_eq!(report.unverified, 1);

        let text = fs::read_to_string(&cfg.output).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec!["to_country_id,performer,youtube_url", "IT,X,", "FR,Y,u2", "SE,Z,"]
        );
    }

    #[test]
    fn test_blank_line_kept_as_empty_row() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        fs::write(&cfg.cache, CACHE).unwrap();
        fs::write(&cfg.input, "year,to_country_id,performer\n2020,IT,X\n\n2021,FR\n").unwrap();

        let report = update_csv_with_json(&cfg).unwrap();
        assert_eq!(report.rows, 3);
        let messages: Vec<String> = report.warnings.iter().map(|w| w.to_string()).collect();
        assert_eq!(
            messages,
            vec!["Row 3 has 0 fields, expected 3", "Row 4 has 2 fields, expected 3"]
        );

        let text = fs::read_to_string(&cfg.output).unwrap();
        assert_eq!(text.lines().nth(2), Some(",,,"));
    }

    #[test]
    fn test_missing_json() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        fs::write(&cfg.input, "to_country_id,performer\nIT,X\n").unwrap();
        let err = update_csv_with_json(&cfg).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { ref path } if *path == cfg.cache));
        assert!(!cfg.output.exists());
    }

    #[test]
    fn test_missing_csv() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        fs::write(&cfg.cache, CACHE).unwrap();
        let err = update_csv_with_json(&cfg).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { ref path } if *path == cfg.input));
    }

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        fs::write(&cfg.cache, "{\"cache\": [").unwrap();
        fs::write(&cfg.input, "to_country_id,performer\nIT,X\n").unwrap();
        let err = update_csv_with_json(&cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidJson { .. }));
        assert!(err.to_string().starts_with("Invalid JSON file - "));
        assert!(!cfg.output.exists());
    }

    #[test]
    fn test_wrong_cache_shape() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        fs::write(&cfg.cache, r#"{"entries": []}"#).unwrap();
        fs::write(&cfg.input, "to_country_id,performer\nIT,X\n").unwrap();
        let err = update_csv_with_json(&cfg).unwrap_err();
        assert!(matches!(err, Error::CacheFormat { .. }));
    }

    #[test]
    fn test_empty_csv() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        fs::write(&cfg.cache, CACHE).unwrap();
        fs::write(&cfg.input, "").unwrap();
        let err = update_csv_with_json(&cfg).unwrap_err();
        assert!(matches!(err, Error::EmptyInput { .. }));
    }
}
