//! Default locations, column names and per-tool configuration.
//!
//! Every binary runs with no arguments against the conventional project
//! layout (`../public` next to the scripts directory). The clap `Args` of each
//! binary default to these constants and are converted into the plain config
//! structs below, which is all the library ever sees.

use std::path::PathBuf;

// ============================================================================
// Default paths
// ============================================================================

pub const DEFAULT_DATA_DIR: &str = "../public";
pub const DEFAULT_CONTESTANTS: &str = "../public/contestants.csv";
pub const DEFAULT_MAIN_OUTPUT: &str = "../public/main.csv";
pub const DEFAULT_LYRICS_OUTPUT: &str = "../public/lyrics.csv";
pub const DEFAULT_DUPLICATES_OUTPUT: &str = "../public/duplicates.csv";
pub const DEFAULT_IDS_OUTPUT: &str = "../public/contestants2.csv";
pub const DEFAULT_UPDATED_OUTPUT: &str = "../public/contestants_updated.csv";
pub const DEFAULT_CACHE: &str = "/etc/contestants.json";

// ============================================================================
// Column names
// ============================================================================

pub const COL_ID: &str = "id";
pub const COL_YEAR: &str = "year";
pub const COL_COUNTRY: &str = "to_country_id";
pub const COL_PERFORMER: &str = "performer";
pub const COL_LYRICS: &str = "lyrics";
pub const COL_ENG_LYRICS: &str = "eng_lyrics";
pub const COL_YOUTUBE_URL: &str = "youtube_url";

/// Columns moved out of the main table by the splitter.
pub const LYRIC_COLUMNS: [&str; 2] = [COL_LYRICS, COL_ENG_LYRICS];

/// Column layout of the lyrics side file.
pub const LYRICS_TABLE_COLUMNS: [&str; 4] = [COL_ID, COL_YEAR, COL_LYRICS, COL_ENG_LYRICS];

/// Cell text treated as a missing value when splitting.
pub const MISSING_VALUE_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Field value of the separator row in the duplicates report.
pub const SEPARATOR_VALUE: &str = "---";

// ============================================================================
// Per-tool configuration
// ============================================================================

#[derive(Clone, Debug)]
pub struct SplitConfig {
    pub input: PathBuf,
    pub main_output: PathBuf,
    pub lyrics_output: PathBuf,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_CONTESTANTS.into(),
            main_output: DEFAULT_MAIN_OUTPUT.into(),
            lyrics_output: DEFAULT_LYRICS_OUTPUT.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DupeConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for DupeConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_CONTESTANTS.into(),
            output: DEFAULT_DUPLICATES_OUTPUT.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IdGenConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for IdGenConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_CONTESTANTS.into(),
            output: DEFAULT_IDS_OUTPUT.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MergeConfig {
    pub input: PathBuf,
    pub cache: PathBuf,
    pub output: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_CONTESTANTS.into(),
            cache: DEFAULT_CACHE.into(),
            output: DEFAULT_UPDATED_OUTPUT.into(),
        }
    }
}
