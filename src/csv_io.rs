//! CSV reading and atomic CSV writing.
//!
//! Reading is lazy and tolerant: [`RowReader`] yields a row, a blank line or
//! an unreadable record without halting, and each tool decides what to do
//! with the last two. Writing goes through [`AtomicCsvWriter`], which stages
//! output in a temporary file beside the destination and only replaces the
//! destination once everything has been written.

use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Read};
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord, Terminator, Writer, WriterBuilder};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::models::{Headers, Row};

// ============================================================================
// Reading
// ============================================================================

/// Item produced by [`RowReader`].
#[derive(Debug)]
pub enum RowEvent {
    Row(Row),
    /// Empty line. The csv parser drops these, but they still occupy a
    /// record number.
    Blank { record: u64 },
    /// Record that could not be decoded. The reader has moved past it.
    Unreadable { record: u64, error: csv::Error },
}

/// Parsed record waiting behind the blank lines that preceded it.
#[derive(Debug)]
enum Pending {
    Cells(Vec<String>),
    Unreadable(csv::Error),
}

/// Lazy iterator over data records, numbered from 2 (the header is record 1).
///
/// The whole file is held in memory so blank lines skipped by the parser can
/// be recovered from the bytes it consumed. I/O failures end the iteration
/// with an `Err`; everything else is reported as a [`RowEvent`].
pub struct RowReader {
    inner: Reader<Cursor<Vec<u8>>>,
    record: u64,
    consumed: u64,
    blanks: u64,
    pending: Option<Pending>,
    done: bool,
}

/// Counts the empty lines at the start of `data[start..end]`.
///
/// A leading `\n` completing a `\r\n` terminator of the previous record is
/// not a line of its own.
fn leading_blank_lines(data: &[u8], start: usize, end: usize) -> u64 {
    let span = &data[start.min(data.len())..end.min(data.len())];
    let mut i = 0;
    if start > 0 && data.get(start - 1) == Some(&b'\r') && span.first() == Some(&b'\n') {
        i = 1;
    }

    let mut lines = 0;
    while i < span.len() {
        match span[i] {
            b'\n' => i += 1,
            b'\r' => {
                i += 1;
                if span.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            _ => break,
        }
        lines += 1;
    }
    lines
}

impl RowReader {
    fn new(inner: Reader<Cursor<Vec<u8>>>) -> Self {
        let consumed = inner.position().byte();
        Self {
            inner,
            record: 1,
            consumed,
            blanks: 0,
            pending: None,
            done: false,
        }
    }

    /// Reads the next record and queues it behind any blank lines before it.
    fn fill(&mut self) -> Option<Error> {
        let start = self.consumed as usize;
        let mut record = StringRecord::new();
        let result = self.inner.read_record(&mut record);
        self.consumed = self.inner.position().byte();

        match result {
            Err(error) if error.is_io_error() => {
                self.done = true;
                return Some(Error::Csv(error));
            }
            Ok(false) => self.done = true,
            Ok(true) => {
                self.pending = Some(Pending::Cells(record.iter().map(str::to_string).collect()));
            }
            Err(error) => self.pending = Some(Pending::Unreadable(error)),
        }

        let data = self.inner.get_ref().get_ref();
        self.blanks = leading_blank_lines(data, start, self.consumed as usize);
        None
    }
}

impl Iterator for RowReader {
    type Item = Result<RowEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.blanks == 0 && self.pending.is_none() {
            if self.done {
                return None;
            }
            if let Some(err) = self.fill() {
                return Some(Err(err));
            }
        }

        if self.blanks > 0 {
            self.blanks -= 1;
            self.record += 1;
            return Some(Ok(RowEvent::Blank {
                record: self.record,
            }));
        }

        let pending = self.pending.take()?;
        self.record += 1;
        Some(Ok(match pending {
            Pending::Cells(cells) => RowEvent::Row(Row::new(self.record, cells)),
            Pending::Unreadable(error) => RowEvent::Unreadable {
                record: self.record,
                error,
            },
        }))
    }
}

/// Builds a flexible reader (rows may differ in width from the header).
pub fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.flexible(true).has_headers(true);
    builder
}

/// Opens a CSV file and reads its header row.
///
/// Fails with [`Error::FileNotFound`] when the file is absent and with
/// [`Error::EmptyInput`] when there is no header row.
pub fn open(path: &Path) -> Result<(Headers, RowReader)> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    from_reader(file, path)
}

/// Same as [`open`] over any reader. `path` is only used in error messages.
pub fn from_reader<R: Read>(mut rdr: R, path: &Path) -> Result<(Headers, RowReader)> {
    let mut data = Vec::new();
    rdr.read_to_end(&mut data).map_err(|e| Error::io(path, e))?;

    let mut reader = reader_builder().from_reader(Cursor::new(data));
    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Err(Error::EmptyInput {
            path: path.to_path_buf(),
        });
    }
    Ok((Headers::new(header.iter()), RowReader::new(reader)))
}

/// Reads every row, aborting on the first unreadable record. Blank lines
/// come back as rows with no cells so callers can report them by number.
pub fn read_all_strict(rows: RowReader) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    for event in rows {
        match event? {
            RowEvent::Row(row) => out.push(row),
            RowEvent::Blank { record } => out.push(Row::new(record, Vec::new())),
            RowEvent::Unreadable { error, .. } => return Err(Error::Csv(error)),
        }
    }
    Ok(out)
}

// ============================================================================
// Writing
// ============================================================================

/// CSV writer that only replaces its destination on success.
///
/// Dropping the writer (or a [`StagedOutput`]) without persisting deletes
/// the temporary file, so a failed run never leaves a truncated output.
pub struct AtomicCsvWriter {
    writer: Writer<BufWriter<NamedTempFile>>,
    final_path: PathBuf,
}

impl AtomicCsvWriter {
    /// Creates the destination directory if needed and a temporary file in it.
    pub fn new(final_path: impl AsRef<Path>) -> Result<Self> {
        let final_path = final_path.as_ref().to_path_buf();

        let parent_dir = match final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent_dir).map_err(|e| Error::io(&parent_dir, e))?;

        let temp_file = NamedTempFile::new_in(&parent_dir).map_err(|e| Error::io(&parent_dir, e))?;

        let writer = WriterBuilder::new()
            .flexible(true)
            .terminator(Terminator::CRLF)
            .from_writer(BufWriter::new(temp_file));

        Ok(Self { writer, final_path })
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(record)?;
        Ok(())
    }

    /// Writes a record with every one of `width` fields set to `value`.
    pub fn write_filled(&mut self, value: &str, width: usize) -> Result<()> {
        self.write_record(std::iter::repeat(value).take(width))
    }

    /// Flushes everything to the temporary file without touching the
    /// destination.
    pub fn stage(self) -> Result<StagedOutput> {
        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| Error::io(&self.final_path, e.into_error()))?;

        let temp = buf_writer
            .into_inner()
            .map_err(|e| Error::io(&self.final_path, e.into_error()))?;

        Ok(StagedOutput {
            temp,
            final_path: self.final_path,
        })
    }

    /// Stages and persists in one step.
    pub fn finish(self) -> Result<PathBuf> {
        self.stage()?.persist()
    }
}

/// Fully written output waiting to replace its destination.
pub struct StagedOutput {
    temp: NamedTempFile,
    final_path: PathBuf,
}

impl StagedOutput {
    pub fn persist(self) -> Result<PathBuf> {
        self.temp
            .persist(&self.final_path)
            .map_err(|e| Error::io(&self.final_path, e.error))?;
        Ok(self.final_path)
    }

    /// Copies the current destination (if any) aside so it can be restored.
    fn backup(&self) -> Result<Option<NamedTempFile>> {
        if !self.final_path.is_file() {
            return Ok(None);
        }
        let dir = self.temp.path().parent().unwrap_or_else(|| Path::new("."));
        let backup = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        fs::copy(&self.final_path, backup.path()).map_err(|e| Error::io(&self.final_path, e))?;
        Ok(Some(backup))
    }
}

/// Persists several outputs as a group.
///
/// If any destination cannot be replaced, the ones already replaced get their
/// previous contents back (or are removed when they did not exist before).
pub fn persist_all(outputs: Vec<StagedOutput>) -> Result<Vec<PathBuf>> {
    let mut done: Vec<(PathBuf, Option<NamedTempFile>)> = Vec::with_capacity(outputs.len());

    for output in outputs {
        let backup = output.backup()?;
        match output.persist() {
            Ok(path) => done.push((path, backup)),
            Err(err) => {
                for (path, backup) in done.into_iter().rev() {
                    // Best effort: the original error is what gets reported
                    let _ = match backup {
                        Some(old) => old.persist(&path).map(|_| ()).map_err(|e| e.error),
                        None => fs::remove_file(&path),
                    };
                }
                return Err(err);
            }
        }
    }

    Ok(done.into_iter().map(|(path, _)| path).collect())
}
