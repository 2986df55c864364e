//! Tick file reading.
//!
//! Parses delimited tick files in the fixed 14-column layout into typed
//! records. A directory read recovers from per-file failures as long as at
//! least one file parses.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tickprep_core::config::IngestConfig;
use tickprep_core::{parse_instant, Error, Result, TickRecord};
use tracing::{debug, info, warn};

/// Column layout of the input files. The header row is skipped and columns
/// are read by position.
pub const COLUMNS: [&str; 14] = [
    "ts_recv",
    "ts_event",
    "rtype",
    "publisher_id",
    "instrument_id",
    "action",
    "side",
    "depth",
    "price",
    "size",
    "flags",
    "ts_in_delta",
    "sequence",
    "symbol",
];

/// One row as it appears in the file, before validation.
#[derive(Debug, Deserialize)]
struct RawTickRow {
    ts_recv: String,
    ts_event: String,
    rtype: u16,
    publisher_id: u32,
    instrument_id: u64,
    action: String,
    side: String,
    depth: u32,
    price: f64,
    size: u64,
    flags: u32,
    ts_in_delta: i64,
    sequence: u64,
    symbol: String,
}

impl RawTickRow {
    fn validate(self) -> Result<TickRecord> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(Error::parse(format!("price must be positive, got {}", self.price)));
        }
        Ok(TickRecord {
            ts_recv: parse_instant(&self.ts_recv)?,
            ts_event: parse_instant(&self.ts_event)?,
            rtype: self.rtype,
            publisher_id: self.publisher_id,
            instrument_id: self.instrument_id,
            action: self.action,
            side: self.side,
            depth: self.depth,
            price: self.price,
            size: self.size,
            flags: self.flags,
            ts_in_delta: self.ts_in_delta,
            sequence: self.sequence,
            symbol: self.symbol,
        })
    }
}

/// A file that could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of reading a directory of tick files.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Records of every successful file, concatenated in file order.
    pub records: Vec<TickRecord>,
    /// Files read successfully.
    pub files_read: Vec<PathBuf>,
    /// Files skipped after an error.
    pub failures: Vec<FileFailure>,
    /// Rows skipped inside successful files.
    pub skipped_rows: usize,
}

/// Reader for tick files.
pub struct TickReader {
    config: IngestConfig,
}

impl TickReader {
    /// Create a reader with the given ingestion settings.
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Read one file. Returns the records and the number of skipped rows.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<(Vec<TickRecord>, usize)> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.config.delimiter)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|e| Error::file_read(path, e.to_string()))?;

        let mut records = Vec::new();
        let mut skipped = 0;

        for (idx, row) in reader.records().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            match row.map_err(|e| Error::parse(e.to_string())).and_then(|r| parse_row(&r)) {
                Ok(record) => records.push(record),
                Err(e) if self.config.skip_invalid_rows => {
                    debug!("Skipping {} line {}: {}", path.display(), line, e);
                    skipped += 1;
                }
                Err(e) => {
                    return Err(Error::file_read(path, format!("line {}: {}", line, e)));
                }
            }
        }

        if skipped > 0 {
            warn!("Skipped {} invalid rows in {}", skipped, path.display());
        }

        Ok((records, skipped))
    }

    /// Read every matching file in `dir`, in sorted path order.
    ///
    /// A missing directory or one without matching files is
    /// `InputNotFound`. Files that fail are logged and skipped; if none
    /// succeed the result is `NoValidRecords`.
    pub fn read_directory(&self, dir: impl AsRef<Path>) -> Result<IngestReport> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::input_not_found(format!("directory not found: {}", dir.display())));
        }

        let files = self.list_files(dir)?;
        if files.is_empty() {
            return Err(Error::input_not_found(format!(
                "no .{} files in {}",
                self.config.file_extension,
                dir.display()
            )));
        }
        info!("Found {} files in {}", files.len(), dir.display());

        let mut report = IngestReport::default();
        for file in files {
            match self.read_file(&file) {
                Ok((records, skipped)) => {
                    debug!("Read {} rows from {}", records.len(), file.display());
                    report.records.extend(records);
                    report.skipped_rows += skipped;
                    report.files_read.push(file);
                }
                Err(e) => {
                    warn!("{}", e);
                    report.failures.push(FileFailure {
                        path: file,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if report.files_read.is_empty() {
            return Err(Error::no_valid_records(format!(
                "no files were successfully read from {}",
                dir.display()
            )));
        }

        let first = report.records.iter().map(|r| r.ts_event).min();
        let last = report.records.iter().map(|r| r.ts_event).max();
        if let (Some(first), Some(last)) = (first, last) {
            info!(
                files = report.files_read.len(),
                failed = report.failures.len(),
                rows = report.records.len(),
                "Time range: {} to {}",
                first,
                last
            );
        }

        Ok(report)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let ext = &self.config.file_extension;
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(ext))
                .unwrap_or(false);
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn parse_row(record: &StringRecord) -> Result<TickRecord> {
    if record.len() != COLUMNS.len() {
        return Err(Error::parse(format!(
            "expected {} fields, found {}",
            COLUMNS.len(),
            record.len()
        )));
    }
    let raw: RawTickRow = record
        .deserialize(None)
        .map_err(|e| Error::parse(e.to_string()))?;
    raw.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Utc};
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,depth,price,size,flags,ts_in_delta,sequence,symbol";

    fn row(ts_event: &str, price: &str) -> String {
        format!(
            "2024-03-07T09:00:00.900000000Z, {}, 0, 2, 11667, T, N, 0, {}, 100, 130, 18340, 1300, NVDA",
            ts_event, price
        )
    }

    fn write(dir: &TempDir, name: &str, lines: &[String]) -> PathBuf {
        let path = dir.path().join(name);
        let mut body = String::from(HEADER);
        for l in lines {
            body.push('\n');
            body.push_str(l);
        }
        body.push('\n');
        fs::write(&path, body).unwrap();
        path
    }

    fn reader() -> TickReader {
        TickReader::new(IngestConfig::default())
    }

    #[test]
    fn test_read_file_typed_fields() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.csv", &[row("2024-03-07T09:00:00.785957501Z", "875.25")]);

        let (records, skipped) = reader().read_file(&path).unwrap();

        assert_eq!(skipped, 0);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.ts_event.nanosecond(), 785_957_501);
        assert_eq!(r.price, 875.25);
        assert_eq!(r.size, 100);
        assert_eq!(r.action, "T");
        assert_eq!(r.side, "N");
        assert_eq!(r.symbol, "NVDA");
        assert_eq!(r.sequence, 1300);
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.csv", &[]);
        let (records, _) = reader().read_file(&path).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_bad_row_fails_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "a.csv",
            &[row("2024-03-07T09:00:01Z", "10.0"), row("2024-03-07T09:00:02Z", "abc")],
        );
        let err = reader().read_file(&path).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_skip_invalid_rows() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "a.csv",
            &[
                row("2024-03-07T09:00:01Z", "10.0"),
                row("not-a-time", "11.0"),
                row("2024-03-07T09:00:03Z", "-1.0"),
                row("2024-03-07T09:00:04Z", "12.0"),
            ],
        );
        let config = IngestConfig {
            skip_invalid_rows: true,
            ..IngestConfig::default()
        };
        let (records, skipped) = TickReader::new(config).read_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_naive_timestamp_coerced_to_utc() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.csv", &[row("2024-03-07T09:30:00", "10.0")]);
        let (records, _) = reader().read_file(&path).unwrap();
        assert_eq!(records[0].ts_event, Utc.with_ymd_and_hms(2024, 3, 7, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_directory_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.csv", &[row("2024-03-07T10:00:00Z", "11.0")]);
        write(&dir, "a.csv", &[row("2024-03-08T10:00:00Z", "12.0")]);
        write(&dir, "c.csv", &[row("2024-03-07T10:00:00Z", "oops")]);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let report = reader().read_directory(dir.path()).unwrap();

        assert_eq!(report.files_read.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("c.csv"));
        // Sorted file order: a.csv then b.csv.
        let prices: Vec<f64> = report.records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![12.0, 11.0]);
    }

    #[test]
    fn test_directory_missing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(reader().read_directory(&missing), Err(Error::InputNotFound(_))));
    }

    #[test]
    fn test_directory_without_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("readme.md"), "x").unwrap();
        assert!(matches!(reader().read_directory(dir.path()), Err(Error::InputNotFound(_))));
    }

    #[test]
    fn test_directory_all_files_fail() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.csv", &[row("bad", "1.0")]);
        write(&dir, "b.csv", &["1,2,3".to_string()]);
        assert!(matches!(reader().read_directory(dir.path()), Err(Error::NoValidRecords(_))));
    }
}
