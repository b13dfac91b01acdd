//! Shared utility functions for tide crates.

/// Date and timestamp utility functions
pub mod dates {
    use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

    /// Timestamp layouts seen in NOAA CO-OPS CSV exports and hand-edited files,
    /// all interpreted as UTC.
    const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ];

    /// Format a NaiveDate as "YYYYMMDD" (NOAA query format)
    pub fn format_date_compact(date: &NaiveDate) -> String {
        date.format("%Y%m%d").to_string()
    }

    /// Current calendar year in UTC.
    pub fn current_year() -> i32 {
        Utc::now().year()
    }

    /// Parse a timestamp cell into a UTC instant.
    ///
    /// Naive timestamps are taken to be UTC (NOAA is queried with
    /// `time_zone=gmt`). RFC 3339 values carrying an offset are converted.
    /// A bare `YYYY-MM-DD` maps to midnight. Returns `None` for anything else.
    pub fn parse_timestamp_utc(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        for format in NAIVE_TIMESTAMP_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(naive.and_utc());
            }
        }
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(s) {
            return Some(with_offset.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

}

/// File helpers for the download cache
pub mod files {
    use sha3::{Digest, Sha3_256};
    use std::fmt::Write as _;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    /// Extension of the checksum sidecar written next to a cached download.
    pub const CHECKSUM_EXTENSION: &str = "sha3";

    /// Size of a file in bytes, or `None` if it does not exist.
    pub fn file_len(path: &Path) -> io::Result<Option<u64>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write `contents` to `path` through a temporary sibling file so a crash
    /// never leaves a truncated file under the final name.
    pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".part");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, path)
    }

    /// Lowercase hex SHA3-256 digest of a byte slice.
    pub fn sha3_hex(bytes: &[u8]) -> String {
        let digest = Sha3_256::digest(bytes);
        let mut out = String::with_capacity(digest.len() * 2);
        for byte in digest.iter() {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    /// Path of the checksum sidecar for `path` (`foo.csv` -> `foo.csv.sha3`).
    pub fn checksum_sidecar(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(CHECKSUM_EXTENSION);
        PathBuf::from(name)
    }

    /// Write the sidecar digest for `contents` next to `path`.
    pub fn write_checksum(path: &Path, contents: &[u8]) -> io::Result<()> {
        write_atomic(&checksum_sidecar(path), sha3_hex(contents).as_bytes())
    }

    /// True when `path` and its sidecar both exist and the digest matches.
    pub fn checksum_matches(path: &Path) -> io::Result<bool> {
        let expected = match fs::read_to_string(checksum_sidecar(path)) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        let contents = match fs::read(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(expected.trim() == sha3_hex(&contents))
    }

}
