//! NDJSON reading and writing for import records.
//!
//! One JSON object per line, UTF-8, compact encoding on output. Parse
//! errors carry the 1-indexed line number so offending rows can be
//! located without a debugger.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::LabelwireError;

use super::record::ImportRecord;

/// Reads import records from an NDJSON file.
///
/// Blank lines are skipped.
///
/// # Errors
/// Returns an error if the file cannot be read or a line fails to parse.
pub fn read_ndjson(path: &Path) -> Result<Vec<ImportRecord>, LabelwireError> {
    let file = File::open(path).map_err(LabelwireError::Io)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(LabelwireError::Io)?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| LabelwireError::NdjsonParse {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Writes import records to an NDJSON file, one compact object per line.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_ndjson(path: &Path, records: &[ImportRecord]) -> Result<(), LabelwireError> {
    let file = File::create(path).map_err(LabelwireError::Io)?;
    let mut writer = BufWriter::new(file);

    for record in records {
        let line = serde_json::to_string(record).map_err(|source| LabelwireError::NdjsonWrite {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Parses import records from an NDJSON string.
///
/// Useful for testing without file I/O.
pub fn from_ndjson_str(ndjson: &str) -> Result<Vec<ImportRecord>, LabelwireError> {
    let mut records = Vec::new();
    for (index, line) in ndjson.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| LabelwireError::NdjsonParse {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Parses import records from NDJSON bytes.
///
/// Useful for fuzzing and processing raw bytes without a prior UTF-8 pass.
pub fn from_ndjson_slice(bytes: &[u8]) -> Result<Vec<ImportRecord>, LabelwireError> {
    let mut records = Vec::new();
    for (index, line) in bytes.split(|&byte| byte == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let record = serde_json::from_slice(line).map_err(|source| LabelwireError::NdjsonParse {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Serializes import records to an NDJSON string.
///
/// Useful for testing without file I/O.
pub fn to_ndjson_string(records: &[ImportRecord]) -> Result<String, LabelwireError> {
    let mut out = String::new();
    for record in records {
        let line = serde_json::to_string(record).map_err(|source| LabelwireError::NdjsonWrite {
            path: Path::new("<string>").to_path_buf(),
            source,
        })?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}
