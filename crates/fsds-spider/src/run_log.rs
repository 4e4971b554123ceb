//! Append-only CSV log of pipeline runs.
//!
//! The header is fixed by the first row ever written to a file. Later
//! records are forced into that shape: columns the header lacks are dropped,
//! columns the record lacks are left empty. Records whose shape changes
//! between runs (success vs. failure) therefore never break the single
//! tabular view; the cost is that fields added later are not logged. A log
//! that must follow schema changes would need one self-describing document
//! per line (JSON Lines) instead.
use crate::error::LogError;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, error, trace};

/// Append `record` as one row of the CSV at `log_path`.
///
/// Creates the file (and its parent directories) with a header taken from
/// `record`'s keys if it does not exist. Otherwise the existing header
/// decides which values are written, and in what order.
///
/// A file that exists but holds no rows also gets a header before the row.
/// The pipeline this log inherits from wrote only the data row in that case,
/// leaving a file without a header; that is not reproduced.
///
/// If the last row on disk lacks its line terminator (a hand-edited log, or a
/// write cut short), the terminator is added first so the new row does not
/// run into it.
pub fn append_record(record: &Map<String, Value>, log_path: &Path) -> Result<(), LogError> {
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let existing_header = if log_path.exists() {
        read_header(log_path)?
    } else {
        None
    };

    match existing_header {
        None => {
            trace!("starting run log at {log_path:?}");
            let header: Vec<&str> = record.keys().map(String::as_str).collect();
            let row: Vec<String> = record.values().map(normalize).collect();

            let mut file = OpenOptions::new()
                .create(true)
                .read(true)
                .append(true)
                .open(log_path)?;
            terminate_last_row(&mut file)?;
            let mut writer = writer(file);
            writer.write_record(&header)?;
            writer.write_record(&row)?;
            writer.flush()?;
        }
        Some(header) => {
            let row: Vec<String> = header
                .iter()
                .map(|column| record.get(column).map(normalize).unwrap_or_default())
                .collect();

            let dropped: Vec<&String> = record
                .keys()
                .filter(|key| !header.contains(key))
                .collect();
            if !dropped.is_empty() {
                debug!("fields not in the {log_path:?} header were dropped: {dropped:?}");
            }

            let mut file = OpenOptions::new().read(true).append(true).open(log_path)?;
            terminate_last_row(&mut file)?;
            let mut writer = writer(file);
            writer.write_record(&row)?;
            writer.flush()?;
        }
    }

    debug!("run appended to {log_path:?}");
    Ok(())
}

/// The header row of the log at `log_path`, or `None` if it has no rows.
pub fn read_header(log_path: &Path) -> Result<Option<Vec<String>>, LogError> {
    let file = File::open(log_path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    match reader.records().next() {
        Some(record) => {
            let record = record.map_err(|err| {
                error!("failed to read header of {log_path:?}: {err}");
                err
            })?;
            Ok(Some(record.iter().map(String::from).collect()))
        }
        None => Ok(None),
    }
}

/// Render a value for a single CSV cell.
///
/// Arrays and objects become JSON text so a cell never holds a nested
/// structure; strings are written verbatim and `null` as an empty cell.
pub fn normalize(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

// appends go to the end regardless of the read position
fn terminate_last_row(file: &mut File) -> std::io::Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        trace!("last row had no terminator, adding one");
        file.write_all(b"\n")?;
    }
    Ok(())
}

fn writer(file: File) -> csv::Writer<File> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file)
}
