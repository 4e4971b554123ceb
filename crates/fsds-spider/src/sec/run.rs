use crate::error::FetchError;
use crate::sec::statements::Period;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::error;

/// Timestamp layout used in run records, e.g. `2025-07-01 09:30:00.000123`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// What one fetch invocation produced.
#[derive(Debug)]
pub enum RunResult {
    Success(FetchSuccess),
    Failed(FetchFailure),
}

/// A downloaded and extracted archive.
///
/// Field order here is the column order of a fresh run log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FetchSuccess {
    pub year: i32,
    pub quarter: u32,
    pub url: String,
    #[serde(serialize_with = "ser_path")]
    pub zip_path: PathBuf,
    #[serde(serialize_with = "ser_path")]
    pub extract_path: PathBuf,
    pub file_size_mb: f64,
    #[serde(serialize_with = "ser_timestamp")]
    pub download_start: DateTime<Local>,
    /// Seconds.
    pub download_time: f64,
    #[serde(serialize_with = "ser_timestamp")]
    pub extract_start: DateTime<Local>,
    /// Seconds.
    pub extract_time: f64,
    pub extracted_files: Vec<String>,

    /// Expected members not found after extraction. Reported, but a run with
    /// missing members is still a success.
    pub missing_files: Vec<String>,
    pub http_status: u16,
}

#[derive(Debug)]
pub struct FetchFailure {
    pub year: i32,
    pub quarter: u32,
    pub url: String,
    pub error: FetchError,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            RunResult::Success(_) => "success",
            RunResult::Failed(_) => "failed",
        }
    }

    pub fn period(&self) -> Period {
        match self {
            RunResult::Success(s) => Period::new(s.year, s.quarter),
            RunResult::Failed(f) => Period::new(f.year, f.quarter),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            RunResult::Success(s) => &s.url,
            RunResult::Failed(f) => &f.url,
        }
    }

    /// Flatten into an insertion-ordered record for the run log.
    ///
    /// Success and failure records deliberately carry different field sets.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("status".into(), self.status().into());

        match self {
            RunResult::Success(success) => {
                match serde_json::to_value(success) {
                    Ok(Value::Object(fields)) => record.extend(fields),
                    Ok(other) => error!("success record serialized to a non-object: {other}"),
                    Err(err) => error!("failed to serialize success record: {err}"),
                }
            }
            RunResult::Failed(failure) => {
                record.insert("error_kind".into(), failure.error.kind().into());
                record.insert("error".into(), failure.error.to_string().into());
                record.insert("year".into(), failure.year.into());
                record.insert("quarter".into(), failure.quarter.into());
                record.insert("url".into(), failure.url.clone().into());
                if let Some(status) = failure.error.http_status() {
                    record.insert("http_status".into(), status.into());
                }
            }
        }

        record
    }
}

fn ser_timestamp<S>(timestamp: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.format(TIMESTAMP_FORMAT).to_string())
}

fn ser_path<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&path.to_string_lossy())
}
