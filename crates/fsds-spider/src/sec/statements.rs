use crate::config::Config;
use crate::error::FetchError;
use crate::fs::{download_file, list_dir, unzip};
use crate::http::*;
use crate::sec::run::{FetchFailure, FetchSuccess, RunResult};
use chrono::Local;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Members every quarterly archive should contain, unless configured otherwise;
/// matched case-insensitively.
pub const EXPECTED_FILES: [&str; 4] = ["sub.txt", "num.txt", "tag.txt", "pre.txt"];

/// One quarterly archive, e.g. `2025q2`.
///
/// The quarter is not range checked; the SEC rejects periods it has no
/// archive for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Period {
    pub year: i32,
    pub quarter: u32,
}

impl Period {
    pub fn new(year: i32, quarter: u32) -> Self {
        Self { year, quarter }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}q{}", self.year, self.quarter)
    }
}

/// Downloads and extracts quarterly archives.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: HttpClient,
    base_url: String,
    raw_dir: PathBuf,
    bronze_dir: PathBuf,
    expected_files: Vec<String>,
    tui: bool,
}

impl Fetcher {
    /// Build a fetcher whose client identifies itself with `config.user_agent`.
    pub fn new(config: &Config, tui: bool) -> Result<Self, FetchError> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|err| {
                error!("failed to build reqwest client: {err}");
                err
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            raw_dir: config.raw_dir.clone(),
            bronze_dir: config.bronze_dir.clone(),
            expected_files: config.expected_files.clone(),
            tui,
        })
    }

    /// Source address of `period`'s archive.
    pub fn url(&self, period: Period) -> String {
        format!("{}{period}.zip", self.base_url)
    }

    /// [`Fetcher::fetch`] into the configured raw and bronze directories.
    pub async fn fetch_default(&self, period: Period) -> RunResult {
        self.fetch(period, &self.raw_dir, &self.bronze_dir).await
    }

    /// Download `period`'s archive into `output_dir` and extract it into
    /// `extract_dir/{period}`.
    ///
    /// Never fails outright: every error is folded into [`RunResult::Failed`].
    /// Nothing written before a failure is cleaned up.
    pub async fn fetch(&self, period: Period, output_dir: &Path, extract_dir: &Path) -> RunResult {
        let url = self.url(period);

        match self.try_fetch(period, &url, output_dir, extract_dir).await {
            Ok(success) => RunResult::Success(success),
            Err(err) => {
                error!("fetching {period} from {url} failed: {err}");
                if self.tui {
                    println!("{} {err}", "✗ fetch failed:".red());
                }
                RunResult::Failed(FetchFailure {
                    year: period.year,
                    quarter: period.quarter,
                    url,
                    error: err,
                })
            }
        }
    }

    async fn try_fetch(
        &self,
        period: Period,
        url: &str,
        output_dir: &Path,
        extract_dir: &Path,
    ) -> Result<FetchSuccess, FetchError> {
        let filename = format!("{period}.zip");
        let zip_path = output_dir.join(&filename);
        let extract_path = extract_dir.join(period.to_string());

        tokio::fs::create_dir_all(output_dir).await?;
        tokio::fs::create_dir_all(extract_dir).await?;

        if self.tui {
            println!(
                "{bar}\n{name:^40}\n{bar}",
                bar = "=".repeat(40),
                name = filename
            );
            println!("URL: {url}");
        }

        // download
        debug!("downloading {url} to {zip_path:?}");
        let download_start = Local::now();
        let time = Instant::now();
        let download = download_file(&self.client, url, &zip_path, self.tui).await?;
        let download_time = time.elapsed().as_secs_f64();
        let file_size_mb = download.bytes as f64 / (1024.0 * 1024.0);
        info!("{filename} downloaded, {file_size_mb:.2} MB in {download_time:.3}s");
        if self.tui {
            println!("{} {filename} ({file_size_mb:.2} MB)", "✓ downloaded".green());
        }

        // extract & verify
        let extract_start = Local::now();
        let time = Instant::now();
        let members = unzip(&zip_path, &extract_path, self.tui)?;
        let extracted_files = archive_order(list_dir(&extract_path)?, &members);
        let missing_files = missing_members(&extracted_files, &self.expected_files);
        if missing_files.is_empty() {
            debug!("all expected files extracted for {period}");
        } else {
            warn!("{period} is missing expected files: {missing_files:?}");
            if self.tui {
                println!("{} {missing_files:?}", "⚠ missing expected files:".yellow());
            }
        }
        let extract_time = time.elapsed().as_secs_f64();
        info!("{filename} extracted to {extract_path:?} in {extract_time:.3}s");
        if self.tui {
            println!("{} to {}", "✓ extracted".green(), extract_path.display());
        }

        Ok(FetchSuccess {
            year: period.year,
            quarter: period.quarter,
            url: url.to_string(),
            zip_path,
            extract_path,
            file_size_mb,
            download_start,
            download_time,
            extract_start,
            extract_time,
            extracted_files,
            missing_files,
            http_status: download.http_status,
        })
    }
}

/// Entries of `expected` absent from `extracted`, ignoring case.
pub fn missing_members<S: AsRef<str>>(extracted: &[String], expected: &[S]) -> Vec<String> {
    expected
        .iter()
        .map(|expected| expected.as_ref())
        .filter(|expected| !extracted.iter().any(|name| name.eq_ignore_ascii_case(expected)))
        .map(String::from)
        .collect()
}

// directory entries in archive order; anything the archive did not write
// (left over from an earlier run) follows in listing order
fn archive_order(listing: Vec<String>, members: &[String]) -> Vec<String> {
    let (mut ordered, rest): (Vec<String>, Vec<String>) =
        listing.into_iter().partition(|name| members.contains(name));
    ordered.sort_by_key(|name| members.iter().position(|member| member == name));
    ordered.extend(rest);
    ordered
}
