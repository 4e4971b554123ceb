use crate::http::var;
use crate::sec::statements::EXPECTED_FILES;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Where the SEC publishes the quarterly Financial Statement Data Sets.
pub const SEC_BASE_URL: &str =
    "https://www.sec.gov/files/dera/data/financial-statement-data-sets/";

/// Paths and request identity for a pipeline run, resolved once at startup.
///
/// The directory layout under `root` follows the project's zone convention:
/// ```text
/// root/
/// ├── 01_data/01_sampleData/01_raw      downloaded archives
/// ├── 01_data/01_sampleData/02_bronze   extracted members, one dir per period
/// └── 06_logs/downloads.csv             run log
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    pub raw_dir: PathBuf,
    pub bronze_dir: PathBuf,
    pub log_path: PathBuf,
    pub base_url: String,

    /// Sent as `User-Agent` on every request; the SEC asks for a name and a
    /// contact address, e.g. `"Jane Doe jane@example.com"`.
    pub user_agent: String,

    /// Members each extracted period is checked for, lowercase.
    pub expected_files: Vec<String>,
}

impl Config {
    /// Derive the conventional layout beneath `root`.
    pub fn from_root(root: impl Into<PathBuf>, user_agent: impl Into<String>) -> Self {
        let root = root.into();
        let data = root.join("01_data").join("01_sampleData");
        Self {
            raw_dir: data.join("01_raw"),
            bronze_dir: data.join("02_bronze"),
            log_path: root.join("06_logs").join("downloads.csv"),
            base_url: SEC_BASE_URL.to_string(),
            user_agent: user_agent.into(),
            expected_files: EXPECTED_FILES.iter().map(|name| name.to_string()).collect(),
            root,
        }
    }

    /// Read the configuration from the environment. Loading `.env` is left to
    /// the binary.
    ///
    /// - `USER_AGENT`: required
    /// - `FSDS_ROOT`: project root, defaults to the current directory
    /// - `SEC_BASE_URL`: optional mirror of the data set directory
    /// - `BRONZE_FILES_TO_LOAD`: comma-separated members to verify after
    ///   extraction, defaults to [`EXPECTED_FILES`]
    ///
    /// `root` takes precedence over `FSDS_ROOT`.
    pub fn from_env(root: Option<&Path>) -> anyhow::Result<Self> {
        let user_agent = var("USER_AGENT")
            .map_err(|err| anyhow::anyhow!("environment variable USER_AGENT: {err}"))?;

        let root = match root {
            Some(root) => root.to_path_buf(),
            None => match var("FSDS_ROOT") {
                Ok(root) => PathBuf::from(root),
                Err(_) => std::env::current_dir()?,
            },
        };
        trace!("project root resolved to {root:?}");

        let mut config = Self::from_root(root, user_agent);
        if let Ok(base_url) = var("SEC_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(files) = var("BRONZE_FILES_TO_LOAD") {
            config = config.with_expected_files(files.split(','));
        }

        // the SEC blocks anonymous agents out of band, so this is only a warning
        if !config.has_contact_address() {
            warn!(
                "USER_AGENT \"{}\" has no contact address; the SEC may block requests",
                config.user_agent
            );
        }

        debug!("configuration loaded: {config:?}");
        Ok(config)
    }

    /// Override the source address; a trailing `/` is added if absent.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    pub fn with_raw_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw_dir = dir.into();
        self
    }

    pub fn with_bronze_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bronze_dir = dir.into();
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Replace the members checked after extraction. Names are trimmed and
    /// lowercased; an empty list keeps the current set.
    pub fn with_expected_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let files: Vec<String> = files
            .into_iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        if !files.is_empty() {
            self.expected_files = files;
        }
        self
    }

    /// Whether the user agent carries something that looks like an email.
    pub fn has_contact_address(&self) -> bool {
        self.user_agent.contains('@')
    }
}
