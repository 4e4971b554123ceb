use thiserror::Error;

/// Every way a single period fetch can fail.
///
/// The variants are terminal for the invocation; nothing is retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response, or the body stream broke.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The source answered with a 4xx/5xx status.
    #[error("HTTP status {status} for url ({url})")]
    Rejected { status: u16, url: String },

    #[error("filesystem failure: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("archive failure: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl FetchError {
    /// Stable tag for the failure kind, as written to the run log.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Rejected { .. } => "rejected",
            FetchError::Filesystem(_) => "filesystem",
            FetchError::Archive(_) => "archive",
        }
    }

    /// The response code, for upstream rejections only.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log file csv error: {0}")]
    Csv(#[from] csv::Error),
}
