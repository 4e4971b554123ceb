pub mod config;
pub mod error;
pub mod fs;
pub mod run_log;
pub mod sec;

pub use config::Config;
pub use error::{FetchError, LogError};

/// Shortcut for required API elements.
pub(crate) mod http {
    pub(crate) use dotenv::var;
    pub(crate) use reqwest::Client as HttpClient;
}
