use colored::Colorize;
use fsds_spider::run_log::{append_record, normalize};
use fsds_spider::sec::run::RunResult;
use fsds_spider::sec::statements::{Fetcher, Period};
use fsds_spider::Config;
use tracing::{error, info};

/// Fetch one period, append the outcome to the run log, and report it.
///
/// A failed fetch is logged and reported like a successful one; only a
/// broken configuration or an unwritable log is returned as an error.
pub(crate) async fn run(config: &Config, period: Period, tui: bool) -> anyhow::Result<RunResult> {
    let time = std::time::Instant::now();

    let fetcher = Fetcher::new(config, tui)?;
    let result = fetcher.fetch_default(period).await;

    let record = result.to_record();
    append_record(&record, &config.log_path).map_err(|err| {
        error!("failed to log run to {:?}: {err}", config.log_path);
        err
    })?;
    info!(
        "{period} finished with status {}, logged to {:?}, time elapsed: {:?}",
        result.status(),
        config.log_path,
        time.elapsed()
    );

    if tui {
        println!(
            "\n{bar}\n{name:^40}\n{bar}",
            bar = "=".repeat(40),
            name = "Download Summary"
        );
        for (key, value) in &record {
            println!("{}: {}", key.bold(), normalize(value));
        }
        let status = match result.is_success() {
            true => result.status().green(),
            false => result.status().red(),
        };
        println!("\n{period} {status}, logged to {}", config.log_path.display());
    }

    Ok(result)
}
