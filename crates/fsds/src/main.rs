mod cli;
mod spider;

// remote imports
use clap::Parser;
use cli::{Cli, TraceLevel};
use fsds_spider::sec::statements::Period;
use fsds_spider::Config;
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// install the subscriber at the requested trace level
fn preprocess(trace_level: Level) -> anyhow::Result<()> {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenv::dotenv().ok();

    // set the trace level
    if let Some(trace_level) = cli.trace {
        preprocess(match trace_level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        })?;
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    // read cli inputs
    use cli::Commands::*;
    match cli.command {
        // `fsds fetch --year <Y> --quarter <Q>`: fetch one period and log it
        Fetch {
            year,
            quarter,
            output_dir,
            extract_dir,
            log_path,
            root,
        } => {
            let mut config = Config::from_env(root.as_deref())?;
            if let Some(dir) = output_dir {
                config = config.with_raw_dir(dir);
            }
            if let Some(dir) = extract_dir {
                config = config.with_bronze_dir(dir);
            }
            if let Some(path) = log_path {
                config = config.with_log_path(path);
            }
            trace!("running with {config:?}");

            spider::run(&config, Period::new(year, quarter), tui).await?;
        }
    }

    Ok(())
}
