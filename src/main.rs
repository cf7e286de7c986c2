use clap::Parser;
use tracing_subscriber::EnvFilter;

use deadline_tracker::cli::{Cli, run};

fn init_tracing(verbose: bool, json: bool) {
    let default_directive = if verbose {
        "deadline_tracker=debug"
    } else {
        "deadline_tracker=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose(), cli.json_logs);
    run(cli).await
}
