use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    topchart::logging::init().context("init logging")?;

    let cli = topchart::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        topchart::cli::Command::Fetch(args) => {
            topchart::fetch::run(args).await.context("fetch")?;
        }
        topchart::cli::Command::Extract(args) => {
            topchart::chart::run_extract(args).context("extract")?;
        }
        topchart::cli::Command::Query(args) => {
            topchart::chart::run_query(args).context("query")?;
        }
        topchart::cli::Command::Scrape(args) => {
            topchart::scrape::run(args).await.context("scrape")?;
        }
    }

    Ok(())
}
