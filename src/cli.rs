use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Fetch(FetchArgs),
    Extract(ExtractArgs),
    Query(QueryArgs),
    Scrape(ScrapeArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Chart URL (default: $TOPCHART_CHART_URL or the IMDb Top 250).
    #[arg(long)]
    pub url: Option<String>,

    /// Output file for the raw chart HTML.
    #[arg(long)]
    pub out: String,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Raw chart HTML (created by `fetch`).
    #[arg(long)]
    pub html: String,

    /// Output file for the JSON export.
    #[arg(long)]
    pub out: String,

    /// Overwrite the output file if it exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Raw chart HTML (created by `fetch`).
    #[arg(long)]
    pub html: String,

    /// Maximum records to return (1-250, default 50).
    #[arg(long)]
    pub limit: Option<String>,

    /// Sort field: RANKING, USER_RATING, RELEASE_DATE, RATING_COUNT, TITLE,
    /// POPULARITY or RUNTIME.
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort direction: asc or desc.
    #[arg(long)]
    pub direction: Option<String>,
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Chart URL (default: $TOPCHART_CHART_URL or the IMDb Top 250).
    #[arg(long)]
    pub url: Option<String>,

    /// Output directory (chart.html, movies.json, result.json, diagnostics.json).
    #[arg(long)]
    pub out: String,

    #[arg(long)]
    pub limit: Option<String>,

    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long)]
    pub direction: Option<String>,
}
