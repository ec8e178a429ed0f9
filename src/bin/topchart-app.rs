use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use topchart::app::server::{AppState, router};
use topchart::app::source::{ChartSource, FileChartSource, HttpChartSource, load_snapshot_or_failed};
use topchart::app::store::ChartStore;
use topchart::fetch::FetchConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:5000")]
    addr: SocketAddr,

    /// Serve a saved chart page instead of fetching it.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Chart URL (default: $TOPCHART_CHART_URL or the IMDb Top 250).
    #[arg(long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    topchart::logging::init_with_default("info,tower_http=debug")?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting topchart-app");

    let source: Arc<dyn ChartSource> = match &args.html {
        Some(path) => {
            tracing::info!(path = %path.display(), "using local chart file");
            Arc::new(FileChartSource::new(path.clone()))
        }
        None => {
            let config = FetchConfig::from_env(args.url.as_deref())?;
            tracing::info!(url = %config.chart_url, "using live chart");
            Arc::new(HttpChartSource::new(config))
        }
    };

    let initial = load_snapshot_or_failed(source.as_ref()).await;
    tracing::info!(
        records = initial.records.len(),
        error = initial.error.as_deref().unwrap_or_default(),
        "initial chart loaded"
    );
    let state = AppState::new(Arc::new(ChartStore::new(initial)), source);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
