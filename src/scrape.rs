use std::path::PathBuf;

use anyhow::Context as _;

use crate::chart::{extract_chart, options_from_args};
use crate::cli::ScrapeArgs;
use crate::fetch::{FetchConfig, fetch_chart};
use crate::query::query;

pub async fn run(args: ScrapeArgs) -> anyhow::Result<()> {
    let options = options_from_args(args.limit, args.sort, args.direction)?;

    let out_dir = PathBuf::from(&args.out);
    if out_dir.exists() {
        anyhow::bail!(
            "scrape output directory already exists: {}",
            out_dir.display()
        );
    }

    let config = FetchConfig::from_env(args.url.as_deref())?;

    tracing::info!(url = %config.chart_url, out = %out_dir.display(), "scrape: fetch");
    let fetched = fetch_chart(&config).await.context("fetch chart")?;
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create scrape dir: {}", out_dir.display()))?;
    crate::raw_store::write_raw_html(&out_dir.join("chart.html"), &fetched.html)
        .context("store raw chart")?;

    tracing::info!("scrape: extract");
    let mut extraction = extract_chart(&fetched.html).context("extract chart")?;
    extraction.diagnostics.http_status = Some(fetched.status);

    crate::export::write_json(&out_dir.join("movies.json"), &extraction.records, false)
        .context("write movies.json")?;

    tracing::info!(
        limit = options.limit,
        sort = %options.sort_field,
        direction = %options.direction,
        "scrape: query"
    );
    let result = query(&extraction.records, &options).context("invalid query")?;
    crate::export::write_json(&out_dir.join("result.json"), &result, false)
        .context("write result.json")?;
    crate::export::write_value(
        &out_dir.join("diagnostics.json"),
        &extraction.diagnostics,
        false,
    )
    .context("write diagnostics.json")?;

    tracing::info!(
        records = extraction.records.len(),
        returned = result.len(),
        "scrape: done"
    );
    Ok(())
}
