use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::{ExtractArgs, QueryArgs};
use crate::document::{self, ParseError};
use crate::formats::{Diagnostics, MovieRecord};
use crate::normalize::normalize_with_report;
use crate::query::{QueryOptions, QueryParams, query};

#[derive(Debug, Clone)]
pub struct ChartExtraction {
    pub records: Vec<MovieRecord>,
    pub diagnostics: Diagnostics,
}

pub fn extract_chart(html: &str) -> Result<ChartExtraction, ParseError> {
    let parsed = document::parse(html)?;
    let (records, report) = normalize_with_report(&parsed.candidates, &parsed.rank_hints);

    let diagnostics = Diagnostics {
        http_status: None,
        html_length: html.len(),
        ldjson_blocks: parsed.blocks_found,
        ldjson_decoded: parsed.blocks_decoded,
        rank_hints: parsed.rank_hints.len(),
        candidates: report.candidates,
        dropped_unranked: report.dropped_unranked,
        dropped_invalid: report.dropped_invalid,
        duplicates: report.duplicates,
        records: report.records,
    };
    if report.dropped_unranked > 0 || report.dropped_invalid > 0 {
        tracing::info!(
            dropped_unranked = report.dropped_unranked,
            dropped_invalid = report.dropped_invalid,
            "some candidates were not placed on the chart"
        );
    }

    Ok(ChartExtraction {
        records,
        diagnostics,
    })
}

pub fn options_from_args(
    limit: Option<String>,
    sort: Option<String>,
    direction: Option<String>,
) -> anyhow::Result<QueryOptions> {
    let params = QueryParams {
        limit,
        sort,
        direction,
    };
    QueryOptions::from_params(&params).context("invalid query")
}

pub fn run_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let html = crate::raw_store::read_raw_html(&PathBuf::from(&args.html))?;
    let extraction = extract_chart(&html).context("extract chart")?;
    tracing::info!(
        records = extraction.records.len(),
        out = %args.out,
        "writing export"
    );
    crate::export::write_json(&PathBuf::from(&args.out), &extraction.records, args.force)
        .context("write export")?;
    Ok(())
}

pub fn run_query(args: QueryArgs) -> anyhow::Result<()> {
    let options = options_from_args(args.limit, args.sort, args.direction)?;
    let html = crate::raw_store::read_raw_html(&PathBuf::from(&args.html))?;
    let extraction = extract_chart(&html).context("extract chart")?;
    let result = query(&extraction.records, &options).context("invalid query")?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &result).context("serialize query result")?;
    stdout.write_all(b"\n").context("write stdout")?;
    Ok(())
}
