use std::path::PathBuf;

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::Utc;

use crate::app::model::ChartSnapshot;
use crate::chart::extract_chart;
use crate::fetch::{FetchConfig, fetch_chart};

#[derive(Debug, Clone)]
pub struct RawDocument {
    pub html: String,
    pub http_status: Option<u16>,
}

#[async_trait]
pub trait ChartSource: Send + Sync {
    fn describe(&self) -> String;
    async fn load(&self) -> anyhow::Result<RawDocument>;
}

#[derive(Debug, Clone)]
pub struct HttpChartSource {
    config: FetchConfig,
}

impl HttpChartSource {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChartSource for HttpChartSource {
    fn describe(&self) -> String {
        self.config.chart_url.to_string()
    }

    async fn load(&self) -> anyhow::Result<RawDocument> {
        let fetched = fetch_chart(&self.config).await?;
        Ok(RawDocument {
            html: fetched.html,
            http_status: Some(fetched.status),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FileChartSource {
    path: PathBuf,
}

impl FileChartSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ChartSource for FileChartSource {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    async fn load(&self) -> anyhow::Result<RawDocument> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("read chart html: {}", self.path.display()))?;
        Ok(RawDocument {
            html: String::from_utf8_lossy(&bytes).into_owned(),
            http_status: None,
        })
    }
}

pub async fn load_snapshot(source: &dyn ChartSource) -> anyhow::Result<ChartSnapshot> {
    let document = source.load().await.context("load chart document")?;
    let mut extraction = extract_chart(&document.html).context("extract chart")?;
    extraction.diagnostics.http_status = document.http_status;

    Ok(ChartSnapshot {
        source: source.describe(),
        loaded_at: Utc::now(),
        diagnostics: extraction.diagnostics,
        records: extraction.records,
        error: None,
    })
}

pub async fn load_snapshot_or_failed(source: &dyn ChartSource) -> ChartSnapshot {
    match load_snapshot(source).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::error!(source = %source.describe(), ?err, "initial chart load failed");
            ChartSnapshot::failed(source.describe(), format!("{err:#}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_becomes_failed_snapshot() {
        let source = FileChartSource::new("/no/such/chart.html");
        let snapshot = load_snapshot_or_failed(&source).await;

        assert!(snapshot.records.is_empty());
        let error = snapshot.error.unwrap();
        assert!(error.contains("read chart html"));
        assert_eq!(snapshot.source, "file:///no/such/chart.html");
    }

    #[tokio::test]
    async fn page_without_structured_data_becomes_failed_snapshot() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("chart.html");
        std::fs::write(&path, "<html><body>captcha</body></html>")?;

        let snapshot = load_snapshot_or_failed(&FileChartSource::new(&path)).await;
        assert!(snapshot.records.is_empty());
        assert!(snapshot.error.unwrap().contains("no application/ld+json blocks"));
        Ok(())
    }
}
