use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA, USER_AGENT};
use url::Url;

use crate::cli::FetchArgs;

pub const DEFAULT_CHART_URL: &str = "https://www.imdb.com/chart/top/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
const PRIMARY_LANGUAGE: &str = "es-ES,es;q=0.9,en;q=0.8";
const FALLBACK_LANGUAGE: &str = "en-US,en;q=0.9";
const MIN_PLAUSIBLE_BODY: usize = 10_000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub chart_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl FetchConfig {
    pub fn new(chart_url: Url) -> Self {
        Self {
            chart_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Reads `TOPCHART_CHART_URL`, `TOPCHART_FETCH_TIMEOUT_SECS` and
    /// `TOPCHART_USER_AGENT`; `url_override` wins over the environment.
    pub fn from_env(url_override: Option<&str>) -> anyhow::Result<Self> {
        let raw_url = url_override
            .map(str::to_owned)
            .or_else(|| env_non_empty("TOPCHART_CHART_URL"))
            .unwrap_or_else(|| DEFAULT_CHART_URL.to_owned());
        let chart_url = parse_chart_url(&raw_url)?;

        let mut config = Self::new(chart_url);
        if let Some(secs) = env_non_empty("TOPCHART_FETCH_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| (1..=300).contains(v))
        {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(user_agent) = env_non_empty("TOPCHART_USER_AGENT") {
            config.user_agent = user_agent;
        }
        Ok(config)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_chart_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("parse chart url: {raw}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("chart url must be http/https: {url}");
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: Url,
    pub status: u16,
    pub html: String,
}

pub async fn fetch_chart(config: &FetchConfig) -> anyhow::Result<FetchedDocument> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build chart http client")?;

    let (mut status, mut html) = get_page(&client, config, PRIMARY_LANGUAGE).await?;
    if needs_language_fallback(status, &html) {
        tracing::info!(
            status = status.as_u16(),
            html_length = html.len(),
            "chart response looks incomplete; retrying with en-US"
        );
        (status, html) = get_page(&client, config, FALLBACK_LANGUAGE).await?;
    }

    if !status.is_success() {
        anyhow::bail!("GET {} returned {status}", config.chart_url);
    }

    tracing::info!(
        url = %config.chart_url,
        status = status.as_u16(),
        html_length = html.len(),
        "fetched chart page"
    );
    Ok(FetchedDocument {
        url: config.chart_url.clone(),
        status: status.as_u16(),
        html,
    })
}

fn needs_language_fallback(status: StatusCode, html: &str) -> bool {
    status == StatusCode::ACCEPTED || html.trim().is_empty() || html.len() < MIN_PLAUSIBLE_BODY
}

fn browser_headers(user_agent: &str, language: &'static str) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent).context("user agent header")?,
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(language));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    Ok(headers)
}

async fn get_page(
    client: &reqwest::Client,
    config: &FetchConfig,
    language: &'static str,
) -> anyhow::Result<(StatusCode, String)> {
    let response = client
        .get(config.chart_url.clone())
        .headers(browser_headers(&config.user_agent, language)?)
        .send()
        .await
        .with_context(|| format!("GET {}", config.chart_url))?;

    let status = response.status();
    let html = response
        .text()
        .await
        .with_context(|| format!("read body: {}", config.chart_url))?;
    Ok((status, html))
}

pub async fn run(args: FetchArgs) -> anyhow::Result<()> {
    let out = PathBuf::from(&args.out);
    if out.exists() {
        anyhow::bail!("raw html output already exists: {}", out.display());
    }

    let config = FetchConfig::from_env(args.url.as_deref())?;
    let fetched = fetch_chart(&config).await.context("fetch chart")?;
    crate::raw_store::write_raw_html(&out, &fetched.html)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    fn spawn_chart_server(
        first_body: &'static str,
        first_status: u16,
    ) -> (String, mpsc::Receiver<String>, mpsc::Sender<()>, thread::JoinHandle<()>) {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base_url = format!("http://{}", server.server_addr());
        let (lang_tx, lang_rx) = mpsc::channel::<String>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let mut served = 0_usize;
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let language = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Accept-Language"))
                    .map(|h| h.value.as_str().to_owned())
                    .unwrap_or_default();
                let _ = lang_tx.send(language);

                let response = if served == 0 {
                    tiny_http::Response::from_string(first_body).with_status_code(first_status)
                } else {
                    tiny_http::Response::from_string("x".repeat(MIN_PLAUSIBLE_BODY))
                        .with_status_code(200)
                };
                served += 1;
                let _ = request.respond(response);
            }
        });

        (base_url, lang_rx, shutdown_tx, handle)
    }

    #[tokio::test]
    async fn short_first_response_retries_with_english() {
        let (base_url, lang_rx, shutdown_tx, handle) = spawn_chart_server("", 202);
        let config = FetchConfig::new(Url::parse(&format!("{base_url}/chart/top/")).unwrap());

        let fetched = fetch_chart(&config).await.unwrap();
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.html.len(), MIN_PLAUSIBLE_BODY);

        let languages: Vec<String> = lang_rx.try_iter().collect();
        assert_eq!(languages, vec![PRIMARY_LANGUAGE, FALLBACK_LANGUAGE]);

        let _ = shutdown_tx.send(());
        let _ = handle.join();
    }

    #[tokio::test]
    async fn server_errors_surface_after_retry() {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base_url = format!("http://{}", server.server_addr());
        let handle = thread::spawn(move || {
            for _ in 0..2 {
                if let Ok(request) = server.recv() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("gone").with_status_code(503),
                    );
                }
            }
        });

        let config = FetchConfig::new(Url::parse(&format!("{base_url}/chart/top/")).unwrap());
        let err = fetch_chart(&config).await.unwrap_err();
        assert!(err.to_string().contains("503"));
        let _ = handle.join();
    }

    #[test]
    fn chart_url_must_be_http() {
        assert!(parse_chart_url("ftp://example.com/chart").is_err());
        assert!(parse_chart_url("not a url").is_err());
        assert_eq!(
            parse_chart_url(" https://www.imdb.com/chart/top/ ").unwrap().as_str(),
            DEFAULT_CHART_URL
        );
    }

    #[test]
    fn fallback_triggers_on_accepted_or_short_bodies() {
        let full = "x".repeat(MIN_PLAUSIBLE_BODY);
        assert!(needs_language_fallback(StatusCode::ACCEPTED, &full));
        assert!(needs_language_fallback(StatusCode::OK, "<html></html>"));
        assert!(!needs_language_fallback(StatusCode::OK, &full));
    }
}
