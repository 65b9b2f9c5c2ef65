use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

use super::query::SearchQuery;
use crate::core::config::FormDConfig;

// Hardcoded values
pub const SEARCH_URL: &str = "https://efts.sec.gov/LATEST/search-index";
pub const EDGAR_ARCHIVES_URL: &str = "https://www.sec.gov/Archives/edgar/data";
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";
pub const ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
pub const ORIGIN: &str = "https://www.sec.gov";
pub const REFERER: &str = "https://www.sec.gov/";

/// Failure of the search request. Only the message of the underlying error
/// survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl RequestFailure {
    pub fn new(message: impl Into<String>) -> Self {
        RequestFailure {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        RequestFailure {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "Request failed ({}): {}", status, self.message),
            None => write!(f, "Request failed: {}", self.message),
        }
    }
}

impl std::error::Error for RequestFailure {}

impl From<reqwest::Error> for RequestFailure {
    fn from(e: reqwest::Error) -> Self {
        RequestFailure {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

pub fn check_status(status: StatusCode) -> Result<(), RequestFailure> {
    if status.is_success() {
        Ok(())
    } else {
        Err(RequestFailure::with_status(
            status.as_u16(),
            format!("HTTP request failed with status: {}", status),
        ))
    }
}

#[async_trait]
pub trait FilingSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<String, RequestFailure>;

    async fn fetch_document(&self, url: &str) -> Result<String>;

    fn archives_url(&self) -> &str {
        EDGAR_ARCHIVES_URL
    }
}

pub struct EdgarClient {
    client: Client,
    user_agent: String,
    search_url: Url,
    archives_url: String,
}

impl EdgarClient {
    pub fn new(config: &FormDConfig) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            search_url: config.search_url.clone(),
            archives_url: config.archives_url.trim_end_matches('/').to_string(),
        })
    }

    // The search service rejects requests that don't look like a browser.
    fn request(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .header(header::ACCEPT, ACCEPT)
            .header(header::ORIGIN, ORIGIN)
            .header(header::REFERER, REFERER)
    }
}

#[async_trait]
impl FilingSource for EdgarClient {
    async fn search(&self, query: &SearchQuery) -> Result<String, RequestFailure> {
        let url = query.to_url(&self.search_url);
        log::debug!("Searching filings: {}", url);

        let response = self.request(url.as_str()).send().await?;
        log::debug!("Response status: {}", response.status());
        check_status(response.status())?;

        Ok(response.text().await?)
    }

    async fn fetch_document(&self, url: &str) -> Result<String> {
        log::debug!("Fetching URL: {}", url);

        let response = self.request(url).send().await?;
        log::debug!("Response status: {}", response.status());
        check_status(response.status())?;

        let content = response.text().await?;
        log::debug!("Received content length: {}", content.len());
        Ok(content)
    }

    fn archives_url(&self) -> &str {
        &self.archives_url
    }
}
