use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

use crate::config::QuizConfig;
use crate::core::{Encyclopedia, PageSummary, SearchHit};
use crate::error::{ConfigError, TransportError};

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    title: String,
    extract: Option<String>,
    description: Option<String>,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrls>,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

/// Wikipedia REST summary lookup plus `action=query` full-text search.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    base_url: String,
    client: Client,
}

impl WikipediaClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn from_config(config: &QuizConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.wikipedia_url.clone(), config.http_client()?))
    }

    /// Page URL for a title, used when the summary carries no link of its own.
    pub fn page_url(base_url: &str, title: &str) -> String {
        format!("{}/wiki/{}", base_url.trim_end_matches('/'), title_slug(title))
    }

    fn summary_url(&self, title: &str) -> String {
        format!("{}/api/rest_v1/page/summary/{}", self.base_url, title_slug(title))
    }
}

fn title_slug(title: &str) -> String {
    urlencoding::encode(&title.trim().replace(' ', "_")).into_owned()
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    #[instrument(skip(self))]
    async fn summary(&self, title: &str) -> Result<Option<PageSummary>, TransportError> {
        if title.trim().is_empty() {
            return Ok(None);
        }

        let response = self.client.get(self.summary_url(title)).send().await.map_err(|e| {
            warn!(error = %e, "Summary request failed");
            TransportError::from(e)
        })?;

        debug!(status = %response.status(), "Received summary response");

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimit);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let parsed: SummaryResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse summary JSON");
            TransportError::Decode(e.to_string())
        })?;

        let page_url = parsed
            .content_urls
            .and_then(|urls| urls.desktop)
            .and_then(|desktop| desktop.page);

        Ok(Some(PageSummary {
            title: if parsed.title.is_empty() { title.to_string() } else { parsed.title },
            extract: parsed.extract,
            description: parsed.description,
            page_url,
        }))
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, TransportError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("format", "json"),
                ("srlimit", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Search request failed");
                TransportError::from(e)
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse search JSON");
            TransportError::Decode(e.to_string())
        })?;

        let hits = parsed.query.map(|q| q.search).unwrap_or_default();
        debug!(hits = hits.len(), "Search completed");
        Ok(hits)
    }

    fn clone_box(&self) -> Box<dyn Encyclopedia> {
        Box::new(self.clone())
    }
}
