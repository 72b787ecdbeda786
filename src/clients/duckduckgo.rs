use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

use crate::config::QuizConfig;
use crate::core::{InstantAnswer, InstantAnswerResponse, RelatedTopic};
use crate::error::{ConfigError, TransportError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DuckDuckGoResponse {
    #[serde(default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<DuckDuckGoTopic>,
}

/// Related topics are either plain entries or named groups of entries; the
/// groups carry no `Text` and are skipped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DuckDuckGoTopic {
    text: Option<String>,
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
}

/// Client for the DuckDuckGo instant-answer API.
#[derive(Debug, Clone)]
pub struct DuckDuckGoClient {
    base_url: String,
    client: Client,
}

impl DuckDuckGoClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn from_config(config: &QuizConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.instant_answer_url.clone(), config.http_client()?))
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

impl From<DuckDuckGoResponse> for InstantAnswerResponse {
    fn from(r: DuckDuckGoResponse) -> Self {
        Self {
            abstract_text: non_empty(r.abstract_text),
            abstract_url: non_empty(r.abstract_url),
            related_topics: r
                .related_topics
                .into_iter()
                .filter(|t| t.text.is_some())
                .map(|t| RelatedTopic { text: t.text, url: t.first_url })
                .collect(),
        }
    }
}

#[async_trait]
impl InstantAnswer for DuckDuckGoClient {
    #[instrument(skip(self))]
    async fn lookup(&self, query: &str) -> Result<InstantAnswerResponse, TransportError> {
        if query.trim().is_empty() {
            return Ok(InstantAnswerResponse::default());
        }

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Instant answer request failed");
                TransportError::from(e)
            })?;

        if response.status() == 429 {
            return Err(TransportError::RateLimit);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        // The API sometimes answers with `application/x-javascript`, so decode from text.
        let body = response.text().await?;
        let parsed: DuckDuckGoResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse instant answer JSON");
            TransportError::Decode(e.to_string())
        })?;

        let answer = InstantAnswerResponse::from(parsed);
        debug!(
            has_abstract = answer.abstract_text.is_some(),
            related = answer.related_topics.len(),
            "Instant answer lookup completed"
        );
        Ok(answer)
    }

    fn clone_box(&self) -> Box<dyn InstantAnswer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_payload_and_skips_topic_groups() {
        let body = r#"{
            "AbstractText": "",
            "AbstractURL": "",
            "RelatedTopics": [
                {"Name": "Planets", "Topics": []},
                {"Text": "Mercury - smallest planet", "FirstURL": "https://duckduckgo.com/Mercury"}
            ]
        }"#;
        let parsed: DuckDuckGoResponse = serde_json::from_str(body).unwrap();
        let answer = InstantAnswerResponse::from(parsed);
        assert!(answer.abstract_text.is_none());
        assert_eq!(answer.related_topics.len(), 1);
        assert_eq!(
            answer.passage(),
            Some(("Mercury - smallest planet", Some("https://duckduckgo.com/Mercury")))
        );
    }
}
