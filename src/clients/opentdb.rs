use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

use crate::config::QuizConfig;
use crate::core::TriviaSource;
use crate::error::{ConfigError, TransportError};
use crate::question::{Category, QuestionRequest, TriviaResponse};

/// Response codes reported by the Open Trivia Database.
const CODE_SUCCESS: i64 = 0;
const CODE_NO_RESULTS: i64 = 1;
const CODE_INVALID_PARAMETER: i64 = 2;
const CODE_RATE_LIMIT: i64 = 5;

/// Client for the Open Trivia Database `api.php` endpoint.
#[derive(Debug, Clone)]
pub struct OpenTdbClient {
    base_url: String,
    client: Client,
}

impl OpenTdbClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Creating new trivia client");
        Self { base_url, client }
    }

    pub fn from_config(config: &QuizConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.trivia_url.clone(), config.http_client()?))
    }

    fn query_params(request: &QuestionRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("amount", request.count.to_string()),
            ("difficulty", request.difficulty.to_string()),
        ];
        if let Category::Id(id) = request.category {
            params.push(("category", id.to_string()));
        }
        params
    }
}

#[async_trait]
impl TriviaSource for OpenTdbClient {
    #[instrument(skip(self), fields(count = request.count, difficulty = %request.difficulty, category = %request.category))]
    async fn fetch_questions(&self, request: &QuestionRequest) -> Result<TriviaResponse, TransportError> {
        debug!("Sending request to trivia API");
        let response = self
            .client
            .get(format!("{}/api.php", self.base_url))
            .query(&Self::query_params(request))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                TransportError::from(e)
            })?;

        debug!(status = %response.status(), "Received response from trivia API");

        if response.status() == 429 {
            warn!("Trivia API rate limit exceeded");
            return Err(TransportError::RateLimit);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status, error = %body, "Trivia API error");
            return Err(TransportError::Status { status, body });
        }

        let trivia: TriviaResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse trivia response JSON");
            TransportError::Decode(e.to_string())
        })?;

        match trivia.response_code {
            CODE_SUCCESS => {
                info!(results = trivia.results.len(), "Received trivia batch");
                Ok(trivia)
            }
            CODE_RATE_LIMIT => {
                warn!("Trivia API reported rate limiting");
                Err(TransportError::RateLimit)
            }
            CODE_NO_RESULTS => Err(TransportError::Api("not enough questions for query".to_string())),
            CODE_INVALID_PARAMETER => Err(TransportError::Api("invalid parameter".to_string())),
            code => Err(TransportError::Api(format!("response_code {}", code))),
        }
    }

    fn clone_box(&self) -> Box<dyn TriviaSource> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::Difficulty;

    #[test]
    fn any_category_is_omitted() {
        let params = OpenTdbClient::query_params(&QuestionRequest::new(10, Difficulty::Medium, Category::Any));
        assert_eq!(params, vec![("amount", "10".to_string()), ("difficulty", "medium".to_string())]);

        let params = OpenTdbClient::query_params(&QuestionRequest::new(3, Difficulty::Hard, Category::Id(18)));
        assert_eq!(params.last(), Some(&("category", "18".to_string())));
    }

    #[test]
    fn decodes_trivia_payload() {
        let body = r#"{"response_code":0,"results":[{"type":"multiple","difficulty":"easy","category":"Math","question":"2+2?","correct_answer":"4","incorrect_answers":["3","5","6"]}]}"#;
        let parsed: TriviaResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].incorrect_answers, vec!["3", "5", "6"]);
    }
}
