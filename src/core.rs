//! Collaborator abstractions consumed by the quiz pipelines.
//!
//! Each external source is a small async trait. Real implementations live in
//! `clients`, in-memory doubles in `clients::mock` and `cache`. Every trait
//! object can be boxed and cloned so pipelines can be built over
//! `Box<dyn Trait>` as easily as over a concrete client.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, TransportError};
use crate::question::{QuestionRequest, TriviaResponse};

/// Encyclopedia page summary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageSummary {
    pub title: String,
    pub extract: Option<String>,
    pub description: Option<String>,
    pub page_url: Option<String>,
}

impl PageSummary {
    /// The explanatory passage: `extract`, else `description`. Blank text counts as absent.
    pub fn passage(&self) -> Option<&str> {
        non_blank(self.extract.as_deref()).or_else(|| non_blank(self.description.as_deref()))
    }
}

/// Ranked encyclopedia search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelatedTopic {
    pub text: Option<String>,
    pub url: Option<String>,
}

/// Instant-answer knowledge base response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstantAnswerResponse {
    pub abstract_text: Option<String>,
    pub abstract_url: Option<String>,
    pub related_topics: Vec<RelatedTopic>,
}

impl InstantAnswerResponse {
    /// The abstract if present, otherwise the first related topic with text,
    /// paired with whichever link belongs to it.
    pub fn passage(&self) -> Option<(&str, Option<&str>)> {
        if let Some(text) = non_blank(self.abstract_text.as_deref()) {
            return Some((text, non_blank(self.abstract_url.as_deref())));
        }
        self.related_topics.iter().find_map(|topic| {
            non_blank(topic.text.as_deref()).map(|text| (text, non_blank(topic.url.as_deref())))
        })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Source of raw trivia batches.
#[async_trait]
pub trait TriviaSource: Send + Sync + Debug {
    async fn fetch_questions(&self, request: &QuestionRequest) -> Result<TriviaResponse, TransportError>;

    fn clone_box(&self) -> Box<dyn TriviaSource>;
}

impl Clone for Box<dyn TriviaSource> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl TriviaSource for Box<dyn TriviaSource> {
    async fn fetch_questions(&self, request: &QuestionRequest) -> Result<TriviaResponse, TransportError> {
        self.as_ref().fetch_questions(request).await
    }

    fn clone_box(&self) -> Box<dyn TriviaSource> {
        self.as_ref().clone_box()
    }
}

/// Encyclopedia with title lookup and full-text search.
#[async_trait]
pub trait Encyclopedia: Send + Sync + Debug {
    /// Summary of the page titled `title`; `Ok(None)` when no such page exists.
    async fn summary(&self, title: &str) -> Result<Option<PageSummary>, TransportError>;

    /// Ranked titles matching `query`; empty on no match.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, TransportError>;

    fn clone_box(&self) -> Box<dyn Encyclopedia>;
}

impl Clone for Box<dyn Encyclopedia> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl Encyclopedia for Box<dyn Encyclopedia> {
    async fn summary(&self, title: &str) -> Result<Option<PageSummary>, TransportError> {
        self.as_ref().summary(title).await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, TransportError> {
        self.as_ref().search(query).await
    }

    fn clone_box(&self) -> Box<dyn Encyclopedia> {
        self.as_ref().clone_box()
    }
}

/// Instant-answer knowledge base queried by free text.
#[async_trait]
pub trait InstantAnswer: Send + Sync + Debug {
    async fn lookup(&self, query: &str) -> Result<InstantAnswerResponse, TransportError>;

    fn clone_box(&self) -> Box<dyn InstantAnswer>;
}

impl Clone for Box<dyn InstantAnswer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl InstantAnswer for Box<dyn InstantAnswer> {
    async fn lookup(&self, query: &str) -> Result<InstantAnswerResponse, TransportError> {
        self.as_ref().lookup(query).await
    }

    fn clone_box(&self) -> Box<dyn InstantAnswer> {
        self.as_ref().clone_box()
    }
}

/// Durable byte store. Writes replace the whole value under a key.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;
}

#[async_trait]
impl KeyValueStore for Box<dyn KeyValueStore> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.as_ref().get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.as_ref().set(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prefers_extract_over_description() {
        let mut s = PageSummary {
            title: "Mercury".into(),
            extract: Some("Mercury is a planet.".into()),
            description: Some("Planet".into()),
            page_url: None,
        };
        assert_eq!(s.passage(), Some("Mercury is a planet."));
        s.extract = Some("   ".into());
        assert_eq!(s.passage(), Some("Planet"));
        s.description = None;
        assert_eq!(s.passage(), None);
    }

    #[test]
    fn instant_answer_falls_back_to_related_topics() {
        let r = InstantAnswerResponse {
            abstract_text: Some(String::new()),
            abstract_url: Some("https://example.org/a".into()),
            related_topics: vec![
                RelatedTopic { text: None, url: None },
                RelatedTopic { text: Some("Topic".into()), url: Some("https://example.org/t".into()) },
            ],
        };
        assert_eq!(r.passage(), Some(("Topic", Some("https://example.org/t"))));
        assert_eq!(InstantAnswerResponse::default().passage(), None);
    }
}
