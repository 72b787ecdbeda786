//! In-memory transports for tests and offline runs.
//!
//! Each constructor returns the transport plus a shared handle used to queue
//! responses and to inspect the calls made, in order.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::{Encyclopedia, InstantAnswer, InstantAnswerResponse, PageSummary, SearchHit, TriviaSource};
use crate::error::TransportError;
use crate::question::{QuestionRequest, RawQuestion, TriviaResponse};

fn unconfigured(what: &str) -> TransportError {
    TransportError::Http(format!("no mock response configured for {}", what))
}

#[derive(Debug, Default)]
struct TriviaState {
    responses: VecDeque<Result<TriviaResponse, TransportError>>,
    requests: Vec<QuestionRequest>,
    cancel_on_fetch: Option<CancellationToken>,
}

#[derive(Debug, Default)]
pub struct MockTriviaHandle {
    state: Mutex<TriviaState>,
}

impl MockTriviaHandle {
    pub fn add_response(&self, response: Result<TriviaResponse, TransportError>) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).responses.push_back(response);
    }

    /// Queue a successful batch built from raw records.
    pub fn add_batch(&self, results: Vec<RawQuestion>) {
        self.add_response(Ok(TriviaResponse { response_code: 0, results }));
    }

    pub fn add_failure(&self, error: TransportError) {
        self.add_response(Err(error));
    }

    /// Cancel `token` while the next fetch is in flight.
    pub fn cancel_on_fetch(&self, token: CancellationToken) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).cancel_on_fetch = Some(token);
    }

    pub fn requests(&self) -> Vec<QuestionRequest> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).requests.clone()
    }
}

#[derive(Debug, Clone)]
pub struct MockTrivia {
    handle: Arc<MockTriviaHandle>,
}

impl MockTrivia {
    pub fn new() -> (Self, Arc<MockTriviaHandle>) {
        let handle = Arc::new(MockTriviaHandle::default());
        (Self { handle: handle.clone() }, handle)
    }
}

#[async_trait]
impl TriviaSource for MockTrivia {
    async fn fetch_questions(&self, request: &QuestionRequest) -> Result<TriviaResponse, TransportError> {
        let mut state = self.handle.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.requests.push(*request);
        if let Some(token) = state.cancel_on_fetch.take() {
            token.cancel();
        }
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(unconfigured("trivia fetch")))
    }

    fn clone_box(&self) -> Box<dyn TriviaSource> {
        Box::new(self.clone())
    }
}

/// A call observed by the knowledge mocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Summary(String),
    Search(String),
    InstantAnswer(String),
}

#[derive(Debug, Default)]
struct KnowledgeState {
    summaries: HashMap<String, Result<Option<PageSummary>, TransportError>>,
    searches: HashMap<String, Result<Vec<SearchHit>, TransportError>>,
    answers: HashMap<String, Result<InstantAnswerResponse, TransportError>>,
    calls: Vec<MockCall>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl KnowledgeState {
    fn record(&mut self, call: MockCall) {
        self.calls.push(call);
        if let Some((n, token)) = &self.cancel_after {
            if self.calls.len() >= *n {
                token.cancel();
            }
        }
    }
}

/// Shared handle behind `MockEncyclopedia` and `MockInstantAnswer`, so the
/// call log reflects the interleaving across both sources.
#[derive(Debug, Default)]
pub struct MockKnowledgeHandle {
    state: Mutex<KnowledgeState>,
}

impl MockKnowledgeHandle {
    pub fn set_summary(&self, title: &str, response: Result<Option<PageSummary>, TransportError>) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).summaries.insert(title.to_string(), response);
    }

    /// Convenience for a found page with an extract.
    pub fn add_page(&self, title: &str, extract: &str, page_url: Option<&str>) {
        self.set_summary(
            title,
            Ok(Some(PageSummary {
                title: title.to_string(),
                extract: Some(extract.to_string()),
                description: None,
                page_url: page_url.map(str::to_string),
            })),
        );
    }

    pub fn set_search(&self, query: &str, response: Result<Vec<SearchHit>, TransportError>) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).searches.insert(query.to_string(), response);
    }

    pub fn set_instant_answer(&self, query: &str, response: Result<InstantAnswerResponse, TransportError>) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).answers.insert(query.to_string(), response);
    }

    /// Cancel `token` once `calls` lookups have been made.
    pub fn cancel_after(&self, calls: usize, token: CancellationToken) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).cancel_after = Some((calls, token));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).calls.clone()
    }
}

#[derive(Debug, Clone)]
pub struct MockEncyclopedia {
    handle: Arc<MockKnowledgeHandle>,
}

#[derive(Debug, Clone)]
pub struct MockInstantAnswer {
    handle: Arc<MockKnowledgeHandle>,
}

/// Build an encyclopedia and an instant-answer mock over one handle.
pub fn mock_knowledge() -> (MockEncyclopedia, MockInstantAnswer, Arc<MockKnowledgeHandle>) {
    let handle = Arc::new(MockKnowledgeHandle::default());
    (
        MockEncyclopedia { handle: handle.clone() },
        MockInstantAnswer { handle: handle.clone() },
        handle,
    )
}

#[async_trait]
impl Encyclopedia for MockEncyclopedia {
    async fn summary(&self, title: &str) -> Result<Option<PageSummary>, TransportError> {
        let mut state = self.handle.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.record(MockCall::Summary(title.to_string()));
        state
            .summaries
            .get(title)
            .cloned()
            .unwrap_or_else(|| Err(unconfigured("summary")))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, TransportError> {
        let mut state = self.handle.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.record(MockCall::Search(query.to_string()));
        state
            .searches
            .get(query)
            .cloned()
            .unwrap_or_else(|| Err(unconfigured("search")))
    }

    fn clone_box(&self) -> Box<dyn Encyclopedia> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl InstantAnswer for MockInstantAnswer {
    async fn lookup(&self, query: &str) -> Result<InstantAnswerResponse, TransportError> {
        let mut state = self.handle.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.record(MockCall::InstantAnswer(query.to_string()));
        state
            .answers
            .get(query)
            .cloned()
            .unwrap_or_else(|| Err(unconfigured("instant answer")))
    }

    fn clone_box(&self) -> Box<dyn InstantAnswer> {
        Box::new(self.clone())
    }
}
