//! Question acquisition: network first, then the cached batch for the same
//! request, then the built-in fixture. Unless cancelled, `load` always yields
//! a playable batch.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::core::{KeyValueStore, TriviaSource};
use crate::error::TransportError;
use crate::question::{Question, QuestionRequest};

/// Where a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOrigin {
    Network,
    Cache,
    Fixture,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBatch {
    pub questions: Vec<Question>,
    pub origin: BatchOrigin,
}

impl QuestionBatch {
    pub fn is_degraded(&self) -> bool {
        self.origin != BatchOrigin::Network
    }
}

/// Persisted form of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedBatch {
    pub saved_at: DateTime<Utc>,
    pub questions: Vec<Question>,
}

pub struct QuestionLoader<T: TriviaSource, S: KeyValueStore> {
    source: T,
    store: S,
    rng: Mutex<StdRng>,
}

impl<T: TriviaSource, S: KeyValueStore> std::fmt::Debug for QuestionLoader<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionLoader")
            .field("source", &self.source)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<T: TriviaSource, S: KeyValueStore> QuestionLoader<T, S> {
    pub fn new(source: T, store: S) -> Self {
        Self {
            source,
            store,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use a fixed seed so answer shuffles are reproducible.
    #[must_use]
    pub fn with_rng_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn source(&self) -> &T {
        &self.source
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a batch for `request`. Exactly one network attempt is made.
    ///
    /// Returns `None` once `cancel` fires: nothing is delivered, the cache is
    /// neither written nor consulted afterwards.
    #[instrument(skip(self, cancel), fields(key = %request.cache_key()))]
    pub async fn load(&self, request: &QuestionRequest, cancel: &CancellationToken) -> Option<QuestionBatch> {
        if cancel.is_cancelled() {
            debug!("Load cancelled before fetch");
            return None;
        }
        let key = request.cache_key();

        let fetched = self.fetch(request).await;
        if cancel.is_cancelled() {
            debug!("Load cancelled, dropping result");
            return None;
        }

        match fetched {
            Ok(questions) => {
                info!(count = questions.len(), "Loaded questions from network");
                self.write_cache(&key, &questions).await;
                if cancel.is_cancelled() {
                    return None;
                }
                return Some(QuestionBatch { questions, origin: BatchOrigin::Network });
            }
            Err(e) => warn!(error = %e, "Question fetch failed, falling back to cache"),
        }

        let cached = self.read_cache(&key).await;
        if cancel.is_cancelled() {
            debug!("Load cancelled, dropping result");
            return None;
        }
        if let Some(questions) = cached {
            info!(count = questions.len(), "Serving cached questions");
            return Some(QuestionBatch { questions, origin: BatchOrigin::Cache });
        }

        warn!("No cached questions, serving fixture");
        Some(QuestionBatch {
            questions: vec![Question::fixture()],
            origin: BatchOrigin::Fixture,
        })
    }

    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, TransportError> {
        let response = self.source.fetch_questions(request).await?;
        if response.response_code != 0 {
            return Err(TransportError::Api(format!("response_code {}", response.response_code)));
        }
        if response.results.is_empty() {
            return Err(TransportError::Decode("no question records".to_string()));
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(response
            .results
            .iter()
            .map(|raw| Question::from_raw(raw, &mut *rng))
            .collect())
    }

    async fn write_cache(&self, key: &str, questions: &[Question]) {
        let entry = CachedBatch {
            saved_at: Utc::now(),
            questions: questions.to_vec(),
        };
        let bytes = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode question cache");
                return;
            }
        };
        if let Err(e) = self.store.set(key, bytes).await {
            warn!(error = %e, "Failed to write question cache");
        }
    }

    async fn read_cache(&self, key: &str) -> Option<Vec<Question>> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read question cache");
                return None;
            }
        };
        match serde_json::from_slice::<CachedBatch>(&bytes) {
            Ok(entry) if entry.questions.is_empty() => None,
            Ok(entry) if !entry.questions.iter().all(Question::is_playable) => {
                warn!(saved_at = %entry.saved_at, "Discarding cached batch with unplayable questions");
                None
            }
            Ok(entry) => {
                debug!(saved_at = %entry.saved_at, "Decoded cached batch");
                Some(entry.questions)
            }
            Err(e) => {
                warn!(error = %e, "Discarding undecodable question cache");
                None
            }
        }
    }
}
