#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Once};

use trivia_quiz::cache::{FileStore, MemoryStore};
use trivia_quiz::clients::mock::{mock_knowledge, MockEncyclopedia, MockInstantAnswer, MockKnowledgeHandle, MockTrivia, MockTriviaHandle};
use trivia_quiz::question::RawQuestion;
use trivia_quiz::{ExplanationResolver, QuestionLoader};

static INIT: Once = Once::new();

/// Route pipeline logs to the test harness; `RUST_LOG` controls verbosity.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn raw(question: &str, correct: &str, incorrect: &[&str]) -> RawQuestion {
    RawQuestion {
        question: question.to_string(),
        correct_answer: correct.to_string(),
        incorrect_answers: incorrect.iter().map(|s| s.to_string()).collect(),
        category: "General Knowledge".to_string(),
        difficulty: "easy".to_string(),
    }
}

pub type TestLoader = QuestionLoader<MockTrivia, Arc<MemoryStore>>;

/// Loader over a mock trivia source and a shared in-memory store.
pub fn create_test_loader() -> (TestLoader, Arc<MockTriviaHandle>, Arc<MemoryStore>) {
    init_test_logging();
    let (source, handle) = MockTrivia::new();
    let store = Arc::new(MemoryStore::new());
    (QuestionLoader::new(source, store.clone()), handle, store)
}

/// Loader over a mock trivia source and an on-disk store rooted at `dir`.
pub fn create_file_loader(dir: &Path) -> (QuestionLoader<MockTrivia, FileStore>, Arc<MockTriviaHandle>) {
    init_test_logging();
    let (source, handle) = MockTrivia::new();
    (QuestionLoader::new(source, FileStore::new(dir)), handle)
}

pub type TestResolver = ExplanationResolver<MockEncyclopedia, MockInstantAnswer>;

/// Resolver over mock knowledge sources. Unconfigured lookups fail.
pub fn create_test_resolver() -> (TestResolver, Arc<MockKnowledgeHandle>) {
    init_test_logging();
    let (encyclopedia, instant, handle) = mock_knowledge();
    (ExplanationResolver::new(encyclopedia, instant), handle)
}
