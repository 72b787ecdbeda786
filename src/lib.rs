pub mod cache;
pub mod clients;
pub mod config;
pub mod core;
pub mod error;
pub mod explain;
pub mod html;
pub mod question;
pub mod questions;
pub mod session;

// Convenient re-exports
pub use explain::{make_snippet, search_candidates, ExplainRequest, Explanation, ExplanationResolver, ExplanationSource};
pub use question::{Category, Difficulty, Question, QuestionRequest};
pub use questions::{BatchOrigin, QuestionBatch, QuestionLoader};
pub use session::QuizSession;
pub use tokio_util::sync::CancellationToken;
