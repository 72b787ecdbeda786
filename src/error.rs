use thiserror::Error;

/// Failure of a single call to an external knowledge or trivia source.
///
/// The pipelines never surface these to callers; they are absorbed and
/// logged, and the next fallback step runs instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("API error: {0}")]
    Api(String),
    #[error("Malformed payload: {0}")]
    Decode(String),
    #[error("Rate limit exceeded")]
    RateLimit,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache payload error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Choice {choice} out of range (question has {len} choices)")]
    ChoiceOutOfRange { choice: usize, len: usize },
    #[error("Question {0} was already answered")]
    AlreadyAnswered(usize),
    #[error("Quiz is finished")]
    Finished,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
