//! Explanation resolution for a submitted answer.
//!
//! Candidate search terms are derived from the answer and question, then each
//! candidate is tried against the knowledge sources in a fixed order. The first
//! non-empty passage wins; when everything comes up empty a synthesized
//! explanation is returned instead.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::clients::wikipedia::WikipediaClient;
use crate::config::{QuizConfig, DEFAULT_SEARCH_FALLBACK_URL, DEFAULT_WIKIPEDIA_URL};
use crate::core::{Encyclopedia, InstantAnswer, PageSummary};
use crate::error::TransportError;
use crate::question::Question;

/// Snippets shorter than this are widened to the character budget.
pub const SNIPPET_FLOOR_CHARS: usize = 80;

const ELLIPSIS: char = '…';
const QUOTE_CHARS: &[char] = &['"', '\'', '“', '”', '‘', '’', '`'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainRequest {
    pub question_text: String,
    pub correct_answer: String,
    /// "{category} • {difficulty}", used by the synthesized fallback.
    pub meta: String,
}

impl ExplainRequest {
    pub fn new(question_text: impl Into<String>, correct_answer: impl Into<String>, meta: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            correct_answer: correct_answer.into(),
            meta: meta.into(),
        }
    }
}

impl From<&Question> for ExplainRequest {
    fn from(q: &Question) -> Self {
        Self::new(q.text.clone(), q.correct_answer().to_string(), q.meta.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationSource {
    Encyclopedia,
    InstantAnswer,
    EncyclopediaSearch,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub text: String,
    /// "Read more" link; always present, a generic search link at worst.
    pub source_url: String,
    pub source: ExplanationSource,
}

impl Explanation {
    pub fn snippet(&self, max_sentences: usize, max_chars: usize) -> String {
        make_snippet(&self.text, max_sentences, max_chars)
    }
}

/// An external lookup tried for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Summary,
    InstantAnswer,
    SearchThenSummary,
}

impl Lookup {
    fn source(self) -> ExplanationSource {
        match self {
            Self::Summary => ExplanationSource::Encyclopedia,
            Self::InstantAnswer => ExplanationSource::InstantAnswer,
            Self::SearchThenSummary => ExplanationSource::EncyclopediaSearch,
        }
    }
}

/// Lookup order applied to every candidate.
const LOOKUP_ORDER: [Lookup; 3] = [Lookup::Summary, Lookup::InstantAnswer, Lookup::SearchThenSummary];

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_parenthesized(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn first_words(s: &str, n: usize) -> String {
    s.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// Ordered, de-duplicated search terms for an answer. Earlier terms are more
/// specific. Terms are whitespace-normalized; empty terms are dropped.
pub fn search_candidates(question_text: &str, correct_answer: &str) -> Vec<String> {
    let variants = [
        correct_answer.to_string(),
        strip_parenthesized(correct_answer),
        correct_answer.replace(QUOTE_CHARS, ""),
        question_text.to_string(),
        format!("{} {}", correct_answer, question_text),
        first_words(question_text, 3),
        first_words(correct_answer, 2),
    ];

    let mut out: Vec<String> = Vec::with_capacity(variants.len());
    for variant in variants {
        let term = collapse_whitespace(&variant);
        if !term.is_empty() && !out.contains(&term) {
            out.push(term);
        }
    }
    out
}

/// Shorten `text` to its first `max_sentences` sentences, capped at `max_chars`.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or end of text.
/// If the sentence-limited snippet is under `SNIPPET_FLOOR_CHARS` while the text
/// is longer, the character budget is used instead. A snippet cut by the
/// character budget ends with `…` and never exceeds `max_chars` characters.
pub fn make_snippet(text: &str, max_sentences: usize, max_chars: usize) -> String {
    let text = text.trim();
    if max_chars == 0 {
        return String::new();
    }

    let mut end = 0;
    let mut sentences = 0;
    let mut chars = text.char_indices().peekable();
    while sentences < max_sentences {
        let Some((i, c)) = chars.next() else {
            end = text.len();
            break;
        };
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
            if at_boundary {
                sentences += 1;
                end = i + c.len_utf8();
            }
        }
    }

    let mut snippet = text[..end].trim_end();
    if snippet.chars().count() < SNIPPET_FLOOR_CHARS && snippet.len() < text.len() {
        snippet = text;
    }
    truncate_chars(snippet, max_chars)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    let mut out = cut.trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

/// Resolves an explanation by querying an encyclopedia and an instant-answer
/// service, strictly one call at a time.
#[derive(Debug, Clone)]
pub struct ExplanationResolver<E: Encyclopedia, I: InstantAnswer> {
    encyclopedia: E,
    instant: I,
    encyclopedia_url: String,
    search_fallback_url: String,
}

impl<E: Encyclopedia, I: InstantAnswer> ExplanationResolver<E, I> {
    pub fn new(encyclopedia: E, instant: I) -> Self {
        Self {
            encyclopedia,
            instant,
            encyclopedia_url: DEFAULT_WIKIPEDIA_URL.to_string(),
            search_fallback_url: DEFAULT_SEARCH_FALLBACK_URL.to_string(),
        }
    }

    /// Take link bases from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &QuizConfig) -> Self {
        self.encyclopedia_url = config.wikipedia_url.clone();
        self.search_fallback_url = config.search_fallback_url.clone();
        self
    }

    /// Generic web-search link for `query`.
    pub fn search_link(&self, query: &str) -> String {
        format!("{}?q={}", self.search_fallback_url, urlencoding::encode(query.trim()))
    }

    /// Resolve one explanation. Returns `None` only when `cancel` fires before
    /// the result is delivered; otherwise always `Some`, falling back to a
    /// synthesized explanation when no source has anything.
    #[instrument(skip(self, request, cancel), fields(answer = %request.correct_answer))]
    pub async fn resolve(&self, request: &ExplainRequest, cancel: &CancellationToken) -> Option<Explanation> {
        let candidates = search_candidates(&request.question_text, &request.correct_answer);
        debug!(candidates = candidates.len(), "Derived search candidates");

        for (index, candidate) in candidates.iter().enumerate() {
            for lookup in LOOKUP_ORDER {
                if cancel.is_cancelled() {
                    debug!("Explanation cancelled");
                    return None;
                }
                match self.try_lookup(lookup, candidate, cancel).await {
                    Ok(Some(explanation)) => {
                        info!(candidate = index, lookup = ?lookup, "Resolved explanation");
                        return (!cancel.is_cancelled()).then_some(explanation);
                    }
                    Ok(None) => debug!(candidate = %candidate, lookup = ?lookup, "No result"),
                    Err(e) => warn!(candidate = %candidate, lookup = ?lookup, error = %e, "Lookup failed"),
                }
            }
        }

        info!("All sources exhausted, using fallback explanation");
        (!cancel.is_cancelled()).then(|| self.fallback(request))
    }

    /// The synthesized explanation used when every lookup comes up empty.
    pub fn fallback(&self, request: &ExplainRequest) -> Explanation {
        let answer = request.correct_answer.trim();
        let meta = request.meta.trim();
        let text = if meta.is_empty() {
            format!("The correct answer is \"{}\".", answer)
        } else {
            format!("The correct answer is \"{}\" ({}).", answer, meta)
        };
        Explanation {
            text,
            source_url: self.search_link(&request.question_text),
            source: ExplanationSource::Fallback,
        }
    }

    async fn try_lookup(
        &self,
        lookup: Lookup,
        candidate: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Explanation>, TransportError> {
        let source = lookup.source();
        match lookup {
            Lookup::Summary => {
                let summary = self.encyclopedia.summary(candidate).await?;
                Ok(summary.and_then(|s| self.from_summary(&s, candidate, source)))
            }
            Lookup::InstantAnswer => {
                let answer = self.instant.lookup(candidate).await?;
                Ok(answer.passage().map(|(text, url)| Explanation {
                    text: text.to_string(),
                    source_url: url.map_or_else(|| self.search_link(candidate), str::to_string),
                    source,
                }))
            }
            Lookup::SearchThenSummary => {
                let hits = self.encyclopedia.search(candidate).await?;
                let Some(top) = hits.first() else {
                    return Ok(None);
                };
                if cancel.is_cancelled() {
                    return Ok(None);
                }
                let summary = self.encyclopedia.summary(&top.title).await?;
                Ok(summary.and_then(|s| self.from_summary(&s, &top.title, source)))
            }
        }
    }

    fn from_summary(&self, summary: &PageSummary, title: &str, source: ExplanationSource) -> Option<Explanation> {
        let text = summary.passage()?;
        let title = if summary.title.trim().is_empty() { title } else { summary.title.as_str() };
        Some(Explanation {
            text: text.to_string(),
            source_url: summary
                .page_url
                .clone()
                .unwrap_or_else(|| WikipediaClient::page_url(&self.encyclopedia_url, title)),
            source,
        })
    }
}
