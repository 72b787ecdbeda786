//! Canonical quiz question model and normalization of raw trivia records.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::html::decode_entities;

/// Largest batch the trivia source serves in one request.
pub const MAX_QUESTIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(format!("Unknown difficulty: '{}'. Supported: easy, medium, hard", s)),
        }
    }
}

/// Trivia category filter. `Any` omits the category from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Any,
    Id(u32),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Id(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("any") {
            return Ok(Self::Any);
        }
        s.parse::<u32>()
            .map(Self::Id)
            .map_err(|_| format!("Unknown category: '{}'. Use 'any' or a numeric id", s))
    }
}

/// Parameters of one question batch request; also the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestionRequest {
    pub count: usize,
    pub difficulty: Difficulty,
    pub category: Category,
}

impl QuestionRequest {
    /// Build a request, clamping `count` to what the trivia source accepts.
    pub fn new(count: usize, difficulty: Difficulty, category: Category) -> Self {
        Self {
            count: count.clamp(1, MAX_QUESTIONS),
            difficulty,
            category,
        }
    }

    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("quiz_cache_{}_{}_{}", self.count, self.difficulty, self.category)
    }
}

/// One record as served by the trivia source, still HTML-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub question: String,
    pub correct_answer: String,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
}

/// Envelope of a trivia batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaResponse {
    pub response_code: i64,
    #[serde(default)]
    pub results: Vec<RawQuestion>,
}

/// A playable question. `choices[answer_index]` is the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
    /// "{category} • {difficulty}"
    pub meta: String,
}

impl Question {
    /// Decode, merge and shuffle a raw record into a playable question.
    pub fn from_raw<R: Rng + ?Sized>(raw: &RawQuestion, rng: &mut R) -> Self {
        let correct = decode_entities(&raw.correct_answer);

        let mut choices = Vec::with_capacity(raw.incorrect_answers.len() + 1);
        choices.push(correct.clone());
        choices.extend(raw.incorrect_answers.iter().map(|a| decode_entities(a)));
        choices.shuffle(rng);

        // An incorrect answer may decode to the same text as the correct one;
        // any matching slot is then a correct pick.
        let answer_index = choices.iter().position(|c| *c == correct).unwrap_or(0);

        Self {
            id: Uuid::new_v4(),
            text: decode_entities(&raw.question),
            choices,
            answer_index,
            meta: format_meta(&decode_entities(&raw.category), &raw.difficulty),
        }
    }

    /// The single built-in question served when neither network nor cache can.
    pub fn fixture() -> Self {
        Self {
            id: Uuid::new_v4(),
            text: "What is the capital of France?".to_string(),
            choices: vec![
                "Paris".to_string(),
                "London".to_string(),
                "Berlin".to_string(),
                "Madrid".to_string(),
            ],
            answer_index: 0,
            meta: format_meta("Geography", "easy"),
        }
    }

    /// The correct choice; empty if `answer_index` is out of range.
    #[must_use]
    pub fn correct_answer(&self) -> &str {
        self.choices.get(self.answer_index).map_or("", String::as_str)
    }

    /// Whether the question can be played: it has choices and
    /// `answer_index` points at one of them.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.answer_index < self.choices.len()
    }

    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        self.choices
            .get(choice)
            .map_or(false, |c| c == self.correct_answer())
    }
}

fn format_meta(category: &str, difficulty: &str) -> String {
    match (category.trim(), difficulty.trim()) {
        ("", "") => String::new(),
        (c, "") => c.to_string(),
        ("", d) => d.to_string(),
        (c, d) => format!("{} • {}", c, d),
    }
}
