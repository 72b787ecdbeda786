//! Per-quiz session state, created at quiz start and owned by the caller.

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::explain::ExplainRequest;
use crate::question::Question;
use crate::questions::{BatchOrigin, QuestionBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub chosen: usize,
    pub correct_index: usize,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSummary {
    pub score: usize,
    pub total: usize,
    pub percent: u8,
    pub verdict: &'static str,
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}%) {}", self.score, self.total, self.percent, self.verdict)
    }
}

fn verdict(percent: u8) -> &'static str {
    match percent {
        100 => "Perfect score!",
        80..=99 => "Great job!",
        50..=79 => "Not bad!",
        _ => "Keep practicing!",
    }
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    origin: BatchOrigin,
    answers: Vec<Option<usize>>,
    index: usize,
}

impl QuizSession {
    pub fn new(batch: QuestionBatch) -> Self {
        info!(questions = batch.questions.len(), origin = ?batch.origin, "Starting quiz session");
        let answers = vec![None; batch.questions.len()];
        Self {
            questions: batch.questions,
            origin: batch.origin,
            answers,
            index: 0,
        }
    }

    pub fn origin(&self) -> BatchOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Zero-based position of the current question.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.questions.len()
    }

    pub fn select_and_submit(&mut self, choice: usize) -> Result<AnswerOutcome, SessionError> {
        let question = self.questions.get(self.index).ok_or(SessionError::Finished)?;
        if choice >= question.choices.len() {
            return Err(SessionError::ChoiceOutOfRange { choice, len: question.choices.len() });
        }
        if self.answers[self.index].is_some() {
            return Err(SessionError::AlreadyAnswered(self.index));
        }

        let outcome = AnswerOutcome {
            chosen: choice,
            correct_index: question.answer_index,
            correct: question.is_correct(choice),
        };
        self.answers[self.index] = Some(choice);
        debug!(question = self.index, correct = outcome.correct, "Answer submitted");
        Ok(outcome)
    }

    /// Explanation lookup parameters for the current question.
    pub fn explain_request(&self) -> Option<ExplainRequest> {
        self.current().map(ExplainRequest::from)
    }

    /// Move to the next question. Returns `false` once the quiz is over.
    pub fn advance(&mut self) -> bool {
        if self.index < self.questions.len() {
            self.index += 1;
        }
        !self.is_finished()
    }

    pub fn score(&self) -> usize {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| a.map_or(false, |choice| q.is_correct(choice)))
            .count()
    }

    pub fn summary(&self) -> ScoreSummary {
        let score = self.score();
        let total = self.questions.len();
        let percent = if total == 0 { 0 } else { (score * 100 / total) as u8 };
        ScoreSummary { score, total, percent, verdict: verdict(percent) }
    }

    /// Plain-text message for sharing the result.
    pub fn share_text(&self) -> String {
        let s = self.summary();
        format!(
            "I scored {}/{} ({}%) on Trivia Quiz! {}",
            s.score, s.total, s.percent, s.verdict
        )
    }

    /// Play again with the same questions.
    pub fn restart(&mut self) {
        info!("Restarting quiz session");
        self.answers.iter_mut().for_each(|a| *a = None);
        self.index = 0;
    }

    /// Index of one incorrect choice to eliminate for question `index`.
    ///
    /// The pick is pseudo-random but seeded by the question id, so the same
    /// question always offers the same hint. Questions with fewer than three
    /// choices get no hint.
    pub fn hint(&self, index: usize) -> Option<usize> {
        let question = self.questions.get(index)?;
        if question.choices.len() < 3 {
            return None;
        }
        let wrong: Vec<usize> = (0..question.choices.len())
            .filter(|&i| !question.is_correct(i))
            .collect();

        let id = question.id.as_u128();
        let mut rng = StdRng::seed_from_u64((id as u64) ^ ((id >> 64) as u64));
        wrong.choose(&mut rng).copied()
    }
}
