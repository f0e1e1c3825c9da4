//! Answer checking and per-list quiz progress.
//!
//! Written answers are compared after trimming and lowercasing; there is no
//! partial credit or fuzzy matching.

use crate::models::{McqQuestion, WrittenQuestion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    /// Wrong answer; `reference` is revealed to the user.
    Incorrect { reference: String },
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// `selected` is the 1-based option number.
pub fn grade_mcq(question: &McqQuestion, selected: u8) -> Verdict {
    if selected == question.correct_option {
        Verdict::Correct
    } else {
        Verdict::Incorrect {
            reference: question.correct_answer().unwrap_or_default().to_string(),
        }
    }
}

pub fn grade_short(question: &WrittenQuestion, input: &str) -> Verdict {
    if normalize(input) == normalize(&question.answer) {
        Verdict::Correct
    } else {
        Verdict::Incorrect {
            reference: question.answer.clone(),
        }
    }
}

/// Same rule as short answers, but blank input never counts.
pub fn grade_long(question: &WrittenQuestion, input: &str) -> Verdict {
    if input.trim().is_empty() {
        return Verdict::Incorrect {
            reference: question.answer.clone(),
        };
    }
    grade_short(question, input)
}

// ============================================================================
// Progress
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    /// Showing the current question, nothing entered yet.
    Idle,
    /// The user has started choosing or typing.
    Answering,
    Graded(Verdict),
    /// Past the last question.
    Finished,
}

/// Walks one question list: answer, get graded, then move on.
///
/// A correct answer advances with `next()`. An incorrect one stays on screen
/// with the reference answer until `retry()` or `skip()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    index: usize,
    len: usize,
    state: QuizState,
    correct: usize,
    graded: usize,
}

impl QuizProgress {
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            len,
            state: if len == 0 { QuizState::Finished } else { QuizState::Idle },
            correct: 0,
            graded: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == QuizState::Finished
    }

    pub fn correct_count(&self) -> usize {
        self.correct
    }

    pub fn graded_count(&self) -> usize {
        self.graded
    }

    /// The user started interacting with the current question.
    pub fn start_answering(&mut self) {
        if self.state == QuizState::Idle {
            self.state = QuizState::Answering;
        }
    }

    /// Record a verdict for the current question. Ignored once graded or finished.
    pub fn record(&mut self, verdict: Verdict) {
        if !matches!(self.state, QuizState::Idle | QuizState::Answering) {
            return;
        }
        self.graded += 1;
        if verdict.is_correct() {
            self.correct += 1;
        }
        self.state = QuizState::Graded(verdict);
    }

    /// Advance after a correct answer.
    pub fn next(&mut self) {
        if matches!(self.state, QuizState::Graded(Verdict::Correct)) {
            self.advance();
        }
    }

    /// Try the same question again after an incorrect answer.
    pub fn retry(&mut self) {
        if matches!(self.state, QuizState::Graded(Verdict::Incorrect { .. })) {
            self.state = QuizState::Answering;
        }
    }

    /// Move to the next question regardless of the current state.
    pub fn skip(&mut self) {
        if !self.is_finished() {
            self.advance();
        }
    }

    /// Start over from the first question.
    pub fn restart(&mut self) {
        *self = Self::new(self.len);
    }

    fn advance(&mut self) {
        self.index += 1;
        self.state = if self.index >= self.len {
            QuizState::Finished
        } else {
            QuizState::Idle
        };
    }
}
