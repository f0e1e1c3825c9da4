use serde::{Deserialize, Serialize};

/// Number of answer options on every multiple-choice question.
pub const MCQ_OPTION_COUNT: u8 = 4;

/// The three question resources exposed by the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    Short,
    Long,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 3] = [QuestionKind::Mcq, QuestionKind::Short, QuestionKind::Long];

    /// Wire name, also the REST resource prefix (`/mcq/question/`).
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcq",
            QuestionKind::Short => "short",
            QuestionKind::Long => "long",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "MCQ",
            QuestionKind::Short => "Short",
            QuestionKind::Long => "Long",
        }
    }

    /// Position in `ALL`, used to index per-kind state.
    pub fn index(&self) -> usize {
        match self {
            QuestionKind::Mcq => 0,
            QuestionKind::Short => 1,
            QuestionKind::Long => 2,
        }
    }

    /// Get the next kind (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            QuestionKind::Mcq => QuestionKind::Short,
            QuestionKind::Short => QuestionKind::Long,
            QuestionKind::Long => QuestionKind::Mcq,
        }
    }

    /// Get the previous kind (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            QuestionKind::Mcq => QuestionKind::Long,
            QuestionKind::Short => QuestionKind::Mcq,
            QuestionKind::Long => QuestionKind::Short,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mcq" => Some(QuestionKind::Mcq),
            "short" => Some(QuestionKind::Short),
            "long" => Some(QuestionKind::Long),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two free-text question resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrittenKind {
    Short,
    Long,
}

impl From<WrittenKind> for QuestionKind {
    fn from(kind: WrittenKind) -> Self {
        match kind {
            WrittenKind::Short => QuestionKind::Short,
            WrittenKind::Long => QuestionKind::Long,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub class_name: String,
    pub subject: String,
    pub question: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    /// 1-based index of the correct option.
    pub correct_option: u8,
}

impl McqQuestion {
    /// Text of option `n` (1-based).
    pub fn option(&self, n: u8) -> Option<&str> {
        match n {
            1 => Some(&self.option1),
            2 => Some(&self.option2),
            3 => Some(&self.option3),
            4 => Some(&self.option4),
            _ => None,
        }
    }

    pub fn options(&self) -> [&str; 4] {
        [&self.option1, &self.option2, &self.option3, &self.option4]
    }

    pub fn correct_answer(&self) -> Option<&str> {
        self.option(self.correct_option)
    }

    /// Check the record before sending it to the question bank.
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if !(1..=MCQ_OPTION_COUNT).contains(&self.correct_option) {
            return Err(format!(
                "correct_option must be between 1 and {}, got {}",
                MCQ_OPTION_COUNT, self.correct_option
            ));
        }
        Ok(())
    }
}

/// A short- or long-answer question with its reference answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub class_name: String,
    pub subject: String,
    pub question: String,
    pub answer: String,
}

impl WrittenQuestion {
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.answer.trim().is_empty() {
            return Err("reference answer is empty".to_string());
        }
        Ok(())
    }
}

/// All three question lists for one (class, subject).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(default)]
    pub mcq: Vec<McqQuestion>,
    #[serde(default)]
    pub short: Vec<WrittenQuestion>,
    #[serde(default)]
    pub long: Vec<WrittenQuestion>,
}

impl QuestionSet {
    pub fn len(&self, kind: QuestionKind) -> usize {
        match kind {
            QuestionKind::Mcq => self.mcq.len(),
            QuestionKind::Short => self.short.len(),
            QuestionKind::Long => self.long.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mcq.is_empty() && self.short.is_empty() && self.long.is_empty()
    }

    pub fn total(&self) -> usize {
        self.mcq.len() + self.short.len() + self.long.len()
    }

    /// Written list for a free-text kind; `None` for MCQ.
    pub fn written(&self, kind: QuestionKind) -> Option<&[WrittenQuestion]> {
        match kind {
            QuestionKind::Mcq => None,
            QuestionKind::Short => Some(&self.short),
            QuestionKind::Long => Some(&self.long),
        }
    }
}
