//! Data models for question bank entities.
//!
//! - `McqQuestion`, `WrittenQuestion`: question records as served by the bank
//! - `QuestionSet`, `QuestionKind`: the three per-subject lists
//! - Assistant types: `AssistantRequest`, `AssistantReply`, `StudyPlan`, etc.

pub mod assistant;
pub mod question;

pub use assistant::{
    AssistantMode, AssistantReply, AssistantRequest, GeneratedAnswer, GeneratedMcq,
    GeneratedQuestions, RoadmapStep, StudyGame, StudyPlan,
};
pub use question::{
    McqQuestion, QuestionKind, QuestionSet, WrittenKind, WrittenQuestion, MCQ_OPTION_COUNT,
};
