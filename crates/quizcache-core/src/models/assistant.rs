//! Request and reply shapes for the assistant proxy endpoint.
//!
//! Every request carries a `mode` discriminator. Replies are loosely shaped
//! JSON produced by a language model, so every reply type deserializes with
//! defaults and the parsers below never fail.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::question::{McqQuestion, WrittenQuestion, MCQ_OPTION_COUNT};

/// Request body sent to the assistant proxy, tagged by `mode`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AssistantRequest {
    /// Free-form question and answer.
    Chat { prompt: String },
    /// Structured question generation for a subject/chapter.
    GenerateQuestions {
        class_name: String,
        subject: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        chapter: Option<String>,
        count: u32,
    },
    /// Study plan for a chapter or topic.
    StudyPlan { prompt: String },
    /// Question asked while reading a textbook page.
    PdfChat {
        subject: String,
        #[serde(rename = "subjectLabel")]
        subject_label: String,
        #[serde(rename = "currentPage")]
        current_page: u32,
        question: String,
        context: String,
    },
}

impl AssistantRequest {
    pub fn mode(&self) -> AssistantMode {
        match self {
            AssistantRequest::Chat { .. } => AssistantMode::Chat,
            AssistantRequest::GenerateQuestions { .. } => AssistantMode::GenerateQuestions,
            AssistantRequest::StudyPlan { .. } => AssistantMode::StudyPlan,
            AssistantRequest::PdfChat { .. } => AssistantMode::PdfChat,
        }
    }

    /// Study plan prompt in the `class: .., subject: .., chapter: ..` form the proxy expects.
    pub fn study_plan(class_name: &str, subject: &str, chapter: &str) -> Self {
        AssistantRequest::StudyPlan {
            prompt: format!("class: {}, subject: {}, chapter: {}", class_name, subject, chapter),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantMode {
    Chat,
    GenerateQuestions,
    StudyPlan,
    PdfChat,
}

/// Parsed reply, one variant per reply family.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    Text(String),
    Questions(GeneratedQuestions),
    Plan(StudyPlan),
}

impl AssistantReply {
    /// Parse a raw reply for the given mode. Unknown shapes produce empty values.
    pub fn parse(mode: AssistantMode, value: &Value) -> Self {
        match mode {
            AssistantMode::Chat | AssistantMode::PdfChat => AssistantReply::Text(extract_text(value)),
            AssistantMode::GenerateQuestions => {
                AssistantReply::Questions(GeneratedQuestions::from_value(value))
            }
            AssistantMode::StudyPlan => AssistantReply::Plan(StudyPlan::from_value(value)),
        }
    }
}

/// Pull the answer text out of whatever the proxy returned.
///
/// Checked in order: `text`, `response`, `result[0].generated_text`,
/// `result` as a string, then the raw JSON.
pub fn extract_text(value: &Value) -> String {
    if let Some(text) = value.get("text").and_then(Value::as_str) {
        return text.trim().to_string();
    }
    if let Some(text) = value.get("response").and_then(Value::as_str) {
        return text.trim().to_string();
    }
    match value.get("result") {
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("generated_text"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| Value::Array(items.clone()).to_string()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => match value {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

// ============================================================================
// Generated questions
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneratedQuestions {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub mcq: Vec<GeneratedMcq>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub short: Vec<GeneratedAnswer>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub long: Vec<GeneratedAnswer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneratedMcq {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// 1-based index, when the model answered with a number.
    #[serde(default)]
    pub correct_option: Option<u8>,
    /// Answer text, when the model answered with the option itself.
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneratedAnswer {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl GeneratedQuestions {
    /// Accepts the lists at the top level or nested under `questions`/`result`.
    pub fn from_value(value: &Value) -> Self {
        let candidates = [Some(value), value.get("questions"), value.get("result")];
        for candidate in candidates.into_iter().flatten() {
            if candidate.get("mcq").is_some()
                || candidate.get("short").is_some()
                || candidate.get("long").is_some()
            {
                return serde_json::from_value(candidate.clone()).unwrap_or_default();
            }
        }
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mcq.is_empty() && self.short.is_empty() && self.long.is_empty()
    }

    /// Convert into quiz records, dropping items that cannot be graded.
    pub fn into_records(
        self,
        class_name: &str,
        subject: &str,
    ) -> (Vec<McqQuestion>, Vec<WrittenQuestion>, Vec<WrittenQuestion>) {
        let mcq = self
            .mcq
            .into_iter()
            .filter_map(|q| q.into_mcq(class_name, subject))
            .collect();
        let to_written = |items: Vec<GeneratedAnswer>| -> Vec<WrittenQuestion> {
            items
                .into_iter()
                .filter(|q| !q.question.trim().is_empty() && !q.answer.trim().is_empty())
                .map(|q| WrittenQuestion {
                    id: None,
                    class_name: class_name.to_string(),
                    subject: subject.to_string(),
                    question: q.question,
                    answer: q.answer,
                })
                .collect()
        };
        (mcq, to_written(self.short), to_written(self.long))
    }
}

impl GeneratedMcq {
    pub fn into_mcq(self, class_name: &str, subject: &str) -> Option<McqQuestion> {
        if self.question.trim().is_empty() || self.options.len() != MCQ_OPTION_COUNT as usize {
            return None;
        }
        let correct_option = match (self.correct_option, self.answer.as_deref()) {
            (Some(n), _) if (1..=MCQ_OPTION_COUNT).contains(&n) => n,
            (_, Some(answer)) => {
                let answer = answer.trim().to_lowercase();
                let pos = self
                    .options
                    .iter()
                    .position(|opt| opt.trim().to_lowercase() == answer)?;
                pos as u8 + 1
            }
            _ => return None,
        };
        let mut options = self.options.into_iter();
        Some(McqQuestion {
            id: None,
            class_name: class_name.to_string(),
            subject: subject.to_string(),
            question: self.question,
            option1: options.next()?,
            option2: options.next()?,
            option3: options.next()?,
            option4: options.next()?,
            correct_option,
        })
    }
}

// ============================================================================
// Study plan
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    #[serde(default)]
    pub overview: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub roadmap: Vec<RoadmapStep>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub game: Option<StudyGame>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadmapStep {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyGame {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl StudyPlan {
    /// The plan lives under `plan`; a bare plan object is accepted too.
    pub fn from_value(value: &Value) -> Self {
        let plan = match value.get("plan") {
            Some(plan) if plan.is_object() => plan,
            _ => value,
        };
        if !plan.is_object() {
            return Self::default();
        }
        serde_json::from_value(plan.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.overview.is_empty()
            && self.roadmap.is_empty()
            && self.key_points.is_empty()
            && self.game.is_none()
    }
}

/// Deserialize a list, keeping only the items that parse and treating
/// non-array values as empty.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_is_tagged_by_mode() {
        let req = AssistantRequest::study_plan("nine", "bangla", "কবিতা");
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["mode"], "study_plan");
        assert_eq!(body["prompt"], "class: nine, subject: bangla, chapter: কবিতা");

        let req = AssistantRequest::PdfChat {
            subject: "math".to_string(),
            subject_label: "গণিত".to_string(),
            current_page: 12,
            question: "Explain".to_string(),
            context: "page 12".to_string(),
        };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["mode"], "pdf_chat");
        assert_eq!(body["currentPage"], 12);
        assert_eq!(body["subjectLabel"], "গণিত");
    }

    #[test]
    fn test_extract_text_variants() {
        assert_eq!(extract_text(&json!({"text": " hi "})), "hi");
        assert_eq!(extract_text(&json!({"response": "page answer"})), "page answer");
        assert_eq!(
            extract_text(&json!({"result": [{"generated_text": "generated"}]})),
            "generated"
        );
        assert_eq!(extract_text(&json!({"result": "plain"})), "plain");
        assert_eq!(extract_text(&Value::Null), "");
    }

    #[test]
    fn test_generated_questions_nested_and_malformed() {
        let value = json!({
            "questions": {
                "mcq": [
                    {"question": "2+2?", "options": ["1", "2", "3", "4"], "answer": "4"},
                    "not an object"
                ],
                "short": [{"question": "Capital?", "answer": "Dhaka"}],
                "long": "oops"
            }
        });
        let parsed = GeneratedQuestions::from_value(&value);
        assert_eq!(parsed.mcq.len(), 1);
        assert_eq!(parsed.short.len(), 1);
        assert!(parsed.long.is_empty());

        let (mcq, short, long) = parsed.into_records("nine", "math");
        assert_eq!(mcq[0].correct_option, 4);
        assert_eq!(short[0].subject, "math");
        assert!(long.is_empty());
    }

    #[test]
    fn test_generated_mcq_requires_four_options() {
        let q = GeneratedMcq {
            question: "Q".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            correct_option: Some(1),
            answer: None,
        };
        assert!(q.into_mcq("nine", "bangla").is_none());
    }

    #[test]
    fn test_study_plan_fallbacks() {
        let value = json!({
            "plan": {
                "overview": "Read twice",
                "roadmap": [{"title": "Skim"}, {"title": "Practice", "details": "10 MCQs"}],
                "key_points": ["metre", "rhyme"],
                "game": {"description": "Word chain"}
            }
        });
        let plan = StudyPlan::from_value(&value);
        assert_eq!(plan.roadmap.len(), 2);
        assert_eq!(plan.roadmap[1].details.as_deref(), Some("10 MCQs"));
        assert_eq!(plan.game.unwrap().description, "Word chain");

        assert!(StudyPlan::from_value(&json!({"plan": null})).is_empty());
        assert!(StudyPlan::from_value(&json!("garbage")).is_empty());
        assert!(StudyPlan::from_value(&json!({"plan": {"roadmap": 5}})).is_empty());
    }

    #[test]
    fn test_reply_parse_by_mode() {
        let reply = AssistantReply::parse(AssistantMode::Chat, &json!({"text": "ok"}));
        assert_eq!(reply, AssistantReply::Text("ok".to_string()));

        let reply = AssistantReply::parse(AssistantMode::GenerateQuestions, &json!([1, 2]));
        assert_eq!(reply, AssistantReply::Questions(GeneratedQuestions::default()));
    }
}
