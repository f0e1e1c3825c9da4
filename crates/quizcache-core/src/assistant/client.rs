use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AssistantReply, AssistantRequest, GeneratedQuestions, StudyPlan};

/// Default assistant proxy endpoint
pub const DEFAULT_ASSISTANT_URL: &str = "http://127.0.0.1:3000/api/ai";

/// Maximum length for error response bodies kept in errors
const MAX_ERROR_BODY_LENGTH: usize = 200;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Assistant request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Assistant returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Assistant returned an unexpected {expected} reply")]
    UnexpectedReply { expected: &'static str },
}

impl AssistantError {
    /// Message shown inline in place of the reply.
    pub fn user_message(&self) -> &'static str {
        "The assistant service is unavailable right now. Please try again."
    }
}

#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    url: String,
}

impl AssistantClient {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a request and parse the reply for its mode.
    pub async fn send(&self, request: &AssistantRequest) -> Result<AssistantReply, AssistantError> {
        let mode = request.mode();
        debug!(mode = ?mode, "Sending assistant request");

        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let mut end = body.len().min(MAX_ERROR_BODY_LENGTH);
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            warn!(status = status.as_u16(), mode = ?mode, "Assistant request rejected");
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body: body[..end].to_string(),
            });
        }

        // Some proxies answer with bare text
        let value = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));
        Ok(AssistantReply::parse(mode, &value))
    }

    pub async fn chat(&self, prompt: &str) -> Result<String, AssistantError> {
        let request = AssistantRequest::Chat {
            prompt: prompt.to_string(),
        };
        match self.send(&request).await? {
            AssistantReply::Text(text) => Ok(text),
            _ => Err(AssistantError::UnexpectedReply { expected: "text" }),
        }
    }

    pub async fn study_plan(
        &self,
        class_name: &str,
        subject: &str,
        chapter: &str,
    ) -> Result<StudyPlan, AssistantError> {
        let request = AssistantRequest::study_plan(class_name, subject, chapter);
        match self.send(&request).await? {
            AssistantReply::Plan(plan) => Ok(plan),
            _ => Err(AssistantError::UnexpectedReply { expected: "plan" }),
        }
    }

    pub async fn generate_questions(
        &self,
        class_name: &str,
        subject: &str,
        chapter: Option<&str>,
        count: u32,
    ) -> Result<GeneratedQuestions, AssistantError> {
        let request = AssistantRequest::GenerateQuestions {
            class_name: class_name.to_string(),
            subject: subject.to_string(),
            chapter: chapter.map(str::to_string),
            count,
        };
        match self.send(&request).await? {
            AssistantReply::Questions(questions) => Ok(questions),
            _ => Err(AssistantError::UnexpectedReply { expected: "questions" }),
        }
    }

    /// Ask about a page of a subject's textbook, with the page text as context.
    pub async fn page_chat(
        &self,
        subject: &str,
        subject_label: &str,
        current_page: u32,
        question: &str,
        context: &str,
    ) -> Result<String, AssistantError> {
        let request = AssistantRequest::PdfChat {
            subject: subject.to_string(),
            subject_label: subject_label.to_string(),
            current_page,
            question: question.to_string(),
            context: context.to_string(),
        };
        match self.send(&request).await? {
            AssistantReply::Text(text) => Ok(text),
            _ => Err(AssistantError::UnexpectedReply { expected: "text" }),
        }
    }
}
