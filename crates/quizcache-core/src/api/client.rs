//! HTTP client for the question bank REST service.
//!
//! Each question kind is its own resource under `{base}/{kind}/question/`,
//! filtered by `class_name` and `subject` query parameters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::{McqQuestion, QuestionKind, WrittenKind, WrittenQuestion};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL of the question bank
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Read access to the three question lists for a (class, subject).
///
/// The loader only depends on this trait, so tests can drive it with a fake.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_mcq(&self, class_name: &str, subject: &str)
        -> Result<Vec<McqQuestion>, ApiError>;

    async fn fetch_short(
        &self,
        class_name: &str,
        subject: &str,
    ) -> Result<Vec<WrittenQuestion>, ApiError>;

    async fn fetch_long(
        &self,
        class_name: &str,
        subject: &str,
    ) -> Result<Vec<WrittenQuestion>, ApiError>;
}

/// Question bank client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct QuestionBankClient {
    client: Client,
    base_url: String,
}

impl QuestionBankClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List endpoint for a kind, e.g. `http://host/mcq/question/`.
    pub fn endpoint(&self, kind: QuestionKind) -> String {
        format!("{}/{}/question/", self.base_url, kind.as_str())
    }

    /// Detail endpoint for one record, e.g. `http://host/mcq/question/7/`.
    pub fn record_url(&self, kind: QuestionKind, id: i64) -> String {
        format!("{}{}/", self.endpoint(kind), id)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e)))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        kind: QuestionKind,
        class_name: &str,
        subject: &str,
    ) -> Result<Vec<T>, ApiError> {
        let url = self.endpoint(kind);
        let response = self
            .client
            .get(&url)
            .query(&[("class_name", class_name), ("subject", subject)])
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let items: Vec<T> = Self::decode(response, &url).await?;
        debug!(kind = %kind, class = class_name, subject = subject, count = items.len(), "Fetched questions");
        Ok(items)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T, ApiError> {
        let response = self.client.post(url).json(body).send().await?;
        let response = Self::check_response(response).await?;
        Self::decode(response, url).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T, ApiError> {
        let response = self.client.put(url).json(body).send().await?;
        let response = Self::check_response(response).await?;
        Self::decode(response, url).await
    }

    // ===== Reads =====

    pub async fn fetch_written(
        &self,
        kind: WrittenKind,
        class_name: &str,
        subject: &str,
    ) -> Result<Vec<WrittenQuestion>, ApiError> {
        self.list(kind.into(), class_name, subject).await
    }

    // ===== Admin writes =====

    pub async fn create_mcq(&self, question: &McqQuestion) -> Result<McqQuestion, ApiError> {
        question.validate().map_err(ApiError::Validation)?;
        let body = McqQuestion { id: None, ..question.clone() };
        self.post(&self.endpoint(QuestionKind::Mcq), &body).await
    }

    pub async fn update_mcq(&self, question: &McqQuestion) -> Result<McqQuestion, ApiError> {
        question.validate().map_err(ApiError::Validation)?;
        let id = question.id.ok_or(ApiError::MissingId)?;
        self.put(&self.record_url(QuestionKind::Mcq, id), question).await
    }

    pub async fn create_written(
        &self,
        kind: WrittenKind,
        question: &WrittenQuestion,
    ) -> Result<WrittenQuestion, ApiError> {
        question.validate().map_err(ApiError::Validation)?;
        let body = WrittenQuestion { id: None, ..question.clone() };
        self.post(&self.endpoint(kind.into()), &body).await
    }

    pub async fn update_written(
        &self,
        kind: WrittenKind,
        question: &WrittenQuestion,
    ) -> Result<WrittenQuestion, ApiError> {
        question.validate().map_err(ApiError::Validation)?;
        let id = question.id.ok_or(ApiError::MissingId)?;
        self.put(&self.record_url(kind.into(), id), question).await
    }

    pub async fn delete(&self, kind: QuestionKind, id: i64) -> Result<(), ApiError> {
        let url = self.record_url(kind, id);
        let response = self.client.delete(&url).send().await?;
        Self::check_response(response).await?;
        debug!(kind = %kind, id = id, "Deleted question");
        Ok(())
    }
}

#[async_trait]
impl QuestionSource for QuestionBankClient {
    async fn fetch_mcq(&self, class_name: &str, subject: &str) -> Result<Vec<McqQuestion>, ApiError> {
        self.list(QuestionKind::Mcq, class_name, subject).await
    }

    async fn fetch_short(&self, class_name: &str, subject: &str) -> Result<Vec<WrittenQuestion>, ApiError> {
        self.fetch_written(WrittenKind::Short, class_name, subject).await
    }

    async fn fetch_long(&self, class_name: &str, subject: &str) -> Result<Vec<WrittenQuestion>, ApiError> {
        self.fetch_written(WrittenKind::Long, class_name, subject).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> QuestionBankClient {
        QuestionBankClient::new("http://127.0.0.1:8000/", DEFAULT_REQUEST_TIMEOUT_SECS).unwrap()
    }

    #[test]
    fn test_endpoints() {
        let client = client();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert_eq!(client.endpoint(QuestionKind::Short), "http://127.0.0.1:8000/short/question/");
        assert_eq!(
            client.record_url(QuestionKind::Mcq, 42),
            "http://127.0.0.1:8000/mcq/question/42/"
        );
    }

    #[tokio::test]
    async fn test_invalid_mcq_rejected_before_sending() {
        let question = McqQuestion {
            id: None,
            class_name: "nine".to_string(),
            subject: "math".to_string(),
            question: "2+2?".to_string(),
            option1: "1".to_string(),
            option2: "2".to_string(),
            option3: "3".to_string(),
            option4: "4".to_string(),
            correct_option: 0,
        };
        let err = client().create_mcq(&question).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let question = WrittenQuestion {
            id: None,
            class_name: "nine".to_string(),
            subject: "bangla".to_string(),
            question: "Capital?".to_string(),
            answer: "Dhaka".to_string(),
        };
        let err = client()
            .update_written(WrittenKind::Short, &question)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingId));
    }
}
