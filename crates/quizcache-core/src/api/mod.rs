//! REST API client module for the question bank service.
//!
//! `QuestionBankClient` reads the MCQ, short-answer and long-answer lists
//! for a class and subject, and carries the admin create/update/delete calls.
//! The loader sees it only through the `QuestionSource` trait.

pub mod client;
pub mod error;

pub use client::{QuestionBankClient, QuestionSource, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
