//! Core library for quizcache.
//!
//! Offline-first access to a question bank: a TTL cache over a pluggable
//! key-value store, a connectivity monitor, a loader that decides between
//! network and cache, answer grading, and a client for the study assistant.

pub mod api;
pub mod assistant;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod grading;
pub mod loader;
pub mod models;
pub mod store;
pub mod utils;

pub use api::{ApiError, QuestionBankClient, QuestionSource};
pub use assistant::{AssistantClient, AssistantError};
pub use cache::{CacheStats, CachedQuizData, QuizCache};
pub use config::Config;
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor, ConnectivityProvider};
pub use grading::{grade_long, grade_mcq, grade_short, QuizProgress, QuizState, Verdict};
pub use loader::{DataSource, LoadError, LoadTicket, LoadTracker, LoadedQuiz, QuizLoader};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
