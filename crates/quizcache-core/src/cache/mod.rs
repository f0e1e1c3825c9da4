//! Local caching module for offline quiz access.
//!
//! `QuizCache` stores one entry per (class, subject) holding all three
//! question lists. Entries are JSON documents kept in a `KeyValueStore`
//! under the `quiz_cache_` namespace and expire after 24 hours.

pub mod manager;

pub use manager::{age_display, CacheStats, CachedQuizData, QuizCache, CACHE_PREFIX, CACHE_TTL_MS};
