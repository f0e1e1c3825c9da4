use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{McqQuestion, QuestionSet, WrittenQuestion};
use crate::store::KeyValueStore;

/// Namespace prefix for every quiz cache key.
pub const CACHE_PREFIX: &str = "quiz_cache_";

/// Entries expire 24 hours after they were written.
pub const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Stored characters are counted as UTF-16 code units (2 bytes each).
const BYTES_PER_CHAR: usize = 2;

/// One cached (class, subject) question set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedQuizData {
    pub mcq_questions: Vec<McqQuestion>,
    pub short_questions: Vec<WrittenQuestion>,
    pub long_questions: Vec<WrittenQuestion>,
    /// Milliseconds since the Unix epoch.
    pub last_updated: i64,
    pub class_name_value: String,
    pub subject: String,
}

impl CachedQuizData {
    pub fn cached_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.last_updated)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.last_updated) >= CACHE_TTL_MS
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at()).num_minutes()
    }

    pub fn age_display(&self) -> String {
        age_display(self.age_minutes())
    }

    pub fn questions(&self) -> QuestionSet {
        QuestionSet {
            mcq: self.mcq_questions.clone(),
            short: self.short_questions.clone(),
            long: self.long_questions.clone(),
        }
    }

    pub fn into_questions(self) -> QuestionSet {
        QuestionSet {
            mcq: self.mcq_questions,
            short: self.short_questions,
            long: self.long_questions,
        }
    }
}

/// Human-readable age, rounding to the nearest unit.
pub fn age_display(minutes: i64) -> String {
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Diagnostic summary of everything in the cache namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub total_cached: usize,
    pub total_bytes: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl CacheStats {
    pub fn size_display(&self) -> String {
        format!("{:.2} KB", self.total_bytes as f64 / 1024.0)
    }
}

/// Offline question cache keyed by (class, subject).
///
/// Reads and writes never fail from the caller's point of view: storage
/// problems are logged and show up as cache misses.
#[derive(Clone)]
pub struct QuizCache {
    store: Arc<dyn KeyValueStore>,
}

impl QuizCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn cache_key(class_name: &str, subject: &str) -> String {
        format!("{}{}_{}", CACHE_PREFIX, class_name, subject).to_lowercase()
    }

    /// Store the three lists with a fresh timestamp, replacing any prior entry.
    pub fn put(
        &self,
        class_name: &str,
        subject: &str,
        mcq: &[McqQuestion],
        short: &[WrittenQuestion],
        long: &[WrittenQuestion],
    ) {
        let entry = CachedQuizData {
            mcq_questions: mcq.to_vec(),
            short_questions: short.to_vec(),
            long_questions: long.to_vec(),
            last_updated: Utc::now().timestamp_millis(),
            class_name_value: class_name.to_string(),
            subject: subject.to_string(),
        };
        self.put_entry(&entry);
    }

    /// Store a prepared entry as-is, keeping its timestamp.
    pub fn put_entry(&self, entry: &CachedQuizData) {
        let key = Self::cache_key(&entry.class_name_value, &entry.subject);
        let contents = match serde_json::to_string(entry) {
            Ok(c) => c,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize quiz cache entry");
                return;
            }
        };
        if let Err(e) = self.store.put(&key, &contents) {
            warn!(key = %key, error = %e, "Failed to cache quiz data");
        } else {
            debug!(key = %key, bytes = contents.len(), "Quiz data cached");
        }
    }

    /// Look up a valid entry. Missing, malformed and expired entries are all
    /// `None`; expired ones are deleted as a side effect.
    pub fn get(&self, class_name: &str, subject: &str) -> Option<CachedQuizData> {
        self.get_at(class_name, subject, Utc::now().timestamp_millis())
    }

    fn get_at(&self, class_name: &str, subject: &str, now_ms: i64) -> Option<CachedQuizData> {
        let key = Self::cache_key(class_name, subject);
        let contents = match self.store.get(&key) {
            Ok(Some(c)) => c,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read quiz cache");
                return None;
            }
        };

        let entry: CachedQuizData = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key = %key, error = %e, "Ignoring malformed quiz cache entry");
                return None;
            }
        };

        if entry.is_expired_at(now_ms) {
            debug!(key = %key, "Quiz cache entry expired, removing");
            if let Err(e) = self.store.delete(&key) {
                warn!(key = %key, error = %e, "Failed to remove expired quiz cache entry");
            }
            return None;
        }

        Some(entry)
    }

    pub fn has(&self, class_name: &str, subject: &str) -> bool {
        self.get(class_name, subject).is_some()
    }

    pub fn clear(&self, class_name: &str, subject: &str) {
        let key = Self::cache_key(class_name, subject);
        if let Err(e) = self.store.delete(&key) {
            warn!(key = %key, error = %e, "Failed to clear quiz cache entry");
        }
    }

    /// Remove every entry in the namespace. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let keys = match self.store.scan(CACHE_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list quiz cache entries");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            match self.store.delete(&key) {
                Ok(()) => removed += 1,
                Err(e) => warn!(key = %key, error = %e, "Failed to clear quiz cache entry"),
            }
        }
        removed
    }

    /// Scan the namespace without modifying it. Malformed entries are skipped.
    pub fn stats(&self) -> CacheStats {
        let keys = match self.store.scan(CACHE_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list quiz cache entries for stats");
                return CacheStats::default();
            }
        };

        let mut stats = CacheStats::default();
        let mut oldest: Option<i64> = None;
        let mut newest: Option<i64> = None;

        for key in keys {
            let contents = match self.store.get(&key) {
                Ok(Some(c)) => c,
                Ok(None) => continue,
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping unreadable cache entry in stats");
                    continue;
                }
            };
            let entry: CachedQuizData = match serde_json::from_str(&contents) {
                Ok(entry) => entry,
                Err(_) => {
                    debug!(key = %key, "Skipping malformed cache entry in stats");
                    continue;
                }
            };

            stats.total_cached += 1;
            stats.total_bytes += contents.chars().count() * BYTES_PER_CHAR;
            oldest = Some(oldest.map_or(entry.last_updated, |t| t.min(entry.last_updated)));
            newest = Some(newest.map_or(entry.last_updated, |t| t.max(entry.last_updated)));
        }

        stats.oldest = oldest.and_then(|t| Utc.timestamp_millis_opt(t).single());
        stats.newest = newest.and_then(|t| Utc.timestamp_millis_opt(t).single());
        stats
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};

    fn mcq(n: i64) -> McqQuestion {
        McqQuestion {
            id: Some(n),
            class_name: "nine".to_string(),
            subject: "bangla".to_string(),
            question: format!("প্রশ্ন {}", n),
            option1: "ক".to_string(),
            option2: "খ".to_string(),
            option3: "গ".to_string(),
            option4: "ঘ".to_string(),
            correct_option: 2,
        }
    }

    fn written(n: i64) -> WrittenQuestion {
        WrittenQuestion {
            id: Some(n),
            class_name: "nine".to_string(),
            subject: "bangla".to_string(),
            question: format!("Question {}", n),
            answer: "ঢাকা".to_string(),
        }
    }

    fn setup() -> (Arc<MemoryStore>, QuizCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = QuizCache::new(store.clone());
        (store, cache)
    }

    #[test]
    fn test_cache_key_is_lowercased() {
        assert_eq!(QuizCache::cache_key("Nine", "Bangla"), "quiz_cache_nine_bangla");
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (_, cache) = setup();
        let mcqs = vec![mcq(1), mcq(2)];
        let shorts = vec![written(3)];
        let longs = vec![written(4), written(5)];

        cache.put("nine", "bangla", &mcqs, &shorts, &longs);
        let entry = cache.get("nine", "bangla").expect("entry should be cached");

        assert_eq!(entry.mcq_questions, mcqs);
        assert_eq!(entry.short_questions, shorts);
        assert_eq!(entry.long_questions, longs);
        assert_eq!(entry.class_name_value, "nine");
        assert_eq!(entry.subject, "bangla");
        assert!(cache.has("NINE", "BANGLA"));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let (store, cache) = setup();
        cache.put("nine", "bangla", &[mcq(1)], &[], &[]);
        let raw = store.get("quiz_cache_nine_bangla").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("mcqQuestions").is_some());
        assert!(value.get("lastUpdated").is_some());
        assert_eq!(value["classNameValue"], "nine");
    }

    #[test]
    fn test_expired_entry_is_deleted_on_read() {
        let (store, cache) = setup();
        let entry = CachedQuizData {
            mcq_questions: vec![mcq(1)],
            short_questions: vec![],
            long_questions: vec![],
            last_updated: Utc::now().timestamp_millis() - CACHE_TTL_MS - 1,
            class_name_value: "nine".to_string(),
            subject: "bangla".to_string(),
        };
        cache.put_entry(&entry);
        assert!(store.get("quiz_cache_nine_bangla").unwrap().is_some());

        assert!(cache.get("nine", "bangla").is_none());
        assert!(store.get("quiz_cache_nine_bangla").unwrap().is_none());
    }

    #[test]
    fn test_ttl_boundary() {
        let (_, cache) = setup();
        cache.put("nine", "math", &[], &[written(1)], &[]);
        let written_at = cache.get("nine", "math").unwrap().last_updated;

        assert!(cache.get_at("nine", "math", written_at + CACHE_TTL_MS - 1).is_some());
        assert!(cache.get_at("nine", "math", written_at + CACHE_TTL_MS).is_none());
    }

    #[test]
    fn test_malformed_entry_is_a_miss() {
        let (store, cache) = setup();
        store.put("quiz_cache_nine_bangla", "{not json").unwrap();
        assert!(cache.get("nine", "bangla").is_none());
        assert!(!cache.has("nine", "bangla"));
    }

    #[test]
    fn test_extreme_timestamp_is_a_miss() {
        let (store, cache) = setup();
        let raw = format!(
            r#"{{"mcqQuestions":[],"shortQuestions":[],"longQuestions":[],"lastUpdated":{},"classNameValue":"nine","subject":"bangla"}}"#,
            i64::MIN
        );
        store.put("quiz_cache_nine_bangla", &raw).unwrap();
        assert!(cache.get("nine", "bangla").is_none());
        assert_eq!(store.get("quiz_cache_nine_bangla").unwrap(), None);
    }

    #[test]
    fn test_put_over_quota_is_swallowed() {
        let store = Arc::new(MemoryStore::with_quota(64));
        let cache = QuizCache::new(store.clone());
        cache.put("nine", "bangla", &[mcq(1), mcq(2)], &[], &[]);
        assert!(cache.get("nine", "bangla").is_none());
        assert!(matches!(
            store.put("quiz_cache_x", &"x".repeat(64)),
            Err(StoreError::QuotaExceeded { .. })
        ));
    }

    #[test]
    fn test_clear_and_clear_all() {
        let (store, cache) = setup();
        cache.put("nine", "bangla", &[mcq(1)], &[], &[]);
        cache.put("nine", "math", &[mcq(2)], &[], &[]);
        cache.put("ten", "ict", &[], &[written(1)], &[]);
        store.put("settings", "{}").unwrap();

        cache.clear("nine", "bangla");
        assert!(!cache.has("nine", "bangla"));
        assert!(cache.has("nine", "math"));

        assert_eq!(cache.clear_all(), 2);
        assert!(!cache.has("ten", "ict"));
        // Keys outside the namespace are untouched
        assert_eq!(store.get("settings").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_stats_skips_malformed_entries() {
        let (store, cache) = setup();
        let now = Utc::now().timestamp_millis();
        for (subject, age) in [("bangla", 10_000), ("math", 50_000)] {
            cache.put_entry(&CachedQuizData {
                mcq_questions: vec![mcq(1)],
                short_questions: vec![],
                long_questions: vec![],
                last_updated: now - age,
                class_name_value: "nine".to_string(),
                subject: subject.to_string(),
            });
        }
        store.put("quiz_cache_nine_broken", "garbage").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total_cached, 2);
        assert_eq!(stats.oldest.unwrap().timestamp_millis(), now - 50_000);
        assert_eq!(stats.newest.unwrap().timestamp_millis(), now - 10_000);

        let valid_chars: usize = ["quiz_cache_nine_bangla", "quiz_cache_nine_math"]
            .iter()
            .map(|k| store.get(k).unwrap().unwrap().chars().count())
            .sum();
        assert_eq!(stats.total_bytes, valid_chars * 2);

        // Read-only: the malformed entry is still there
        assert!(store.get("quiz_cache_nine_broken").unwrap().is_some());
    }

    #[test]
    fn test_stats_empty() {
        let (_, cache) = setup();
        let stats = cache.stats();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.size_display(), "0.00 KB");
    }

    #[test]
    fn test_age_display() {
        assert_eq!(age_display(-5), "just now");
        assert_eq!(age_display(0), "just now");
        assert_eq!(age_display(5), "5m ago");
        assert_eq!(age_display(90), "2h ago");
        assert_eq!(age_display(61), "1h ago");
        assert_eq!(age_display(1440 + 13 * 60), "2d ago");
    }
}
