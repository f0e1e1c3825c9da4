//! Fetch-or-cache orchestration for one (class, subject).
//!
//! Offline, the loader serves the cache and touches nothing else. Online, it
//! fetches the three question lists together and writes the merged result
//! back. A list whose fetch failed keeps its previously cached contents; with
//! nothing cached it becomes empty.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ApiError, QuestionSource};
use crate::cache::{CachedQuizData, QuizCache};
use crate::connectivity::ConnectivityProvider;
use crate::models::{QuestionKind, QuestionSet};

/// Where the questions being shown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Fetched just now (possibly with some lists filled from the cache).
    Network,
    /// Served from the offline cache.
    Cache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedQuiz {
    pub class_name: String,
    pub subject: String,
    pub questions: QuestionSet,
    pub source: DataSource,
    pub cached_at: DateTime<Utc>,
    /// Kinds whose fetch failed during this load.
    pub failed: Vec<QuestionKind>,
}

impl LoadedQuiz {
    fn from_cache(entry: CachedQuizData, failed: Vec<QuestionKind>) -> Self {
        Self {
            cached_at: entry.cached_at(),
            class_name: entry.class_name_value.clone(),
            subject: entry.subject.clone(),
            questions: entry.into_questions(),
            source: DataSource::Cache,
            failed,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("You are offline and no saved questions exist for {class_name} / {subject}")]
    OfflineNoCache { class_name: String, subject: String },

    #[error("Load superseded by a newer request")]
    Cancelled,
}

/// Ticket for one load request.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

/// Hands out load tickets; starting a new load cancels the previous one.
#[derive(Debug, Default)]
pub struct LoadTracker {
    generation: u64,
    current: Option<CancellationToken>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> LoadTicket {
        self.cancel();
        self.generation += 1;
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        LoadTicket {
            generation: self.generation,
            token,
        }
    }

    /// Whether a result tagged with `generation` is still wanted.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.current.is_some()
    }

    /// Cancel the in-flight load, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    /// Mark the current load as finished so its token is released.
    pub fn finish(&mut self, generation: u64) {
        if generation == self.generation {
            self.current = None;
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct QuizLoader {
    source: Arc<dyn QuestionSource>,
    cache: QuizCache,
    connectivity: Arc<dyn ConnectivityProvider>,
}

impl QuizLoader {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        cache: QuizCache,
        connectivity: Arc<dyn ConnectivityProvider>,
    ) -> Self {
        Self {
            source,
            cache,
            connectivity,
        }
    }

    pub fn cache(&self) -> &QuizCache {
        &self.cache
    }

    pub async fn load(
        &self,
        class_name: &str,
        subject: &str,
        cancel: &CancellationToken,
    ) -> Result<LoadedQuiz, LoadError> {
        let cached = self.cache.get(class_name, subject);

        if !self.connectivity.is_online() {
            return match cached {
                Some(entry) => {
                    debug!(class = class_name, subject = subject, "Offline, serving cached questions");
                    Ok(LoadedQuiz::from_cache(entry, Vec::new()))
                }
                None => Err(LoadError::OfflineNoCache {
                    class_name: class_name.to_string(),
                    subject: subject.to_string(),
                }),
            };
        }

        // Fetch all three lists in parallel
        let fetches = async {
            tokio::join!(
                self.source.fetch_mcq(class_name, subject),
                self.source.fetch_short(class_name, subject),
                self.source.fetch_long(class_name, subject),
            )
        };
        let (mcq_res, short_res, long_res) = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(class = class_name, subject = subject, "Load cancelled during fetch");
                return Err(LoadError::Cancelled);
            }
            results = fetches => results,
        };
        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let mut failed = Vec::new();
        let mcq = Self::list_or_fallback(
            QuestionKind::Mcq,
            mcq_res,
            cached.as_ref().map(|c| &c.mcq_questions),
            &mut failed,
        );
        let short = Self::list_or_fallback(
            QuestionKind::Short,
            short_res,
            cached.as_ref().map(|c| &c.short_questions),
            &mut failed,
        );
        let long = Self::list_or_fallback(
            QuestionKind::Long,
            long_res,
            cached.as_ref().map(|c| &c.long_questions),
            &mut failed,
        );

        if failed.len() == QuestionKind::ALL.len() {
            warn!(class = class_name, subject = subject, "All question fetches failed, cache left untouched");
            return Ok(match cached {
                Some(entry) => LoadedQuiz::from_cache(entry, failed),
                None => LoadedQuiz {
                    class_name: class_name.to_string(),
                    subject: subject.to_string(),
                    questions: QuestionSet::default(),
                    source: DataSource::Network,
                    cached_at: Utc::now(),
                    failed,
                },
            });
        }

        self.cache.put(class_name, subject, &mcq, &short, &long);
        info!(
            class = class_name,
            subject = subject,
            mcq = mcq.len(),
            short = short.len(),
            long = long.len(),
            "Questions refreshed"
        );

        Ok(LoadedQuiz {
            class_name: class_name.to_string(),
            subject: subject.to_string(),
            questions: QuestionSet { mcq, short, long },
            source: DataSource::Network,
            cached_at: Utc::now(),
            failed,
        })
    }

    /// Use the fetched list, or fall back to the cached one (else empty).
    fn list_or_fallback<T: Clone>(
        kind: QuestionKind,
        result: Result<Vec<T>, ApiError>,
        cached: Option<&Vec<T>>,
        failed: &mut Vec<QuestionKind>,
    ) -> Vec<T> {
        match result {
            Ok(items) => {
                debug!(kind = %kind, count = items.len(), "Fetched successfully");
                items
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "Fetch failed, falling back to cached list");
                failed.push(kind);
                cached.cloned().unwrap_or_default()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::connectivity::ConnectivityMonitor;
    use crate::models::{McqQuestion, WrittenQuestion};
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
        fail: Vec<QuestionKind>,
        mcq: usize,
        short: usize,
        long: usize,
        /// Requests for this subject never resolve.
        hang_subject: Option<String>,
    }

    impl FakeSource {
        async fn begin(&self, kind: QuestionKind, subject: &str) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang_subject.as_deref() == Some(subject) {
                futures::future::pending::<()>().await;
            }
            if self.fail.contains(&kind) {
                return Err(ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"));
            }
            Ok(())
        }
    }

    fn mcq(subject: &str, n: usize) -> McqQuestion {
        McqQuestion {
            id: Some(n as i64),
            class_name: "nine".to_string(),
            subject: subject.to_string(),
            question: format!("{} mcq {}", subject, n),
            option1: "a".to_string(),
            option2: "b".to_string(),
            option3: "c".to_string(),
            option4: "d".to_string(),
            correct_option: 1,
        }
    }

    fn written(subject: &str, n: usize) -> WrittenQuestion {
        WrittenQuestion {
            id: Some(n as i64),
            class_name: "nine".to_string(),
            subject: subject.to_string(),
            question: format!("{} written {}", subject, n),
            answer: "answer".to_string(),
        }
    }

    #[async_trait]
    impl QuestionSource for FakeSource {
        async fn fetch_mcq(&self, _class: &str, subject: &str) -> Result<Vec<McqQuestion>, ApiError> {
            self.begin(QuestionKind::Mcq, subject).await?;
            Ok((0..self.mcq).map(|n| mcq(subject, n)).collect())
        }

        async fn fetch_short(&self, _class: &str, subject: &str) -> Result<Vec<WrittenQuestion>, ApiError> {
            self.begin(QuestionKind::Short, subject).await?;
            Ok((0..self.short).map(|n| written(subject, n)).collect())
        }

        async fn fetch_long(&self, _class: &str, subject: &str) -> Result<Vec<WrittenQuestion>, ApiError> {
            self.begin(QuestionKind::Long, subject).await?;
            Ok((0..self.long).map(|n| written(subject, n + 100)).collect())
        }
    }

    fn loader(source: Arc<FakeSource>, online: bool) -> (QuizLoader, QuizCache) {
        let cache = QuizCache::new(Arc::new(MemoryStore::new()));
        let monitor = Arc::new(ConnectivityMonitor::new(online));
        (QuizLoader::new(source, cache.clone(), monitor), cache)
    }

    #[tokio::test]
    async fn test_offline_with_cache_makes_no_network_calls() {
        let source = Arc::new(FakeSource { mcq: 5, ..Default::default() });
        let (loader, cache) = loader(source.clone(), false);
        cache.put("nine", "bangla", &[mcq("bangla", 1)], &[written("bangla", 2)], &[]);

        let loaded = loader
            .load("nine", "bangla", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(loaded.source, DataSource::Cache);
        assert_eq!(loaded.questions.mcq, vec![mcq("bangla", 1)]);
        assert_eq!(loaded.questions.short.len(), 1);
    }

    #[tokio::test]
    async fn test_offline_without_cache_is_an_error() {
        let source = Arc::new(FakeSource::default());
        let (loader, _) = loader(source.clone(), false);

        let err = loader
            .load("nine", "bangla", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LoadError::OfflineNoCache { .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_failed_fetch_without_prior_cache() {
        let source = Arc::new(FakeSource {
            fail: vec![QuestionKind::Mcq],
            mcq: 4,
            short: 3,
            long: 2,
            ..Default::default()
        });
        let (loader, cache) = loader(source.clone(), true);

        let loaded = loader
            .load("nine", "bangla", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(loaded.source, DataSource::Network);
        assert_eq!(loaded.failed, vec![QuestionKind::Mcq]);
        assert!(loaded.questions.mcq.is_empty());
        assert_eq!(loaded.questions.short.len(), 3);
        assert_eq!(loaded.questions.long.len(), 2);

        let entry = cache.get("nine", "bangla").unwrap();
        assert!(entry.mcq_questions.is_empty());
        assert_eq!(entry.short_questions, loaded.questions.short);
        assert_eq!(entry.long_questions, loaded.questions.long);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previously_cached_list() {
        let source = Arc::new(FakeSource {
            fail: vec![QuestionKind::Short],
            mcq: 1,
            long: 1,
            ..Default::default()
        });
        let (loader, cache) = loader(source, true);
        let good_short = vec![written("bangla", 7), written("bangla", 8)];
        cache.put("nine", "bangla", &[], &good_short, &[]);

        let loaded = loader
            .load("nine", "bangla", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(loaded.questions.short, good_short);
        assert_eq!(loaded.questions.mcq.len(), 1);
        assert_eq!(cache.get("nine", "bangla").unwrap().short_questions, good_short);
    }

    #[tokio::test]
    async fn test_all_fetches_failed_serves_cache_untouched() {
        let source = Arc::new(FakeSource {
            fail: QuestionKind::ALL.to_vec(),
            ..Default::default()
        });
        let (loader, cache) = loader(source, true);
        cache.put("nine", "bangla", &[mcq("bangla", 1)], &[], &[]);
        let before = cache.get("nine", "bangla").unwrap();

        let loaded = loader
            .load("nine", "bangla", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(loaded.source, DataSource::Cache);
        assert_eq!(loaded.failed.len(), 3);
        assert_eq!(cache.get("nine", "bangla").unwrap(), before);
    }

    #[tokio::test]
    async fn test_all_fetches_failed_without_cache_writes_nothing() {
        let source = Arc::new(FakeSource {
            fail: QuestionKind::ALL.to_vec(),
            ..Default::default()
        });
        let (loader, cache) = loader(source, true);

        let loaded = loader
            .load("nine", "bangla", &CancellationToken::new())
            .await
            .unwrap();

        assert!(loaded.questions.is_empty());
        assert!(!cache.has("nine", "bangla"));
    }

    #[tokio::test]
    async fn test_superseded_load_is_discarded() {
        let source = Arc::new(FakeSource {
            mcq: 2,
            short: 1,
            long: 1,
            hang_subject: Some("bangla".to_string()),
            ..Default::default()
        });
        let (loader, cache) = loader(source, true);
        let loader = Arc::new(loader);
        let mut tracker = LoadTracker::new();

        let first = tracker.begin();
        let first_task = {
            let loader = Arc::clone(&loader);
            let token = first.token.clone();
            tokio::spawn(async move { loader.load("nine", "bangla", &token).await })
        };
        tokio::task::yield_now().await;

        let second = tracker.begin();
        assert!(first.token.is_cancelled());
        let second_result = loader.load("nine", "math", &second.token).await;

        let first_result = first_task.await.unwrap();
        assert_eq!(first_result, Err(LoadError::Cancelled));
        assert!(!tracker.is_current(first.generation));
        assert!(tracker.is_current(second.generation));

        let loaded = second_result.unwrap();
        assert_eq!(loaded.subject, "math");
        assert!(loaded.questions.mcq.iter().all(|q| q.subject == "math"));
        assert!(!cache.has("nine", "bangla"));
        assert!(cache.has("nine", "math"));
    }

    #[test]
    fn test_tracker_generations() {
        let mut tracker = LoadTracker::new();
        let a = tracker.begin();
        assert!(tracker.is_current(a.generation));
        tracker.finish(a.generation);
        assert!(!tracker.is_current(a.generation));

        let b = tracker.begin();
        let c = tracker.begin();
        assert!(b.token.is_cancelled());
        assert!(!c.token.is_cancelled());
        assert!(tracker.is_current(c.generation));
        assert_eq!(tracker.generation(), 3);
    }
}
