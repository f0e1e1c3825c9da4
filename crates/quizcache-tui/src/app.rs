//! Application state management for the quiz trainer.
//!
//! This module contains the core `App` struct that holds UI state, the
//! questions currently being practiced, and the channel that background
//! loads and assistant requests report back through.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use quizcache_core::assistant::AssistantError;
use quizcache_core::config::Subject;
use quizcache_core::models::{
    AssistantReply, AssistantRequest, McqQuestion, QuestionKind, QuestionSet, StudyPlan,
    WrittenQuestion, MCQ_OPTION_COUNT,
};
use quizcache_core::{
    grade_long, grade_mcq, grade_short, AssistantClient, CacheStats, Config, ConnectivityEvent,
    ConnectivityMonitor, ConnectivityProvider, DataSource, FileStore, LoadError, LoadTracker,
    LoadedQuiz, QuestionBankClient, QuestionSource, QuizCache, QuizLoader, QuizProgress, QuizState,
    Verdict,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for a typed answer.
const MAX_ANSWER_LENGTH: usize = 2000;

/// Maximum length for an assistant prompt.
const MAX_PROMPT_LENGTH: usize = 500;

/// Number of questions requested from the assistant per generation.
const GENERATED_QUESTION_COUNT: u32 = 5;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    /// Typing a short or long answer
    Typing,
    PickingSubject,
    ShowingHelp,
    ShowingCache,
    Assistant,
    ConfirmingQuit,
    ConfirmingOffline,
    ConfirmingOnline,
    ConfirmingClearAll,
    Quitting,
}

/// Progress of the question load for the current subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    /// Blocking error, e.g. offline with nothing saved
    Failed(String),
}

/// Assistant panel sub-view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantTab {
    Chat,
    StudyPlan,
    Generate,
}

impl AssistantTab {
    pub fn title(&self) -> &'static str {
        match self {
            AssistantTab::Chat => "Ask",
            AssistantTab::StudyPlan => "Study plan",
            AssistantTab::Generate => "Generate quiz",
        }
    }

    pub fn prompt_label(&self) -> &'static str {
        match self {
            AssistantTab::Chat => "Question",
            AssistantTab::StudyPlan | AssistantTab::Generate => "Chapter",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            AssistantTab::Chat => AssistantTab::StudyPlan,
            AssistantTab::StudyPlan => AssistantTab::Generate,
            AssistantTab::Generate => AssistantTab::Chat,
        }
    }
}

/// What the assistant panel is showing
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantView {
    Empty,
    Waiting,
    Text(String),
    Plan(StudyPlan),
    Error(String),
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned tasks back to the main loop.
enum BackgroundResult {
    Quiz {
        generation: u64,
        result: Result<LoadedQuiz, LoadError>,
    },
    Assistant {
        origin: AssistantOrigin,
        result: Result<AssistantReply, AssistantError>,
    },
}

/// Where the quiz stood when an assistant request was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AssistantOrigin {
    tab: AssistantTab,
    class_name: String,
    subject: String,
    generation: u64,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub cache: QuizCache,
    connectivity: Arc<ConnectivityMonitor>,
    connectivity_rx: broadcast::Receiver<ConnectivityEvent>,
    loader: Arc<QuizLoader>,
    assistant: AssistantClient,
    tracker: LoadTracker,

    // UI State
    pub state: AppState,
    pub current_kind: QuestionKind,
    pub subject_selection: usize,

    // Quiz state
    pub questions: QuestionSet,
    progress: [QuizProgress; 3],
    /// 1-based MCQ option under the cursor
    pub selected_option: u8,
    pub answer_input: String,
    pub load_status: LoadStatus,
    pub data_source: Option<DataSource>,
    pub cached_at: Option<DateTime<Utc>>,
    pub failed_kinds: Vec<QuestionKind>,
    /// True when practicing an assistant-generated set
    pub practicing_generated: bool,

    // Assistant panel
    pub assistant_tab: AssistantTab,
    pub assistant_input: String,
    pub assistant_view: AssistantView,

    // Cache panel
    pub cache_stats: CacheStats,
    pub current_entry_age: Option<String>,

    // Background task channel
    bg_rx: mpsc::Receiver<BackgroundResult>,
    bg_tx: mpsc::Sender<BackgroundResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create the application with the file-backed cache and HTTP clients.
    pub fn new(config: Config) -> Result<Self> {
        let questions_dir = config
            .questions_dir()
            .unwrap_or_else(|_| PathBuf::from("./cache/questions"));
        debug!(?questions_dir, "Question cache directory configured");

        let cache = QuizCache::new(Arc::new(FileStore::new(questions_dir)?));
        let source = QuestionBankClient::new(&config.api_base_url, config.request_timeout_secs)?;
        let assistant = AssistantClient::new(&config.assistant_url, config.request_timeout_secs)?;

        Ok(Self::with_services(config, cache, Arc::new(source), assistant))
    }

    pub fn with_services(
        config: Config,
        cache: QuizCache,
        source: Arc<dyn QuestionSource>,
        assistant: AssistantClient,
    ) -> Self {
        let connectivity = Arc::new(ConnectivityMonitor::new(!config.offline_mode));
        let connectivity_rx = connectivity.subscribe();
        let loader = Arc::new(QuizLoader::new(
            source,
            cache.clone(),
            Arc::clone(&connectivity) as Arc<dyn ConnectivityProvider>,
        ));

        let subject_selection = config
            .subjects
            .iter()
            .position(|s| s.key == config.subject)
            .unwrap_or(0);

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            config,
            cache,
            connectivity,
            connectivity_rx,
            loader,
            assistant,
            tracker: LoadTracker::new(),

            state: AppState::Normal,
            current_kind: QuestionKind::Mcq,
            subject_selection,

            questions: QuestionSet::default(),
            progress: [QuizProgress::new(0), QuizProgress::new(0), QuizProgress::new(0)],
            selected_option: 1,
            answer_input: String::new(),
            load_status: LoadStatus::Idle,
            data_source: None,
            cached_at: None,
            failed_kinds: Vec::new(),
            practicing_generated: false,

            assistant_tab: AssistantTab::Chat,
            assistant_input: String::new(),
            assistant_view: AssistantView::Empty,

            cache_stats: CacheStats::default(),
            current_entry_age: None,

            bg_rx: rx,
            bg_tx: tx,

            status_message: None,
        }
    }

    pub fn is_offline(&self) -> bool {
        !self.connectivity.is_online()
    }

    pub fn subject_label(&self) -> &str {
        self.config.subject_label(&self.config.subject)
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.config.subjects
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Start loading the current (class, subject), superseding any load in flight.
    pub fn start_load(&mut self) {
        let ticket = self.tracker.begin();
        let loader = Arc::clone(&self.loader);
        let tx = self.bg_tx.clone();
        let class_name = self.config.class_name.clone();
        let subject = self.config.subject.clone();

        info!(class = %class_name, subject = %subject, generation = ticket.generation, "Loading questions");
        self.load_status = LoadStatus::Loading;
        self.practicing_generated = false;

        tokio::spawn(async move {
            let result = loader.load(&class_name, &subject, &ticket.token).await;
            Self::send_result(
                &tx,
                BackgroundResult::Quiz {
                    generation: ticket.generation,
                    result,
                },
            )
            .await;
        });
    }

    /// Switch to the subject at `index` in the picker and load it.
    pub fn select_subject(&mut self, index: usize) {
        let Some(subject) = self.config.subjects.get(index) else {
            return;
        };
        self.subject_selection = index;
        if subject.key != self.config.subject {
            self.config.subject = subject.key.clone();
            self.save_config();
        }
        self.reset_quiz();
        self.start_load();
    }

    /// Drop the current questions and every list's progress.
    fn reset_quiz(&mut self) {
        self.set_questions(QuestionSet::default());
        self.data_source = None;
        self.cached_at = None;
        self.failed_kinds.clear();
    }

    fn set_questions(&mut self, questions: QuestionSet) {
        self.progress = [
            QuizProgress::new(questions.mcq.len()),
            QuizProgress::new(questions.short.len()),
            QuizProgress::new(questions.long.len()),
        ];
        self.questions = questions;
        self.clear_answer();
    }

    fn apply_load_result(&mut self, generation: u64, result: Result<LoadedQuiz, LoadError>) {
        if !self.tracker.is_current(generation) {
            debug!(generation, "Discarding superseded load result");
            return;
        }
        self.tracker.finish(generation);

        match result {
            Ok(loaded) => {
                if !loaded.failed.is_empty() {
                    let kinds: Vec<&str> = loaded.failed.iter().map(|k| k.title()).collect();
                    self.status_message = Some(format!(
                        "Could not refresh {}; showing saved questions",
                        kinds.join(", ")
                    ));
                } else if loaded.source == DataSource::Network {
                    self.status_message = None;
                }
                self.data_source = Some(loaded.source);
                self.cached_at = Some(loaded.cached_at);
                self.failed_kinds = loaded.failed;
                self.set_questions(loaded.questions);
                self.load_status = LoadStatus::Ready;
            }
            Err(LoadError::Cancelled) => {}
            Err(e) => {
                warn!(error = %e, "Question load failed");
                self.reset_quiz();
                self.load_status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    // =========================================================================
    // Quiz
    // =========================================================================

    pub fn progress(&self, kind: QuestionKind) -> &QuizProgress {
        &self.progress[kind.index()]
    }

    pub fn current_progress(&self) -> &QuizProgress {
        self.progress(self.current_kind)
    }

    fn current_progress_mut(&mut self) -> &mut QuizProgress {
        &mut self.progress[self.current_kind.index()]
    }

    pub fn current_mcq(&self) -> Option<&McqQuestion> {
        self.questions.mcq.get(self.progress(QuestionKind::Mcq).index())
    }

    pub fn current_written(&self) -> Option<&WrittenQuestion> {
        let index = self.current_progress().index();
        self.questions.written(self.current_kind)?.get(index)
    }

    /// Whether the current question accepts input.
    pub fn can_answer(&self) -> bool {
        matches!(
            self.current_progress().state(),
            QuizState::Idle | QuizState::Answering
        )
    }

    pub fn switch_kind(&mut self, kind: QuestionKind) {
        if self.current_kind != kind {
            self.current_kind = kind;
            self.clear_answer();
        }
    }

    fn clear_answer(&mut self) {
        self.selected_option = 1;
        self.answer_input.clear();
    }

    pub fn select_option(&mut self, option: u8) {
        if self.current_kind != QuestionKind::Mcq || !self.can_answer() {
            return;
        }
        if (1..=MCQ_OPTION_COUNT).contains(&option) {
            self.selected_option = option;
            self.current_progress_mut().start_answering();
        }
    }

    pub fn move_option(&mut self, down: bool) {
        let next = if down {
            if self.selected_option >= MCQ_OPTION_COUNT { 1 } else { self.selected_option + 1 }
        } else if self.selected_option <= 1 {
            MCQ_OPTION_COUNT
        } else {
            self.selected_option - 1
        };
        self.select_option(next);
    }

    pub fn push_answer_char(&mut self, c: char) {
        if can_add_answer_char(self.answer_input.chars().count(), c) {
            self.answer_input.push(c);
            self.current_progress_mut().start_answering();
        }
    }

    /// Grade the current answer.
    pub fn submit_answer(&mut self) {
        if !self.can_answer() {
            return;
        }
        let verdict = match self.current_kind {
            QuestionKind::Mcq => match self.current_mcq() {
                Some(q) => grade_mcq(q, self.selected_option),
                None => return,
            },
            QuestionKind::Short => match self.current_written() {
                Some(q) => grade_short(q, &self.answer_input),
                None => return,
            },
            QuestionKind::Long => match self.current_written() {
                Some(q) => grade_long(q, &self.answer_input),
                None => return,
            },
        };
        debug!(kind = %self.current_kind, correct = verdict.is_correct(), "Answer graded");
        self.current_progress_mut().record(verdict);
    }

    /// After grading: move on if correct, otherwise try again.
    pub fn continue_after_grade(&mut self) {
        match self.current_progress().state() {
            QuizState::Graded(Verdict::Correct) => {
                self.current_progress_mut().next();
                self.clear_answer();
            }
            QuizState::Graded(Verdict::Incorrect { .. }) => {
                self.current_progress_mut().retry();
            }
            QuizState::Finished => {
                self.current_progress_mut().restart();
                self.clear_answer();
            }
            QuizState::Idle | QuizState::Answering => {}
        }
    }

    pub fn skip_question(&mut self) {
        self.current_progress_mut().skip();
        self.clear_answer();
    }

    // =========================================================================
    // Offline Mode
    // =========================================================================

    /// Work from saved questions only.
    pub fn go_offline(&mut self) {
        info!("Entering offline mode");
        self.config.offline_mode = true;
        self.save_config();
        self.connectivity.set_online(false);
    }

    /// Resume normal operation and refresh the current subject.
    pub fn go_online(&mut self) {
        info!("Exiting offline mode");
        self.config.offline_mode = false;
        self.save_config();
        self.connectivity.set_online(true);
    }

    fn handle_connectivity(&mut self, event: ConnectivityEvent) {
        match event {
            ConnectivityEvent::Online => {
                self.status_message = Some("Back online".to_string());
                if !self.practicing_generated {
                    self.start_load();
                }
            }
            ConnectivityEvent::Offline => {
                self.status_message = Some("Offline: using saved questions".to_string());
                if matches!(self.load_status, LoadStatus::Failed(_) | LoadStatus::Loading) {
                    self.start_load();
                }
            }
        }
    }

    // =========================================================================
    // Cache Panel
    // =========================================================================

    pub fn open_cache_panel(&mut self) {
        self.refresh_cache_stats();
        self.state = AppState::ShowingCache;
    }

    fn refresh_cache_stats(&mut self) {
        self.cache_stats = self.cache.stats();
        self.current_entry_age = self
            .cache
            .get(&self.config.class_name, &self.config.subject)
            .map(|entry| entry.age_display());
    }

    pub fn clear_current_cache(&mut self) {
        self.cache.clear(&self.config.class_name, &self.config.subject);
        info!(class = %self.config.class_name, subject = %self.config.subject, "Cleared saved questions");
        self.status_message = Some(format!("Cleared saved questions for {}", self.subject_label()));
        self.refresh_cache_stats();
    }

    pub fn clear_all_cache(&mut self) {
        let removed = self.cache.clear_all();
        info!(removed, "Cleared all saved questions");
        self.status_message = Some(format!("Cleared {} saved question sets", removed));
        self.refresh_cache_stats();
    }

    // =========================================================================
    // Assistant
    // =========================================================================

    pub fn open_assistant(&mut self) {
        self.state = AppState::Assistant;
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if self.assistant_input.chars().count() < MAX_PROMPT_LENGTH && !c.is_control() {
            self.assistant_input.push(c);
        }
    }

    /// Send the typed prompt for the selected assistant tab.
    pub fn send_assistant_request(&mut self) {
        let input = self.assistant_input.trim().to_string();
        if input.is_empty() || self.assistant_view == AssistantView::Waiting {
            return;
        }
        if self.is_offline() {
            self.assistant_view =
                AssistantView::Error("The assistant is not available in offline mode.".to_string());
            return;
        }

        let class_name = &self.config.class_name;
        let subject = &self.config.subject;
        let request = match self.assistant_tab {
            AssistantTab::Chat => AssistantRequest::Chat { prompt: input },
            AssistantTab::StudyPlan => AssistantRequest::study_plan(class_name, subject, &input),
            AssistantTab::Generate => AssistantRequest::GenerateQuestions {
                class_name: class_name.clone(),
                subject: subject.clone(),
                chapter: Some(input),
                count: GENERATED_QUESTION_COUNT,
            },
        };

        let client = self.assistant.clone();
        let tx = self.bg_tx.clone();
        let origin = self.assistant_origin();
        self.assistant_view = AssistantView::Waiting;

        tokio::spawn(async move {
            let result = client.send(&request).await;
            Self::send_result(&tx, BackgroundResult::Assistant { origin, result }).await;
        });
    }

    fn assistant_origin(&self) -> AssistantOrigin {
        AssistantOrigin {
            tab: self.assistant_tab,
            class_name: self.config.class_name.clone(),
            subject: self.config.subject.clone(),
            generation: self.tracker.generation(),
        }
    }

    fn apply_assistant_result(
        &mut self,
        origin: AssistantOrigin,
        result: Result<AssistantReply, AssistantError>,
    ) {
        // Replies sent before a tab, subject or reload change are stale
        if origin != self.assistant_origin() {
            debug!(tab = ?origin.tab, subject = %origin.subject, "Discarding stale assistant reply");
            if self.assistant_view == AssistantView::Waiting {
                self.assistant_view = AssistantView::Empty;
            }
            return;
        }
        self.assistant_view = match result {
            Ok(AssistantReply::Text(text)) if text.is_empty() => {
                AssistantView::Text("(The assistant returned an empty answer.)".to_string())
            }
            Ok(AssistantReply::Text(text)) => AssistantView::Text(text),
            Ok(AssistantReply::Plan(plan)) if plan.is_empty() => {
                AssistantView::Text("(The assistant did not return a study plan.)".to_string())
            }
            Ok(AssistantReply::Plan(plan)) => AssistantView::Plan(plan),
            Ok(AssistantReply::Questions(generated)) => {
                let (mcq, short, long) =
                    generated.into_records(&origin.class_name, &origin.subject);
                let questions = QuestionSet { mcq, short, long };
                if questions.is_empty() {
                    AssistantView::Text("(The assistant did not return usable questions.)".to_string())
                } else {
                    let total = questions.total();
                    self.practice_generated(questions);
                    AssistantView::Text(format!(
                        "Generated {} questions. Close this panel to practice them.",
                        total
                    ))
                }
            }
            Err(e) => {
                warn!(error = %e, "Assistant request failed");
                AssistantView::Error(e.user_message().to_string())
            }
        };
    }

    /// Replace the quiz with a generated set. Generated sets are not cached.
    fn practice_generated(&mut self, questions: QuestionSet) {
        self.tracker.cancel();
        self.set_questions(questions);
        self.data_source = None;
        self.cached_at = None;
        self.failed_kinds.clear();
        self.practicing_generated = true;
        self.load_status = LoadStatus::Ready;
        self.status_message = Some("Practicing generated questions ([u] to reload saved)".to_string());
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Helper to send results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<BackgroundResult>, result: BackgroundResult) {
        if tx.send(result).await.is_err() {
            error!("Failed to send background result - channel closed");
        }
    }

    /// Check for completed background tasks and connectivity changes
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.bg_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            match result {
                BackgroundResult::Quiz { generation, result } => {
                    self.apply_load_result(generation, result)
                }
                BackgroundResult::Assistant { origin, result } => {
                    self.apply_assistant_result(origin, result)
                }
            }
        }

        loop {
            match self.connectivity_rx.try_recv() {
                Ok(event) => self.handle_connectivity(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Missed connectivity events");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character should be accepted into a typed answer
pub fn can_add_answer_char(current_len: usize, c: char) -> bool {
    current_len < MAX_ANSWER_LENGTH && !c.is_control()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use quizcache_core::models::{GeneratedAnswer, GeneratedQuestions};
    use quizcache_core::{ApiError, MemoryStore};

    /// Source that always answers with empty lists.
    struct FixedSource;

    #[async_trait]
    impl QuestionSource for FixedSource {
        async fn fetch_mcq(&self, _: &str, _: &str) -> Result<Vec<McqQuestion>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_short(&self, _: &str, _: &str) -> Result<Vec<WrittenQuestion>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_long(&self, _: &str, _: &str) -> Result<Vec<WrittenQuestion>, ApiError> {
            Ok(Vec::new())
        }
    }

    pub(crate) fn test_app() -> App {
        let cache = QuizCache::new(Arc::new(MemoryStore::new()));
        let assistant = AssistantClient::new("http://127.0.0.1:9/api/ai", 1).unwrap();
        App::with_services(Config::default(), cache, Arc::new(FixedSource), assistant)
    }

    fn mcq(subject: &str) -> McqQuestion {
        McqQuestion {
            id: Some(1),
            class_name: "nine".to_string(),
            subject: subject.to_string(),
            question: "2 + 2 = ?".to_string(),
            option1: "3".to_string(),
            option2: "5".to_string(),
            option3: "4".to_string(),
            option4: "22".to_string(),
            correct_option: 3,
        }
    }

    fn written(answer: &str) -> WrittenQuestion {
        WrittenQuestion {
            id: Some(2),
            class_name: "nine".to_string(),
            subject: "bangla".to_string(),
            question: "বাংলাদেশের রাজধানী?".to_string(),
            answer: answer.to_string(),
        }
    }

    fn loaded(subject: &str) -> LoadedQuiz {
        LoadedQuiz {
            class_name: "nine".to_string(),
            subject: subject.to_string(),
            questions: QuestionSet {
                mcq: vec![mcq(subject)],
                short: vec![],
                long: vec![],
            },
            source: DataSource::Network,
            cached_at: Utc::now(),
            failed: vec![],
        }
    }

    #[test]
    fn test_superseded_result_is_ignored() {
        let mut app = test_app();
        let first = app.tracker.begin();
        let second = app.tracker.begin();

        app.apply_load_result(first.generation, Ok(loaded("bangla")));
        assert!(app.questions.is_empty());

        app.apply_load_result(second.generation, Ok(loaded("math")));
        assert_eq!(app.questions.mcq[0].subject, "math");
        assert_eq!(app.load_status, LoadStatus::Ready);

        // A late duplicate of the first load still changes nothing
        app.apply_load_result(first.generation, Ok(loaded("bangla")));
        assert_eq!(app.questions.mcq[0].subject, "math");
    }

    #[test]
    fn test_offline_without_cache_blocks() {
        let mut app = test_app();
        let ticket = app.tracker.begin();
        app.apply_load_result(
            ticket.generation,
            Err(LoadError::OfflineNoCache {
                class_name: "nine".to_string(),
                subject: "bangla".to_string(),
            }),
        );
        assert!(matches!(app.load_status, LoadStatus::Failed(ref msg) if msg.contains("offline")));
    }

    #[test]
    fn test_mcq_wrong_then_retry_then_right() {
        let mut app = test_app();
        app.set_questions(QuestionSet {
            mcq: vec![mcq("math")],
            ..Default::default()
        });

        app.select_option(1);
        app.submit_answer();
        assert_eq!(
            app.current_progress().state(),
            &QuizState::Graded(Verdict::Incorrect { reference: "4".to_string() })
        );
        // Input is locked while the verdict is shown
        app.select_option(2);
        assert_eq!(app.selected_option, 1);

        app.continue_after_grade();
        app.select_option(3);
        app.submit_answer();
        app.continue_after_grade();
        assert!(app.current_progress().is_finished());
    }

    #[test]
    fn test_written_answers_per_kind() {
        let mut app = test_app();
        app.set_questions(QuestionSet {
            mcq: vec![mcq("bangla")],
            short: vec![written("ঢাকা")],
            long: vec![written("ঢাকা")],
        });

        app.switch_kind(QuestionKind::Short);
        for c in " ঢাকা ".chars() {
            app.push_answer_char(c);
        }
        app.submit_answer();
        assert!(matches!(
            app.current_progress().state(),
            QuizState::Graded(Verdict::Correct)
        ));

        // Blank long answer is wrong
        app.switch_kind(QuestionKind::Long);
        assert!(app.answer_input.is_empty());
        app.submit_answer();
        assert!(matches!(
            app.current_progress().state(),
            QuizState::Graded(Verdict::Incorrect { .. })
        ));

        // MCQ progress untouched
        assert_eq!(app.progress(QuestionKind::Mcq).state(), &QuizState::Idle);
    }

    #[test]
    fn test_reset_clears_all_progress() {
        let mut app = test_app();
        app.set_questions(QuestionSet {
            mcq: vec![mcq("bangla")],
            short: vec![written("a")],
            long: vec![],
        });
        app.submit_answer();
        app.reset_quiz();
        for kind in QuestionKind::ALL {
            assert!(app.progress(kind).is_finished());
            assert_eq!(app.progress(kind).graded_count(), 0);
        }
    }

    #[test]
    fn test_assistant_error_shows_user_message() {
        let mut app = test_app();
        let err = AssistantError::Status {
            status: 503,
            body: String::new(),
        };
        let origin = app.assistant_origin();
        app.apply_assistant_result(origin, Err(err));
        assert!(matches!(app.assistant_view, AssistantView::Error(ref m) if m.contains("try again")));
    }

    fn generated_reply() -> AssistantReply {
        AssistantReply::Questions(GeneratedQuestions {
            mcq: vec![],
            short: vec![GeneratedAnswer {
                question: "কারক কয় প্রকার?".to_string(),
                answer: "ছয়".to_string(),
            }],
            long: vec![],
        })
    }

    #[test]
    fn test_generated_reply_replaces_quiz() {
        let mut app = test_app();
        app.assistant_tab = AssistantTab::Generate;
        let origin = app.assistant_origin();

        app.apply_assistant_result(origin, Ok(generated_reply()));
        assert!(app.practicing_generated);
        assert_eq!(app.questions.short[0].subject, "bangla");
    }

    #[test]
    fn test_generated_reply_after_subject_switch_is_dropped() {
        let mut app = test_app();
        app.assistant_tab = AssistantTab::Generate;
        app.assistant_view = AssistantView::Waiting;
        let origin = app.assistant_origin();

        // Subject changes and its load starts before the reply lands
        app.config.subject = "math".to_string();
        let ticket = app.tracker.begin();

        app.apply_assistant_result(origin, Ok(generated_reply()));
        assert!(!app.practicing_generated);
        assert!(app.questions.is_empty());
        assert!(app.tracker.is_current(ticket.generation));
        assert_eq!(app.assistant_view, AssistantView::Empty);
    }

    #[test]
    fn test_generated_reply_after_reload_is_dropped() {
        let mut app = test_app();
        app.assistant_tab = AssistantTab::Generate;
        let origin = app.assistant_origin();

        let ticket = app.tracker.begin();
        app.apply_assistant_result(origin, Ok(generated_reply()));
        assert!(!app.practicing_generated);
        assert!(app.tracker.is_current(ticket.generation));
    }

    #[test]
    fn test_can_add_answer_char() {
        assert!(can_add_answer_char(0, 'ঢ'));
        assert!(!can_add_answer_char(0, '\n'));
        assert!(!can_add_answer_char(MAX_ANSWER_LENGTH, 'a'));
    }

    #[test]
    fn test_assistant_tab_cycle() {
        assert_eq!(AssistantTab::Chat.next(), AssistantTab::StudyPlan);
        assert_eq!(AssistantTab::Generate.next(), AssistantTab::Chat);
    }
}
