//! Command line interface.
//!
//! Without a subcommand the binary runs the terminal UI. The subcommands
//! cover cache maintenance, question bank administration and one-shot
//! assistant requests, printing to stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use quizcache_core::models::{McqQuestion, QuestionKind, WrittenKind, WrittenQuestion};
use quizcache_core::utils::format_timestamp;
use quizcache_core::{
    AssistantClient, Config, FileStore, QuestionBankClient, QuestionSource, QuizCache,
};

/// Questions requested by `generate` unless `--count` is given.
const DEFAULT_GENERATE_COUNT: u32 = 5;

#[derive(Parser, Debug)]
#[command(name = "quizcache")]
#[command(about = "A terminal quiz trainer with offline question caching")]
#[command(version)]
pub struct Cli {
    /// Class to study (overrides the config file)
    #[arg(short, long, global = true)]
    pub class: Option<String>,

    /// Subject key to study (overrides the config file)
    #[arg(short, long, global = true)]
    pub subject: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or clear saved question sets
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage questions in the question bank
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Ask the study assistant a question
    Ask {
        /// The question to ask
        prompt: String,
    },

    /// Build a study plan for a chapter
    Plan {
        /// Chapter or topic
        chapter: String,
    },

    /// Ask about a page of the subject's textbook
    Page {
        /// Page number being read
        page: u32,

        /// The question about the page
        question: String,

        /// Text of the page, sent as context
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Generate practice questions for the current subject
    Generate {
        /// Optional chapter to focus on
        #[arg(long)]
        chapter: Option<String>,

        /// Number of questions to request
        #[arg(short = 'n', long, default_value_t = DEFAULT_GENERATE_COUNT)]
        count: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show how many sets are saved and how much space they use
    Stats,
    /// Remove the saved set for the current class and subject
    Clear,
    /// Remove every saved set
    ClearAll,
}

#[derive(Subcommand, Debug)]
pub enum AdminAction {
    /// List questions of one kind for the current class and subject
    List {
        #[arg(value_parser = parse_kind)]
        kind: QuestionKind,
    },

    /// Add a multiple-choice question
    AddMcq {
        #[command(flatten)]
        fields: McqFields,
    },

    /// Add a short or long question
    AddWritten {
        #[arg(value_parser = parse_written_kind)]
        kind: WrittenKind,
        #[command(flatten)]
        fields: WrittenFields,
    },

    /// Replace a multiple-choice question
    UpdateMcq {
        id: i64,
        #[command(flatten)]
        fields: McqFields,
    },

    /// Replace a short or long question
    UpdateWritten {
        #[arg(value_parser = parse_written_kind)]
        kind: WrittenKind,
        id: i64,
        #[command(flatten)]
        fields: WrittenFields,
    },

    /// Delete a question
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: QuestionKind,
        id: i64,
    },
}

#[derive(clap::Args, Debug)]
pub struct McqFields {
    /// Question text
    #[arg(short, long)]
    pub question: String,

    /// The four options, in order
    #[arg(short, long, num_args = 4, required = true)]
    pub options: Vec<String>,

    /// 1-based index of the correct option
    #[arg(long)]
    pub correct: u8,
}

#[derive(clap::Args, Debug)]
pub struct WrittenFields {
    /// Question text
    #[arg(short, long)]
    pub question: String,

    /// Reference answer
    #[arg(short, long)]
    pub answer: String,
}

fn parse_kind(s: &str) -> Result<QuestionKind, String> {
    QuestionKind::parse(s).ok_or_else(|| format!("unknown question kind '{}' (mcq, short, long)", s))
}

fn parse_written_kind(s: &str) -> Result<WrittenKind, String> {
    match QuestionKind::parse(s) {
        Some(QuestionKind::Short) => Ok(WrittenKind::Short),
        Some(QuestionKind::Long) => Ok(WrittenKind::Long),
        _ => Err(format!("expected 'short' or 'long', got '{}'", s)),
    }
}

impl McqFields {
    fn into_question(self, id: Option<i64>, config: &Config) -> McqQuestion {
        let mut options = self.options.into_iter();
        let mut next = || options.next().unwrap_or_default();
        McqQuestion {
            id,
            class_name: config.class_name.clone(),
            subject: config.subject.clone(),
            question: self.question,
            option1: next(),
            option2: next(),
            option3: next(),
            option4: next(),
            correct_option: self.correct,
        }
    }
}

impl WrittenFields {
    fn into_question(self, id: Option<i64>, config: &Config) -> WrittenQuestion {
        WrittenQuestion {
            id,
            class_name: config.class_name.clone(),
            subject: config.subject.clone(),
            question: self.question,
            answer: self.answer,
        }
    }
}

// ============================================================================
// Command runners
// ============================================================================

pub async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Cache { action } => run_cache(action, config),
        Command::Admin { action } => run_admin(action, config).await,
        Command::Ask { prompt } => {
            let reply = assistant_client(config)?
                .chat(&prompt)
                .await
                .context("Assistant request failed")?;
            println!("{}", reply);
            Ok(())
        }
        Command::Plan { chapter } => {
            let plan = assistant_client(config)?
                .study_plan(&config.class_name, &config.subject, &chapter)
                .await
                .context("Assistant request failed")?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(())
        }
        Command::Page { page, question, context } => {
            let reply = assistant_client(config)?
                .page_chat(
                    &config.subject,
                    config.subject_label(&config.subject),
                    page,
                    &question,
                    &context,
                )
                .await
                .context("Assistant request failed")?;
            println!("{}", reply);
            Ok(())
        }
        Command::Generate { chapter, count } => {
            let generated = assistant_client(config)?
                .generate_questions(&config.class_name, &config.subject, chapter.as_deref(), count)
                .await
                .context("Assistant request failed")?;
            let (mcq, short, long) = generated.into_records(&config.class_name, &config.subject);
            let output = serde_json::json!({ "mcq": mcq, "short": short, "long": long });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

fn assistant_client(config: &Config) -> Result<AssistantClient> {
    AssistantClient::new(&config.assistant_url, config.request_timeout_secs)
        .context("Failed to create assistant client")
}

fn open_cache(config: &Config) -> Result<QuizCache> {
    let dir = config.questions_dir()?;
    let store = FileStore::new(dir.clone())
        .with_context(|| format!("Failed to open question cache at {}", dir.display()))?;
    Ok(QuizCache::new(Arc::new(store)))
}

fn run_cache(action: CacheAction, config: &Config) -> Result<()> {
    let cache = open_cache(config)?;
    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            let stamp = |t: Option<chrono::DateTime<chrono::Utc>>| {
                t.map(|t| format_timestamp(&t)).unwrap_or_else(|| "-".to_string())
            };
            println!("Saved sets: {}", stats.total_cached);
            println!("Total size: {}", stats.size_display());
            println!("Oldest:     {}", stamp(stats.oldest));
            println!("Newest:     {}", stamp(stats.newest));
            match cache.get(&config.class_name, &config.subject) {
                Some(entry) => println!(
                    "{} / {}: saved {}",
                    config.class_name,
                    config.subject,
                    entry.age_display()
                ),
                None => println!("{} / {}: not saved", config.class_name, config.subject),
            }
        }
        CacheAction::Clear => {
            cache.clear(&config.class_name, &config.subject);
            println!("Cleared saved questions for {} / {}", config.class_name, config.subject);
        }
        CacheAction::ClearAll => {
            let removed = cache.clear_all();
            println!("Cleared {} saved question sets", removed);
        }
    }
    Ok(())
}

async fn run_admin(action: AdminAction, config: &Config) -> Result<()> {
    let client = QuestionBankClient::new(&config.api_base_url, config.request_timeout_secs)
        .context("Failed to create question bank client")?;

    match action {
        AdminAction::List { kind } => {
            let json = match kind {
                QuestionKind::Mcq => {
                    let items = client.fetch_mcq(&config.class_name, &config.subject).await?;
                    serde_json::to_string_pretty(&items)?
                }
                QuestionKind::Short | QuestionKind::Long => {
                    let written = if kind == QuestionKind::Short {
                        WrittenKind::Short
                    } else {
                        WrittenKind::Long
                    };
                    let items = client
                        .fetch_written(written, &config.class_name, &config.subject)
                        .await?;
                    serde_json::to_string_pretty(&items)?
                }
            };
            println!("{}", json);
        }
        AdminAction::AddMcq { fields } => {
            let created = client.create_mcq(&fields.into_question(None, config)).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        AdminAction::AddWritten { kind, fields } => {
            let created = client
                .create_written(kind, &fields.into_question(None, config))
                .await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        AdminAction::UpdateMcq { id, fields } => {
            let updated = client.update_mcq(&fields.into_question(Some(id), config)).await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        AdminAction::UpdateWritten { kind, id, fields } => {
            let updated = client
                .update_written(kind, &fields.into_question(Some(id), config))
                .await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        AdminAction::Delete { kind, id } => {
            client.delete(kind, id).await?;
            println!("Deleted {} question {}", kind, id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_runs_tui() {
        let cli = Cli::try_parse_from(["quizcache", "--class", "ten"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.class.as_deref(), Some("ten"));
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from(["quizcache", "cache", "clear", "--subject", "math"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Cache { action: CacheAction::Clear })
        ));
        assert_eq!(cli.subject.as_deref(), Some("math"));
    }

    #[test]
    fn test_add_mcq_takes_four_options() {
        let cli = Cli::try_parse_from([
            "quizcache", "admin", "add-mcq", "-q", "2 + 2 = ?", "-o", "3", "5", "4", "22",
            "--correct", "3",
        ])
        .unwrap();
        let Some(Command::Admin { action: AdminAction::AddMcq { fields } }) = cli.command else {
            panic!("expected add-mcq");
        };
        let question = fields.into_question(None, &Config::default());
        assert_eq!(question.option3, "4");
        assert_eq!(question.correct_answer(), Some("4"));
        assert_eq!(question.class_name, "nine");

        assert!(Cli::try_parse_from([
            "quizcache", "admin", "add-mcq", "-q", "x", "-o", "a", "b", "--correct", "1",
        ])
        .is_err());
    }

    #[test]
    fn test_page_question() {
        let cli = Cli::try_parse_from(["quizcache", "page", "12", "What is a verb?"]).unwrap();
        let Some(Command::Page { page, question, context }) = cli.command else {
            panic!("expected page");
        };
        assert_eq!(page, 12);
        assert_eq!(question, "What is a verb?");
        assert!(context.is_empty());
    }

    #[test]
    fn test_kind_parsers() {
        assert_eq!(parse_kind("MCQ"), Ok(QuestionKind::Mcq));
        assert!(parse_kind("essay").is_err());
        assert_eq!(parse_written_kind("long"), Ok(WrittenKind::Long));
        assert!(parse_written_kind("mcq").is_err());
    }
}
