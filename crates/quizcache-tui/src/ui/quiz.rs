use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use quizcache_core::models::QuestionKind;
use quizcache_core::{QuizState, Verdict};

use crate::app::{App, AppState, LoadStatus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let progress = app.current_progress();
    let title = if progress.is_empty() {
        format!(" {} ", app.current_kind.title())
    } else {
        format!(
            " {} {}/{} ",
            app.current_kind.title(),
            (progress.index() + 1).min(progress.len()),
            progress.len()
        )
    };

    let lines = match &app.load_status {
        LoadStatus::Idle => vec![Line::from(Span::styled(
            "Press [u] to load questions",
            styles::muted_style(),
        ))],
        LoadStatus::Loading if app.questions.is_empty() => vec![Line::from(Span::styled(
            "Loading questions...",
            styles::muted_style(),
        ))],
        LoadStatus::Failed(message) => failed_lines(message),
        _ => question_lines(app),
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::panel_border_style());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn failed_lines(message: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(message.to_string(), styles::error_style())),
        Line::from(""),
        Line::from(Span::styled(
            "Press [o] to go online or [s] to pick another subject.",
            styles::muted_style(),
        )),
    ]
}

fn question_lines(app: &App) -> Vec<Line<'static>> {
    let progress = app.current_progress();

    if progress.is_empty() {
        return vec![Line::from(Span::styled(
            format!(
                "No {} questions found for {}.",
                app.current_kind.title(),
                app.subject_label()
            ),
            styles::muted_style(),
        ))];
    }

    if progress.is_finished() {
        return vec![
            Line::from(Span::styled("All questions done!", styles::correct_style())),
            Line::from(""),
            Line::from(format!(
                "{} correct out of {} attempts.",
                progress.correct_count(),
                progress.graded_count()
            )),
            Line::from(""),
            Line::from(Span::styled("Press Enter to start over.", styles::muted_style())),
        ];
    }

    let mut lines = Vec::new();
    match app.current_kind {
        QuestionKind::Mcq => {
            let Some(question) = app.current_mcq() else {
                return lines;
            };
            lines.push(Line::from(Span::styled(
                question.question.clone(),
                styles::text_style(),
            )));
            lines.push(Line::from(""));

            let locked = !app.can_answer();
            for (i, option) in question.options().iter().enumerate() {
                let number = i as u8 + 1;
                let chosen = number == app.selected_option;
                let marker = if chosen { "(•)" } else { "( )" };
                let style = if locked && number == question.correct_option {
                    styles::correct_style()
                } else if chosen {
                    styles::selected_style()
                } else {
                    styles::text_style()
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {} {}. ", marker, number), styles::muted_style()),
                    Span::styled(option.to_string(), style),
                ]));
            }
        }
        QuestionKind::Short | QuestionKind::Long => {
            let Some(question) = app.current_written() else {
                return lines;
            };
            lines.push(Line::from(Span::styled(
                question.question.clone(),
                styles::text_style(),
            )));
            lines.push(Line::from(""));

            let typing = app.state == AppState::Typing;
            let cursor = if typing { "▌" } else { "" };
            lines.push(Line::from(Span::styled("Your answer:", styles::muted_style())));
            lines.push(Line::from(Span::styled(
                format!("  {}{}", app.answer_input, cursor),
                styles::input_style(typing),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.extend(feedback_lines(progress.state(), app.current_kind, app.state == AppState::Typing));
    lines
}

fn feedback_lines(state: &QuizState, kind: QuestionKind, typing: bool) -> Vec<Line<'static>> {
    match state {
        QuizState::Graded(Verdict::Correct) => vec![
            Line::from(Span::styled("✓ Correct!", styles::correct_style())),
            Line::from(Span::styled(
                "Press Enter for the next question.",
                styles::muted_style(),
            )),
        ],
        QuizState::Graded(Verdict::Incorrect { reference }) => vec![
            Line::from(Span::styled("✗ Incorrect.", styles::error_style())),
            Line::from(vec![
                Span::styled("Correct answer: ", styles::heading_style()),
                Span::raw(reference.clone()),
            ]),
            Line::from(Span::styled(
                "[Enter] try again  [n] skip",
                styles::muted_style(),
            )),
        ],
        QuizState::Idle | QuizState::Answering => {
            let hint = match kind {
                QuestionKind::Mcq => "[↑/↓] choose  [Enter] submit  [n] skip",
                _ if typing => "[Enter] submit  [Esc] stop typing",
                QuestionKind::Short | QuestionKind::Long => "[i] type answer  [n] skip",
            };
            vec![Line::from(Span::styled(hint, styles::muted_style()))]
        }
        QuizState::Finished => Vec::new(),
    }
}
