use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use quizcache_core::cache::age_display;
use quizcache_core::models::QuestionKind;
use quizcache_core::utils::format_timestamp;
use quizcache_core::DataSource;

use crate::app::{App, AppState, LoadStatus};

use super::styles;
use super::{assistant, quiz};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Kind tabs
            Constraint::Min(10),   // Question panel
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    quiz::render(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::PickingSubject => render_subject_overlay(frame, app),
        AppState::ShowingCache => render_cache_overlay(frame, app),
        AppState::Assistant => assistant::render(frame, app),
        AppState::ConfirmingQuit => render_confirm_overlay(
            frame,
            "Are you sure you want to quit?",
            " to quit, ",
        ),
        AppState::ConfirmingOffline => render_confirm_overlay(
            frame,
            "Work offline from saved questions?",
            " to go offline, ",
        ),
        AppState::ConfirmingOnline => render_confirm_overlay(
            frame,
            "You are offline. Go back online?",
            " to go online, ",
        ),
        AppState::ConfirmingClearAll => render_confirm_overlay(
            frame,
            "Delete all saved question sets?",
            " to delete, ",
        ),
        AppState::Normal | AppState::Typing | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        "  Quizcache  Class {}  {}",
        app.config.class_name.to_uppercase(),
        app.subject_label()
    );
    let (badge, fresh) = source_badge(app);
    let help_hint = "[?] Help";

    let used = title.chars().count() + badge.chars().count() + help_hint.len() + 6;
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(badge, styles::badge_style(fresh)),
        Span::raw("  "),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

/// Badge text describing where the shown questions came from.
fn source_badge(app: &App) -> (String, bool) {
    if app.practicing_generated {
        return ("✦ Generated".to_string(), true);
    }
    let age = app
        .cached_at
        .map(|t| age_display((chrono::Utc::now() - t).num_minutes()))
        .unwrap_or_default();
    match (app.data_source, app.is_offline()) {
        (Some(DataSource::Cache), true) => (format!("○ Offline · saved {}", age), false),
        (Some(DataSource::Cache), false) => (format!("◐ Saved {}", age), false),
        (Some(DataSource::Network), _) => ("● Live".to_string(), true),
        (None, true) => ("○ Offline".to_string(), false),
        (None, false) => (String::new(), true),
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, kind) in QuestionKind::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let count = app.questions.len(*kind);
        let label = format!("[{}] {} ({})", i + 1, kind.title(), count);
        spans.push(Span::styled(label, styles::tab_style(app.current_kind == *kind)));
        if app.failed_kinds.contains(kind) {
            spans.push(Span::styled(" !", styles::error_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[s]ubject [a]ssistant [c]ache [o]ffline [u]pdate [q]uit";

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        match app.load_status {
            LoadStatus::Loading => " Loading... ".to_string(),
            _ => match app.cached_at {
                Some(t) => format!(" Updated {} ", format_timestamp(&t)),
                None => String::new(),
            },
        }
    };

    let right_text = format!(" {} ", shortcuts);
    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::key_style()),
        Span::styled(desc, styles::text_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Quizcache", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::heading_style())),
        help_line("1-3", "MCQ / Short / Long questions"),
        help_line("←/→ Tab", "Previous/next question type"),
        help_line("s", "Pick subject"),
        Line::from(""),
        Line::from(Span::styled(" Answering", styles::heading_style())),
        help_line("↑/↓", "Choose an option"),
        help_line("i", "Type a written answer"),
        help_line("Enter", "Submit / next / try again"),
        help_line("n", "Skip question"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::heading_style())),
        help_line("u", "Reload questions"),
        help_line("o", "Toggle offline mode"),
        help_line("c", "Saved questions"),
        help_line("a", "Assistant"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::panel_border_style())
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}

fn render_subject_overlay(frame: &mut Frame, app: &App) {
    let subjects = app.subjects();
    let height = (subjects.len() as u16 + 2).min(20);
    let area = centered_rect_fixed(36, height, frame.area());
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = subjects
        .iter()
        .enumerate()
        .map(|(i, subject)| {
            let style = if i == app.subject_selection {
                styles::selected_style()
            } else {
                styles::text_style()
            };
            let current = if subject.key == app.config.subject { " •" } else { "" };
            ListItem::new(Line::from(format!(" {}{}", subject.label, current))).style(style)
        })
        .collect();

    let block = Block::default()
        .title(" Subject ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::panel_border_style());

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(app.subject_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_cache_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 14, frame.area());
    frame.render_widget(Clear, area);

    let stats = &app.cache_stats;
    let stamp = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| format_timestamp(&t)).unwrap_or_else(|| "-".to_string())
    };
    let current = app
        .current_entry_age
        .clone()
        .unwrap_or_else(|| "not saved".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled(" Saved sets:   ", styles::muted_style()),
            Span::raw(stats.total_cached.to_string()),
        ]),
        Line::from(vec![
            Span::styled(" Total size:   ", styles::muted_style()),
            Span::raw(stats.size_display()),
        ]),
        Line::from(vec![
            Span::styled(" Oldest:       ", styles::muted_style()),
            Span::raw(stamp(stats.oldest)),
        ]),
        Line::from(vec![
            Span::styled(" Newest:       ", styles::muted_style()),
            Span::raw(stamp(stats.newest)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!(" {}: ", app.subject_label()), styles::heading_style()),
            Span::raw(current),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" [x]", styles::key_style()),
            Span::styled(" clear this subject  ", styles::muted_style()),
            Span::styled("[X]", styles::key_style()),
            Span::styled(" clear all", styles::muted_style()),
        ]),
        Line::from(vec![
            Span::styled(" [Esc]", styles::key_style()),
            Span::styled(" close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(" Saved Questions ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::panel_border_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, action: &str) {
    let area = centered_rect_fixed(46, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("   {}", question),
            styles::heading_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::key_style()),
            Span::styled(action.to_string(), styles::muted_style()),
            Span::styled("[N]", styles::key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::panel_border_style())
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(50, 10, outer), Rect::new(25, 15, 50, 10));
        // Clamped to the available area
        let small = Rect::new(0, 0, 20, 5);
        assert_eq!(centered_rect_fixed(50, 10, small), Rect::new(0, 0, 20, 5));
    }
}
