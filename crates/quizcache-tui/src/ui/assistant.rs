use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use quizcache_core::models::StudyPlan;

use crate::app::{App, AssistantTab, AssistantView};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

const PANEL_WIDTH: u16 = 80;
const PANEL_HEIGHT: u16 = 28;

pub fn render(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(PANEL_WIDTH, PANEL_HEIGHT, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" Assistant - {} ", app.subject_label()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::panel_border_style())
        .style(Style::default());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Tabs
            Constraint::Length(2), // Prompt
            Constraint::Min(3),    // Reply
            Constraint::Length(1), // Hints
        ])
        .split(inner);

    // Tabs
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in [AssistantTab::Chat, AssistantTab::StudyPlan, AssistantTab::Generate]
        .iter()
        .enumerate()
    {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(tab.title(), styles::tab_style(*tab == app.assistant_tab)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

    // Prompt
    let prompt = Line::from(vec![
        Span::styled(format!(" {}: ", app.assistant_tab.prompt_label()), styles::muted_style()),
        Span::styled(format!("{}▌", app.assistant_input), styles::input_style(true)),
    ]);
    frame.render_widget(Paragraph::new(prompt), chunks[1]);

    // Reply
    let reply = match &app.assistant_view {
        AssistantView::Empty => vec![Line::from(Span::styled(
            " Type a prompt and press Enter.",
            styles::muted_style(),
        ))],
        AssistantView::Waiting => vec![Line::from(Span::styled(
            " Thinking...",
            styles::muted_style(),
        ))],
        AssistantView::Text(text) => text.lines().map(|l| Line::from(format!(" {}", l))).collect(),
        AssistantView::Plan(plan) => plan_lines(plan),
        AssistantView::Error(message) => vec![Line::from(Span::styled(
            format!(" {}", message),
            styles::error_style(),
        ))],
    };
    frame.render_widget(Paragraph::new(reply).wrap(Wrap { trim: false }), chunks[2]);

    let hints = Line::from(vec![
        Span::styled(" [Tab]", styles::key_style()),
        Span::styled(" mode  ", styles::muted_style()),
        Span::styled("[Enter]", styles::key_style()),
        Span::styled(" send  ", styles::muted_style()),
        Span::styled("[Esc]", styles::key_style()),
        Span::styled(" close", styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(hints), chunks[3]);
}

fn plan_lines(plan: &StudyPlan) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if !plan.overview.is_empty() {
        lines.push(Line::from(Span::styled(" Overview", styles::heading_style())));
        lines.push(Line::from(format!(" {}", plan.overview)));
        lines.push(Line::from(""));
    }

    if !plan.roadmap.is_empty() {
        lines.push(Line::from(Span::styled(" Roadmap", styles::heading_style())));
        for (i, step) in plan.roadmap.iter().enumerate() {
            lines.push(Line::from(format!(" {}. {}", i + 1, step.title)));
            if let Some(ref details) = step.details {
                lines.push(Line::from(Span::styled(
                    format!("    {}", details),
                    styles::muted_style(),
                )));
            }
        }
        lines.push(Line::from(""));
    }

    if !plan.key_points.is_empty() {
        lines.push(Line::from(Span::styled(" Key points", styles::heading_style())));
        for point in &plan.key_points {
            lines.push(Line::from(format!("  • {}", point)));
        }
        lines.push(Line::from(""));
    }

    if let Some(ref game) = plan.game {
        let title = game.title.clone().unwrap_or_else(|| "Game".to_string());
        lines.push(Line::from(Span::styled(format!(" {}", title), styles::heading_style())));
        lines.push(Line::from(format!(" {}", game.description)));
    }

    lines
}
