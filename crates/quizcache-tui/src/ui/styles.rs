use ratatui::style::{Color, Modifier, Style};

// Palette
pub const INK: Color = Color::Rgb(72, 132, 204);
pub const CORRECT: Color = Color::Rgb(92, 168, 104);
pub const AMBER: Color = Color::Rgb(204, 164, 72);
pub const WRONG: Color = Color::Rgb(200, 72, 72);
pub const DIM: Color = Color::Rgb(124, 124, 132);
pub const CURSOR_BG: Color = Color::Rgb(44, 48, 64);
pub const BAR_BG: Color = Color::Rgb(30, 32, 42);

pub fn title_style() -> Style {
    Style::default().fg(INK).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(CURSOR_BG).add_modifier(Modifier::BOLD)
}

pub fn text_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(DIM)
}

pub fn heading_style() -> Style {
    Style::default().fg(AMBER)
}

pub fn key_style() -> Style {
    heading_style().add_modifier(Modifier::BOLD)
}

/// Correct verdicts and the revealed MCQ answer
pub fn correct_style() -> Style {
    Style::default().fg(CORRECT).add_modifier(Modifier::BOLD)
}

pub fn error_style() -> Style {
    Style::default().fg(WRONG)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        title_style().add_modifier(Modifier::UNDERLINED)
    } else {
        muted_style()
    }
}

pub fn panel_border_style() -> Style {
    Style::default().fg(INK)
}

pub fn input_style(active: bool) -> Style {
    if active {
        heading_style()
    } else {
        text_style()
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(BAR_BG).fg(Color::White)
}

/// Data source badge: live data reads green, saved or offline data amber.
pub fn badge_style(live: bool) -> Style {
    if live {
        Style::default().fg(CORRECT)
    } else {
        heading_style()
    }
}
