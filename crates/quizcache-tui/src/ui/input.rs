//! Keyboard input handling for the TUI.
//!
//! Overlays take priority over the question panel; each state has its own
//! handler and only `Normal` reaches the global keys.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use quizcache_core::models::QuestionKind;

use crate::app::{App, AppState};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            Ok(false)
        }
        AppState::ConfirmingOffline => {
            confirm(app, key, App::go_offline);
            Ok(false)
        }
        AppState::ConfirmingOnline => {
            confirm(app, key, App::go_online);
            Ok(false)
        }
        AppState::ConfirmingClearAll => {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter) {
                app.clear_all_cache();
                app.state = AppState::ShowingCache;
            } else if matches!(key.code, KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc) {
                app.state = AppState::ShowingCache;
            }
            Ok(false)
        }
        AppState::Typing => {
            handle_typing_input(app, key);
            Ok(false)
        }
        AppState::PickingSubject => {
            handle_subject_input(app, key);
            Ok(false)
        }
        AppState::ShowingCache => {
            handle_cache_input(app, key);
            Ok(false)
        }
        AppState::Assistant => {
            handle_assistant_input(app, key);
            Ok(false)
        }
        AppState::Quitting => Ok(true),
        AppState::Normal => Ok(handle_normal_input(app, key)),
    }
}

/// Shared Y/N handling for confirmation dialogs.
fn confirm(app: &mut App, key: KeyEvent, action: fn(&mut App)) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.state = AppState::Normal;
            action(app);
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        _ => {}
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('1') => app.switch_kind(QuestionKind::Mcq),
        KeyCode::Char('2') => app.switch_kind(QuestionKind::Short),
        KeyCode::Char('3') => app.switch_kind(QuestionKind::Long),
        KeyCode::Right | KeyCode::Tab => app.switch_kind(app.current_kind.next()),
        KeyCode::Left | KeyCode::BackTab => app.switch_kind(app.current_kind.prev()),
        KeyCode::Char('s') => app.state = AppState::PickingSubject,
        KeyCode::Char('u') => {
            app.status_message = None;
            app.start_load();
        }
        KeyCode::Char('o') => {
            app.state = if app.is_offline() {
                AppState::ConfirmingOnline
            } else {
                AppState::ConfirmingOffline
            };
        }
        KeyCode::Char('c') => app.open_cache_panel(),
        KeyCode::Char('a') => app.open_assistant(),
        KeyCode::Char('n') => app.skip_question(),
        KeyCode::Up | KeyCode::Char('k') => app.move_option(false),
        KeyCode::Down | KeyCode::Char('j') => app.move_option(true),
        KeyCode::Char('i') => {
            if app.current_kind != QuestionKind::Mcq && app.can_answer() {
                app.state = AppState::Typing;
            }
        }
        KeyCode::Enter => {
            if app.can_answer() {
                match app.current_kind {
                    QuestionKind::Mcq => app.submit_answer(),
                    QuestionKind::Short | QuestionKind::Long => {
                        if app.current_written().is_some() {
                            app.state = AppState::Typing;
                        }
                    }
                }
            } else {
                app.continue_after_grade();
            }
        }
        _ => {}
    }
    false
}

fn handle_typing_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            app.submit_answer();
        }
        KeyCode::Backspace => {
            app.answer_input.pop();
        }
        KeyCode::Char(c) => app.push_answer_char(c),
        _ => {}
    }
}

fn handle_subject_input(app: &mut App, key: KeyEvent) {
    let count = app.subjects().len();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            // Browsing without Enter does not change the subject
            app.subject_selection = app
                .subjects()
                .iter()
                .position(|s| s.key == app.config.subject)
                .unwrap_or(0);
            app.state = AppState::Normal;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            if app.subject_selection > 0 {
                app.subject_selection -= 1;
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.subject_selection + 1 < count {
                app.subject_selection += 1;
            }
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            app.select_subject(app.subject_selection);
        }
        _ => {}
    }
}

fn handle_cache_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('q') => {
            app.state = AppState::Normal;
        }
        KeyCode::Char('x') => app.clear_current_cache(),
        KeyCode::Char('X') => app.state = AppState::ConfirmingClearAll,
        _ => {}
    }
}

fn handle_assistant_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Tab => {
            app.assistant_tab = app.assistant_tab.next();
        }
        KeyCode::Enter => app.send_assistant_request(),
        KeyCode::Backspace => {
            app.assistant_input.pop();
        }
        KeyCode::Char(c) => app.push_prompt_char(c),
        _ => {}
    }
}
