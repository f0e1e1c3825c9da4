//! Terminal UI module using ratatui.
//!
//! - `render`: Main frame layout, status bar and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color palette and text styling
//! - `quiz`: Question panel (options, answer box, feedback)
//! - `assistant`: Assistant panel (chat, study plan, question generation)

pub mod assistant;
pub mod input;
pub mod quiz;
pub mod render;
pub mod styles;
