//! Style definitions for the UI components.

use ratatui::style::{Color, Modifier, Style};

// =============================================================================
// Panel styles
// =============================================================================

pub fn active_panel_border_style() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn inactive_panel_border_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

// =============================================================================
// Message list styles
// =============================================================================

/// Sender of a message written by the signed-in user.
pub fn own_sender_style() -> Style {
    Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD)
}

/// Sender of a message written by anyone else.
pub fn other_sender_style() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

pub fn own_body_style() -> Style {
    Style::default().fg(Color::Green)
}

pub fn other_body_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn empty_feed_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

// =============================================================================
// Input styles
// =============================================================================

pub fn input_prompt_style() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn input_text_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn input_placeholder_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Input while an append is in flight.
pub fn input_disabled_style() -> Style {
    Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC)
}

// =============================================================================
// Status line styles
// =============================================================================

pub fn status_error_style() -> Style {
    Style::default().fg(Color::Red)
}

pub fn status_info_style() -> Style {
    Style::default().fg(Color::DarkGray)
}
