//! Compose input field rendering.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use unicode_width::UnicodeWidthStr;

use crate::domain::{compose_buffer::ComposeBuffer, shell_state::ActivePane};

use super::styles;

/// Placeholder text shown when the input is not focused and empty.
const PLACEHOLDER_TEXT: &str = "Press Esc to type a message...";

const SENDING_TEXT: &str = "Sending...";

/// Prompt symbol shown before the input text.
const PROMPT_SYMBOL: &str = "> ";

pub fn render_message_input(
    frame: &mut Frame<'_>,
    area: Rect,
    compose: &ComposeBuffer,
    active_pane: ActivePane,
    enabled: bool,
) {
    let is_focused = active_pane == ActivePane::ComposeInput;

    let border_style = if is_focused && enabled {
        styles::active_panel_border_style()
    } else {
        styles::inactive_panel_border_style()
    };

    let title = if enabled { "Message" } else { SENDING_TEXT };
    let paragraph = Paragraph::new(build_input_line(compose, is_focused, enabled)).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    );

    frame.render_widget(paragraph, area);

    if is_focused && enabled {
        let cursor_x = area
            .x
            .saturating_add(1)
            .saturating_add(PROMPT_SYMBOL.len() as u16)
            .saturating_add(cursor_column(compose).min(u16::MAX as usize) as u16);
        let cursor_y = area.y.saturating_add(1);
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

/// Display columns before the cursor; wide glyphs take two cells.
fn cursor_column(compose: &ComposeBuffer) -> usize {
    let before: String = compose.text().chars().take(compose.cursor()).collect();
    before.width()
}

fn build_input_line(compose: &ComposeBuffer, is_focused: bool, enabled: bool) -> Line<'static> {
    let prompt = Span::styled(PROMPT_SYMBOL.to_owned(), styles::input_prompt_style());
    let text = compose.text();

    if !enabled {
        return Line::from(vec![prompt, Span::styled(text, styles::input_disabled_style())]);
    }

    if !is_focused && text.is_empty() {
        return Line::from(vec![
            prompt,
            Span::styled(PLACEHOLDER_TEXT.to_owned(), styles::input_placeholder_style()),
        ]);
    }

    Line::from(vec![prompt, Span::styled(text, styles::input_text_style())])
}
