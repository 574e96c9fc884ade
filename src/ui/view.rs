use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::domain::{
    list_projection::DisplayRow,
    shell_state::{ActivePane, ShellState, StatusNotice},
};

use super::{message_input::render_message_input, styles};

const KEY_HINTS: &str = "Enter send | Esc switch pane | q quit | Ctrl-L sign out";

pub fn render(frame: &mut Frame<'_>, state: &ShellState) {
    let [messages_area, input_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

    let active_pane = state.active_pane();
    render_messages_panel(frame, messages_area, state.rows(), active_pane);
    render_message_input(
        frame,
        input_area,
        state.compose(),
        active_pane,
        state.input_enabled(),
    );

    frame.render_widget(Paragraph::new(status_line(state)), status_area);
}

fn render_messages_panel(
    frame: &mut Frame<'_>,
    area: Rect,
    rows: &[DisplayRow],
    active_pane: ActivePane,
) {
    let border_style = if active_pane == ActivePane::MessageList {
        styles::active_panel_border_style()
    } else {
        styles::inactive_panel_border_style()
    };

    let block = Block::default()
        .title(format!("Messages ({})", rows.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    if rows.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No messages yet. Say hello!",
            styles::empty_feed_style(),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Inner height = area height - 2 (borders)
    let viewport = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem<'static>> = visible_rows(rows, viewport)
        .iter()
        .map(|row| ListItem::new(message_line(row)))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Newest rows win when the feed is taller than the panel.
fn visible_rows(rows: &[DisplayRow], viewport: usize) -> &[DisplayRow] {
    &rows[rows.len().saturating_sub(viewport)..]
}

fn message_line(row: &DisplayRow) -> Line<'static> {
    let (sender_style, body_style) = if row.is_own_message {
        (styles::own_sender_style(), styles::own_body_style())
    } else {
        (styles::other_sender_style(), styles::other_body_style())
    };

    Line::from(vec![
        Span::styled(row.sender.clone(), sender_style),
        Span::styled(": ".to_owned(), body_style),
        Span::styled(row.body.clone(), body_style),
    ])
}

fn status_line(state: &ShellState) -> Line<'static> {
    let mut spans = vec![Span::raw(format!(
        "{} | {} | ",
        state.identity_label(),
        state.composition().as_label()
    ))];

    match state.notice() {
        Some(StatusNotice::Error(text)) => {
            spans.push(Span::styled(text.clone(), styles::status_error_style()))
        }
        Some(StatusNotice::Info(text)) => {
            spans.push(Span::styled(text.clone(), styles::status_info_style()))
        }
        None => spans.push(Span::styled(KEY_HINTS.to_owned(), styles::status_info_style())),
    }

    Line::from(spans)
}
