use std::{
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{
    domain::events::{AppEvent, KeyInput},
    usecases::contracts::AppEventSource,
};

const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Terminal keys plus whatever the store threads pushed into `updates`.
///
/// Pending store events are drained before the terminal is polled, so a
/// burst of feed records is applied without waiting on key timeouts.
pub struct CrosstermEventSource {
    updates: Receiver<AppEvent>,
    updates_open: bool,
}

impl CrosstermEventSource {
    pub fn new(updates: Receiver<AppEvent>) -> Self {
        Self {
            updates,
            updates_open: true,
        }
    }

    fn next_update(&mut self) -> Option<AppEvent> {
        if !self.updates_open {
            return None;
        }

        match self.updates.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::debug!("store update channel closed");
                self.updates_open = false;
                None
            }
        }
    }
}

impl AppEventSource for CrosstermEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        if let Some(update) = self.next_update() {
            return Ok(Some(update));
        }

        if !event::poll(EVENT_POLL_TIMEOUT)? {
            return Ok(Some(AppEvent::Tick));
        }

        match event::read()? {
            Event::Key(key) => Ok(map_key(key)),
            _ => Ok(None),
        }
    }
}

fn map_key(key: KeyEvent) -> Option<AppEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(AppEvent::QuitRequested);
    }

    let name = match key.code {
        KeyCode::Char(ch) => ch.to_string(),
        KeyCode::Enter => "enter".to_owned(),
        KeyCode::Backspace => "backspace".to_owned(),
        KeyCode::Delete => "delete".to_owned(),
        KeyCode::Left => "left".to_owned(),
        KeyCode::Right => "right".to_owned(),
        KeyCode::Home => "home".to_owned(),
        KeyCode::End => "end".to_owned(),
        KeyCode::Esc => "esc".to_owned(),
        _ => return None,
    };

    Some(AppEvent::InputKey(KeyInput::new(name, ctrl)))
}

#[cfg(test)]
pub struct MockEventSource {
    queue: std::collections::VecDeque<AppEvent>,
}

#[cfg(test)]
impl MockEventSource {
    pub fn from(events: Vec<AppEvent>) -> Self {
        Self {
            queue: events.into(),
        }
    }
}

#[cfg(test)]
impl AppEventSource for MockEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        Ok(self.queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use crossterm::event::KeyEventState;

    use super::*;
    use crate::domain::events::StoreError;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn ctrl_c_requests_quit() {
        assert_eq!(
            map_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(AppEvent::QuitRequested)
        );
    }

    #[test]
    fn plain_q_is_forwarded_as_input() {
        assert_eq!(
            map_key(press(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(AppEvent::InputKey(KeyInput::new("q", false)))
        );
    }

    #[test]
    fn editing_keys_have_names() {
        assert_eq!(
            map_key(press(KeyCode::Backspace, KeyModifiers::NONE)),
            Some(AppEvent::InputKey(KeyInput::new("backspace", false)))
        );
        assert_eq!(
            map_key(press(KeyCode::Char('l'), KeyModifiers::CONTROL)),
            Some(AppEvent::InputKey(KeyInput::new("l", true)))
        );
        assert_eq!(map_key(press(KeyCode::F(1), KeyModifiers::NONE)), None);
    }

    #[test]
    fn key_release_is_ignored() {
        let mut key = press(KeyCode::Enter, KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;

        assert_eq!(map_key(key), None);
    }

    #[test]
    fn pending_store_updates_are_returned_before_terminal_poll() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::SendAcknowledged(Err(StoreError::Rejected(
            "denied".to_owned(),
        ))))
        .expect("send update");

        let mut source = CrosstermEventSource::new(rx);

        assert!(matches!(
            source.next_update(),
            Some(AppEvent::SendAcknowledged(Err(_)))
        ));
        assert_eq!(source.next_update(), None);

        drop(tx);
        assert_eq!(source.next_update(), None);
        assert!(!source.updates_open);
    }
}
