//! Editable text of the message being composed.

/// Upper bound on composed text, in chars.
pub const MAX_COMPOSE_CHARS: usize = 1024;

/// The user's in-progress, not-yet-sent text plus a char-based cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposeBuffer {
    chars: Vec<char>,
    cursor: usize,
}

impl ComposeBuffer {
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        self.chars.iter().all(|ch| ch.is_whitespace())
    }

    /// Returns false when the buffer is full and the char was not inserted.
    pub fn insert(&mut self, ch: char) -> bool {
        if self.chars.len() >= MAX_COMPOSE_CHARS {
            return false;
        }
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
        true
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }
}
