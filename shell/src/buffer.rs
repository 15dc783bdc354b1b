use std::mem;

/// State of the input buffer.
#[derive(Debug, Default)]
pub struct Buffer {
    // Current input text. May span several lines.
    text: String,
    // Current cursor position in the buffer, as a byte offset on a character
    // boundary.
    cursor: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Get the current buffer text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Take the text buffer out of the prompt.
    pub fn take_text(&mut self) -> String {
        self.cursor = 0;
        mem::take(&mut self.text)
    }

    /// Replace the whole buffer, leaving the cursor at the end.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    /// Replace the whole buffer and place the cursor.
    pub fn set(&mut self, text: impl Into<String>, cursor: usize) {
        self.text = text.into();
        self.cursor = 0;
        self.move_cursor_to(cursor);
    }

    /// Get the current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_is_at_end_of_line(&self) -> bool {
        self.cursor == self.text.len()
    }

    /// Move the cursor to the given position.
    ///
    /// Returns the new cursor position. The actual position may differ if the
    /// requested position was beyond the end of the buffer or inside a
    /// character.
    pub fn move_cursor_to(&mut self, pos: usize) -> usize {
        let mut pos = self.text.len().min(pos);

        while !self.text.is_char_boundary(pos) {
            pos -= 1;
        }

        self.cursor = pos;
        self.cursor
    }

    /// Move the cursor by a number of characters.
    ///
    /// Returns the new cursor position.
    pub fn move_cursor_relative(&mut self, offset: isize) -> usize {
        let pos = if offset < 0 {
            self.text[..self.cursor]
                .char_indices()
                .rev()
                .nth(offset.unsigned_abs() - 1)
                .map(|(i, _)| i)
                .unwrap_or(0)
        } else {
            self.text[self.cursor..]
                .char_indices()
                .nth(offset as usize)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len())
        };

        self.move_cursor_to(pos)
    }

    /// Insert a character after the cursor.
    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert a string after the cursor.
    pub fn insert_str<S: AsRef<str>>(&mut self, string: S) {
        let string = string.as_ref();
        self.text.insert_str(self.cursor, string);
        self.cursor += string.len();
    }

    pub fn delete_before_cursor(&mut self) {
        if let Some((i, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.text.remove(i);
            self.cursor = i;
        }
    }

    pub fn delete_after_cursor(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    /// Clears the buffer text and moves the cursor to the beginning.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}
