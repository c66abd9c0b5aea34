//! In-memory host backed by a [`Rope`].

use std::borrow::Cow;

use ropey::Rope;

use crate::{
  Tendril,
  host::{
    EditEvent,
    HostEditor,
    Position,
    TextSource,
  },
};

/// A single-cursor text buffer implementing the host traits.
///
/// Besides the host mutations it offers keystroke helpers ([`type_char`],
/// [`press_enter`], ...) that edit the buffer like a user would and return
/// the [`EditEvent`] a real host would emit.
///
/// [`type_char`]: RopeBuffer::type_char
/// [`press_enter`]: RopeBuffer::press_enter
#[derive(Debug, Clone)]
pub struct RopeBuffer {
  text:        Rope,
  cursor:      usize,
  indent_unit: Tendril,
  auto_indent: bool,
  scopes:      Vec<Tendril>,
}

impl RopeBuffer {
  /// Create a buffer holding `text` with the cursor at the end.
  pub fn new(text: &str) -> Self {
    let text = Rope::from(text);
    let cursor = text.len_chars();
    Self {
      text,
      cursor,
      indent_unit: Tendril::from("  "),
      auto_indent: false,
      scopes: Vec::new(),
    }
  }

  pub fn with_cursor(mut self, pos: Position) -> Self {
    self.set_cursor(pos);
    self
  }

  pub fn with_indent_unit(mut self, unit: &str) -> Self {
    self.indent_unit = Tendril::from(unit);
    self
  }

  /// Echo the cursor line's indentation on [`RopeBuffer::press_enter`].
  pub fn with_auto_indent(mut self, auto_indent: bool) -> Self {
    self.auto_indent = auto_indent;
    self
  }

  pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<Tendril>,
  {
    self.scopes = scopes.into_iter().map(Into::into).collect();
    self
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn cursor_char(&self) -> usize {
    self.cursor
  }

  /// Place the cursor at `pos`, clamped to the buffer.
  pub fn set_cursor(&mut self, pos: Position) {
    let row = pos.row.min(self.text.len_lines().saturating_sub(1));
    self.cursor = self.text.line_to_char(row) + pos.col.min(self.line_len(row));
  }

  pub fn type_char(&mut self, ch: char) -> EditEvent {
    let mut buf = [0; 4];
    self.type_str(ch.encode_utf8(&mut buf))
  }

  pub fn type_str(&mut self, text: &str) -> EditEvent {
    let start = self.cursor();
    self.insert_text(text);
    EditEvent::new(text, start)
  }

  pub fn press_enter(&mut self) -> EditEvent {
    let mut text = Tendril::from("\n");
    if self.auto_indent {
      let line = self.line(self.cursor().row).unwrap_or_default();
      text.extend(line.chars().take_while(|ch| *ch == ' ' || *ch == '\t'));
    }
    self.type_str(&text)
  }

  fn line_len(&self, row: usize) -> usize {
    let line = self.text.line(row);
    let mut len = line.len_chars();
    while len > 0 && matches!(line.char(len - 1), '\n' | '\r') {
      len -= 1;
    }
    len
  }
}

impl Default for RopeBuffer {
  fn default() -> Self {
    Self::new("")
  }
}

impl TextSource for RopeBuffer {
  fn line(&self, row: usize) -> Option<Cow<'_, str>> {
    if row >= self.text.len_lines() {
      return None;
    }
    let line = self.text.line(row).slice(..self.line_len(row));
    Some(Cow::from(line))
  }

  fn line_count(&self) -> usize {
    self.text.len_lines()
  }

  fn cursor(&self) -> Position {
    let row = self.text.char_to_line(self.cursor);
    Position::new(row, self.cursor - self.text.line_to_char(row))
  }

  fn indent_unit(&self) -> Cow<'_, str> {
    Cow::Borrowed(self.indent_unit.as_str())
  }

  fn scopes_at(&self, _pos: Position) -> Vec<Tendril> {
    self.scopes.clone()
  }
}

impl HostEditor for RopeBuffer {
  fn insert_text(&mut self, text: &str) {
    self.text.insert(self.cursor, text);
    self.cursor += text.chars().count();
  }

  fn move_cursor_left(&mut self, count: usize) {
    self.cursor = self.cursor.saturating_sub(count);
  }

  fn move_cursor_right(&mut self, count: usize) {
    self.cursor = (self.cursor + count).min(self.text.len_chars());
  }

  fn delete_backward(&mut self) {
    if self.cursor == 0 {
      return;
    }
    self.text.remove(self.cursor - 1..self.cursor);
    self.cursor -= 1;
  }

  fn insert_line_above(&mut self) {
    let line_start = self.text.line_to_char(self.cursor().row);
    self.text.insert_char(line_start, '\n');
    self.cursor = line_start;
  }
}
