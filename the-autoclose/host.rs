//! The surface of the host text editor.
//!
//! Queries live on [`TextSource`], mutations on [`HostEditor`]. The context
//! resolver only needs the former; the edit plan replays onto the latter.

use std::{
  borrow::Cow,
  path::Path,
};

use crate::Tendril;

/// A point in a text buffer, 0-indexed. Columns count chars.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
  pub row: usize,
  pub col: usize,
}

impl Position {
  pub const fn new(row: usize, col: usize) -> Self {
    Self { row, col }
  }

  pub const fn zero() -> Self {
    Self { row: 0, col: 0 }
  }

  /// Position reached after inserting `text` at `self`.
  pub fn traverse(self, text: &str) -> Self {
    let Self { mut row, mut col } = self;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
      match ch {
        '\r' if chars.peek() == Some(&'\n') => {},
        '\n' | '\r' => {
          row += 1;
          col = 0;
        },
        _ => col += 1,
      }
    }

    Self { row, col }
  }
}

impl From<(usize, usize)> for Position {
  fn from((row, col): (usize, usize)) -> Self {
    Position::new(row, col)
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EditRange {
  pub start: Position,
  pub end:   Position,
}

/// Text the host just inserted, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEvent {
  pub inserted_text: Tendril,
  pub range:         EditRange,
}

impl EditEvent {
  pub fn new(inserted_text: &str, start: Position) -> Self {
    Self {
      inserted_text: Tendril::from(inserted_text),
      range:         EditRange {
        start,
        end: start.traverse(inserted_text),
      },
    }
  }
}

/// The document the host is currently editing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
  pub extension: Option<Tendril>,
}

impl ActiveDocument {
  pub fn from_path(path: &Path) -> Self {
    Self {
      extension: path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(Tendril::from),
    }
  }
}

pub trait TextSource {
  /// Text of line `row` without its line ending, `None` past the last line.
  fn line(&self, row: usize) -> Option<Cow<'_, str>>;

  fn line_count(&self) -> usize;

  fn cursor(&self) -> Position;

  /// Whitespace the host inserts for one indentation level.
  fn indent_unit(&self) -> Cow<'_, str>;

  /// Scope identifiers at `pos`, outermost first.
  fn scopes_at(&self, pos: Position) -> Vec<Tendril>;
}

pub trait HostEditor: TextSource {
  /// Insert `text` at the cursor, leaving the cursor after it.
  fn insert_text(&mut self, text: &str);

  fn move_cursor_left(&mut self, count: usize);

  fn move_cursor_right(&mut self, count: usize);

  /// Delete the char before the cursor.
  fn delete_backward(&mut self);

  /// Open a blank line above the cursor line and put the cursor on it.
  fn insert_line_above(&mut self);
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn traverse_counts_chars_and_rows() {
    let start = Position::new(2, 4);
    assert_eq!(start.traverse(">"), Position::new(2, 5));
    assert_eq!(start.traverse("\n  "), Position::new(3, 2));
    assert_eq!(start.traverse("\r\n"), Position::new(3, 0));
    assert_eq!(start.traverse(""), start);
  }

  #[test]
  fn event_range_ends_after_inserted_text() {
    let event = EditEvent::new("/", Position::new(1, 7));
    assert_eq!(event.range.start, Position::new(1, 7));
    assert_eq!(event.range.end, Position::new(1, 8));
  }

  #[test]
  fn document_extension_from_path() {
    let doc = ActiveDocument::from_path(Path::new("site/index.html"));
    assert_eq!(doc.extension.as_deref(), Some("html"));
    assert_eq!(ActiveDocument::from_path(Path::new("Makefile")).extension, None);
  }
}
