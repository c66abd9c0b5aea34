//! Assembling the text in front of the cursor.
//!
//! A tag opener may sit several lines above the cursor when its attribute
//! list wraps:
//!
//! ```text
//! <input
//!   type="text"
//!   name="q"|
//! ```
//!
//! [`resolve`] walks upward until the nearest `<` is unambiguous so the
//! engine sees the whole opener at once.

use crate::{
  host::TextSource,
  lexical::{
    has_unmatched_left_angle_bracket,
    leading_whitespace,
  },
};

/// Text before the cursor, possibly spanning several lines.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineContext {
  /// Accumulated lines joined with `\n`, ending at the cursor.
  pub text:        String,
  /// Whether lines above the cursor line were pulled in.
  pub multi_row:   bool,
  /// Leading whitespace length of the first accumulated line when
  /// `multi_row`, otherwise 0.
  pub indent_size: usize,
}

/// Build the context for `line_up_to_cursor` on `row`.
///
/// Lines above are prepended while the text holds an even number of `<`,
/// stopping at the top of the document.
pub fn resolve<S>(source: &S, line_up_to_cursor: &str, mut row: usize) -> LineContext
where
  S: TextSource + ?Sized,
{
  let mut unmatched = has_unmatched_left_angle_bracket(line_up_to_cursor);
  let mut lines = vec![line_up_to_cursor.to_owned()];

  while !unmatched && row > 0 {
    row -= 1;
    let line = source.line(row).unwrap_or_default();
    // the parity of a sum is the xor of the parities
    unmatched ^= has_unmatched_left_angle_bracket(&line);
    lines.push(line.into_owned());
  }

  let multi_row = lines.len() > 1;
  lines.reverse();
  let text = lines.join("\n");
  let indent_size = if multi_row {
    leading_whitespace(&text).chars().count()
  } else {
    0
  };

  tracing::trace!(row, multi_row, indent_size, "resolved line context");
  LineContext {
    text,
    multi_row,
    indent_size,
  }
}
