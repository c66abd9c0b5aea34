//! Ordered host mutations produced for one keystroke.
//!
//! An [`EditPlan`] records primitive operations while simulating their
//! effect on the cursor line. The engine uses the simulation to ask "what is
//! before the cursor now?" in the middle of a branch, and tests use it to
//! check where a branch leaves the cursor without a host at all. Once built,
//! [`EditPlan::apply`] replays the operations on a [`HostEditor`] in order.
//!
//! ```ignore
//! // `<p` + `>` typed, cursor after `>`
//! let mut plan = EditPlan::new("<p>", "");
//! plan.insert_text("</p>").move_cursor_left(4);
//! assert_eq!(plan.before_cursor(), "<p>");
//! assert_eq!(plan.after_cursor(), "</p>");
//! ```

use smallvec::SmallVec;

use crate::{
  Tendril,
  host::HostEditor,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
  InsertText(Tendril),
  MoveCursorLeft(usize),
  MoveCursorRight(usize),
  DeleteBackward,
  InsertLineAbove,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditPlan {
  ops:    SmallVec<[EditOp; 4]>,
  before: String,
  after:  String,
}

impl EditPlan {
  /// Start a plan for a cursor line split at the cursor.
  pub fn new(before: &str, after: &str) -> Self {
    Self {
      ops:    SmallVec::new(),
      before: before.to_owned(),
      after:  after.to_owned(),
    }
  }

  pub fn insert_text(&mut self, text: &str) -> &mut Self {
    self.before.push_str(text);
    self.ops.push(EditOp::InsertText(Tendril::from(text)));
    self
  }

  /// Cursor movement stays within the cursor line.
  pub fn move_cursor_left(&mut self, count: usize) -> &mut Self {
    let at = char_offset_from_end(&self.before, count);
    let moved = self.before.split_off(at);
    self.after.insert_str(0, &moved);
    self.ops.push(EditOp::MoveCursorLeft(count));
    self
  }

  pub fn move_cursor_right(&mut self, count: usize) -> &mut Self {
    let at = char_offset_from_start(&self.after, count);
    let rest = self.after.split_off(at);
    let moved = std::mem::replace(&mut self.after, rest);
    self.before.push_str(&moved);
    self.ops.push(EditOp::MoveCursorRight(count));
    self
  }

  pub fn delete_backward(&mut self) -> &mut Self {
    self.before.pop();
    self.ops.push(EditOp::DeleteBackward);
    self
  }

  /// The simulated cursor line becomes the new blank line.
  pub fn insert_line_above(&mut self) -> &mut Self {
    self.before.clear();
    self.after.clear();
    self.ops.push(EditOp::InsertLineAbove);
    self
  }

  pub fn ops(&self) -> &[EditOp] {
    &self.ops
  }

  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  pub fn before_cursor(&self) -> &str {
    &self.before
  }

  pub fn after_cursor(&self) -> &str {
    &self.after
  }

  pub fn char_before_cursor(&self) -> Option<char> {
    self.before.chars().next_back()
  }

  pub fn char_after_cursor(&self) -> Option<char> {
    self.after.chars().next()
  }

  /// Cursor column on the simulated line.
  pub fn cursor_col(&self) -> usize {
    self.before.chars().count()
  }

  /// The simulated cursor line.
  pub fn line(&self) -> String {
    format!("{}{}", self.before, self.after)
  }

  pub fn apply<H>(&self, host: &mut H)
  where
    H: HostEditor + ?Sized,
  {
    for op in &self.ops {
      match op {
        EditOp::InsertText(text) => host.insert_text(text),
        EditOp::MoveCursorLeft(count) => host.move_cursor_left(*count),
        EditOp::MoveCursorRight(count) => host.move_cursor_right(*count),
        EditOp::DeleteBackward => host.delete_backward(),
        EditOp::InsertLineAbove => host.insert_line_above(),
      }
    }
  }
}

fn char_offset_from_end(s: &str, count: usize) -> usize {
  if count == 0 {
    return s.len();
  }
  s.char_indices()
    .nth_back(count - 1)
    .map_or(0, |(offset, _)| offset)
}

fn char_offset_from_start(s: &str, count: usize) -> usize {
  s.char_indices().nth(count).map_or(s.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    buffer::RopeBuffer,
    host::{
      Position,
      TextSource,
    },
  };

  #[test]
  fn simulation_tracks_cursor() {
    let mut plan = EditPlan::new("<p>", "");
    plan.insert_text("</p>").move_cursor_left(4);
    assert_eq!(plan.before_cursor(), "<p>");
    assert_eq!(plan.after_cursor(), "</p>");
    assert_eq!(plan.cursor_col(), 3);
    assert_eq!(plan.char_after_cursor(), Some('<'));

    plan.move_cursor_right(2);
    assert_eq!(plan.line(), "<p></p>");
    assert_eq!(plan.cursor_col(), 5);
  }

  #[test]
  fn movement_clamps_to_line() {
    let mut plan = EditPlan::new("ab", "cd");
    plan.move_cursor_left(10);
    assert_eq!((plan.before_cursor(), plan.after_cursor()), ("", "abcd"));
    plan.move_cursor_right(10);
    assert_eq!((plan.before_cursor(), plan.after_cursor()), ("abcd", ""));
  }

  #[test]
  fn movement_counts_chars() {
    let mut plan = EditPlan::new("<é>", "ü");
    plan.move_cursor_left(2);
    assert_eq!(plan.before_cursor(), "<");
    plan.move_cursor_right(3);
    assert_eq!(plan.before_cursor(), "<é>ü");
  }

  #[test]
  fn insert_then_backspace_nets_the_prefix() {
    let mut plan = EditPlan::new("<img", "");
    plan.insert_text("/> ").delete_backward();
    assert_eq!(plan.before_cursor(), "<img/>");
    assert_eq!(plan.ops().len(), 2);
  }

  #[test]
  fn apply_matches_simulation() {
    let mut buffer = RopeBuffer::new("<p>\n<div>");
    let mut plan = EditPlan::new("<div>", "");
    plan.insert_text("</div>").move_cursor_left(6);

    plan.apply(&mut buffer);
    assert_eq!(buffer.text().to_string(), "<p>\n<div></div>");
    assert_eq!(buffer.cursor(), Position::new(1, plan.cursor_col()));
    assert_eq!(buffer.line(1).as_deref(), Some(plan.line().as_str()));
  }

  #[test]
  fn empty_plan_leaves_host_untouched() {
    let mut buffer = RopeBuffer::new("<p>");
    let plan = EditPlan::new("<p>", "");
    assert!(plan.is_empty());
    plan.apply(&mut buffer);
    assert_eq!(buffer.text().to_string(), "<p>");
    assert_eq!(buffer.cursor(), Position::new(0, 3));
  }
}
