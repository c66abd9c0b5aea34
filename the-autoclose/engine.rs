//! Deciding what a keystroke should do to the markup around the cursor.
//!
//! The engine is stateless: each trigger (`>`, `/`, `!`, newline) is
//! classified against the text already in the buffer and turned into an
//! [`Action`] plus the [`EditPlan`] that carries it out. Anything it is not
//! sure about yields `None` and the buffer is left as typed.
//!
//! # Cursor placement
//!
//! - [`Action::CloseElement`]: right after the typed `>`, before `</tag>`
//! - [`Action::CloseSelfClosing`]: right after the inserted `/>` or `>`
//! - [`Action::ExpandComment`]: between the two spaces of `<!--  -->`
//! - [`Action::IndentBlock`]: at the end of the indentation of the blank line
//!   opened between the tags
//! - [`Action::IndentAttributes`]: at the end of the inserted indentation

use std::borrow::Cow;

use crate::{
  config::Config,
  context::{
    LineContext,
    resolve,
  },
  host::{
    EditEvent,
    TextSource,
  },
  lexical::{
    TagToken,
    close_tag_line,
    extract_tag_name,
    has_odd_quotes,
    is_inside_template_expression,
    leading_whitespace,
    open_tag_at_end,
    trim_trailing_whitespace,
  },
  plan::EditPlan,
};

const COMMENT_BODY: &str = "--  -->";
const COMMENT_TAIL_LEN: usize = " -->".len();

/// Keystrokes the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
  CloseAngle,
  Slash,
  Bang,
  /// A line break, possibly followed by indentation the host echoed.
  Newline,
}

impl Trigger {
  pub fn from_inserted(text: &str) -> Option<Self> {
    match text {
      ">" => Some(Self::CloseAngle),
      "/" => Some(Self::Slash),
      "!" => Some(Self::Bang),
      _ => {
        let indent = text
          .strip_prefix("\r\n")
          .or_else(|| text.strip_prefix('\n'))?;
        indent
          .chars()
          .all(|ch| ch == ' ' || ch == '\t')
          .then_some(Self::Newline)
      },
    }
  }

  pub fn as_char(self) -> Option<char> {
    match self {
      Self::CloseAngle => Some('>'),
      Self::Slash => Some('/'),
      Self::Bang => Some('!'),
      Self::Newline => None,
    }
  }
}

/// A trigger together with the cursor line it was typed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keystroke<'a> {
  pub trigger: Trigger,
  pub row:     usize,
  /// Cursor column after the insertion.
  pub col:     usize,
  /// The whole cursor line after the insertion.
  pub line:    Cow<'a, str>,
}

impl<'a> Keystroke<'a> {
  pub fn new(trigger: Trigger, row: usize, col: usize, line: impl Into<Cow<'a, str>>) -> Self {
    Self {
      trigger,
      row,
      col,
      line: line.into(),
    }
  }

  /// Read the keystroke behind `event` back from `source`.
  ///
  /// `None` when the event is not a trigger or does not agree with the
  /// buffer: the cursor moved away, the range does not span the inserted
  /// text, or the typed char is not where the event says.
  pub fn from_event<S>(source: &'a S, event: &EditEvent) -> Option<Self>
  where
    S: TextSource + ?Sized,
  {
    let trigger = Trigger::from_inserted(&event.inserted_text)?;
    let (start, end) = (event.range.start, event.range.end);
    if source.cursor() != end {
      return None;
    }

    let spans_insertion = match trigger {
      Trigger::Newline => end.row == start.row + 1,
      _ => end.row == start.row && end.col == start.col + 1,
    };
    if !spans_insertion {
      return None;
    }

    let keystroke = Self::new(trigger, end.row, end.col, source.line(end.row)?);
    if keystroke.line.chars().count() < end.col {
      return None;
    }
    if let Some(ch) = trigger.as_char()
      && !keystroke.before_cursor().ends_with(ch)
    {
      return None;
    }
    Some(keystroke)
  }

  /// The cursor line in front of the typed char.
  pub fn prefix(&self) -> &str {
    let typed = usize::from(self.trigger.as_char().is_some());
    char_prefix(&self.line, self.col.saturating_sub(typed))
  }

  pub fn before_cursor(&self) -> &str {
    char_prefix(&self.line, self.col)
  }

  pub fn after_cursor(&self) -> &str {
    &self.line[self.before_cursor().len()..]
  }

  fn plan(&self) -> EditPlan {
    EditPlan::new(self.before_cursor(), self.after_cursor())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  /// `</tag>` inserted after the typed `>`.
  CloseElement { tag: TagToken },
  /// `/>` (or `>`) finishing a self-closing tag.
  CloseSelfClosing { tag: TagToken },
  /// `<!` expanded to `<!--  -->`.
  ExpandComment,
  /// Blank indented line opened between an open tag and its closing tag.
  IndentBlock { tag: TagToken },
  /// Extra indentation for an attribute list wrapping onto a new line.
  IndentAttributes { tag: TagToken },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
  pub action: Action,
  pub plan:   EditPlan,
}

/// Classify `keystroke` and build the edit for it.
pub fn decide<S>(source: &S, keystroke: &Keystroke<'_>, config: &Config) -> Option<Decision>
where
  S: TextSource + ?Sized,
{
  let decision = match keystroke.trigger {
    Trigger::Newline => indent_adjust(source, keystroke),
    Trigger::Bang => expand_comment(keystroke),
    Trigger::CloseAngle => close_on_angle(source, keystroke, config),
    Trigger::Slash if config.slash_trigger_auto_close => None,
    Trigger::Slash => close_on_slash(source, keystroke, config),
  };

  match &decision {
    Some(decision) => tracing::debug!(
      action = ?decision.action,
      ops = ?decision.plan.ops(),
      "auto-close decision"
    ),
    None => tracing::trace!(trigger = ?keystroke.trigger, row = keystroke.row, "no auto-close"),
  }
  decision
}

fn close_on_angle<S>(source: &S, keystroke: &Keystroke<'_>, config: &Config) -> Option<Decision>
where
  S: TextSource + ?Sized,
{
  let context = resolve(source, keystroke.prefix(), keystroke.row);
  let tag = extract_tag_name(&context.text)?;
  if is_inside_template_expression(&context.text) {
    return None;
  }
  if trim_trailing_whitespace(&context.text).ends_with('/') {
    return None;
  }

  let mut plan = keystroke.plan();
  backspace_if_indent_echo(&mut plan, &context, keystroke);

  if config.is_self_close_tag(tag.name()) {
    plan.delete_backward();
    close_self_closing_tag(&mut plan, config);
    return Some(Decision {
      action: Action::CloseSelfClosing { tag },
      plan,
    });
  }

  plan
    .insert_text(&format!("</{}>", tag.name()))
    .move_cursor_left(tag.len() + 3);
  Some(Decision {
    action: Action::CloseElement { tag },
    plan,
  })
}

fn close_on_slash<S>(source: &S, keystroke: &Keystroke<'_>, config: &Config) -> Option<Decision>
where
  S: TextSource + ?Sized,
{
  let context = resolve(source, keystroke.prefix(), keystroke.row);
  let tag = extract_tag_name(&context.text)?;
  if is_inside_template_expression(&context.text) {
    return None;
  }

  let mut plan = keystroke.plan();
  if plan.char_after_cursor() == Some('>') || has_odd_quotes(&context.text) {
    return None;
  }

  backspace_if_indent_echo(&mut plan, &context, keystroke);
  plan.delete_backward();
  close_self_closing_tag(&mut plan, config);
  Some(Decision {
    action: Action::CloseSelfClosing { tag },
    plan,
  })
}

fn expand_comment(keystroke: &Keystroke<'_>) -> Option<Decision> {
  // `<!DOCTYPE html>` is typed at the top of the document
  if keystroke.row == 0 {
    return None;
  }
  let prefix = keystroke.prefix();
  if is_inside_template_expression(prefix) || !prefix.ends_with('<') {
    return None;
  }

  let mut plan = keystroke.plan();
  plan
    .insert_text(COMMENT_BODY)
    .move_cursor_left(COMMENT_TAIL_LEN);
  Some(Decision {
    action: Action::ExpandComment,
    plan,
  })
}

fn indent_adjust<S>(source: &S, keystroke: &Keystroke<'_>) -> Option<Decision>
where
  S: TextSource + ?Sized,
{
  let row = keystroke.row.checked_sub(1)?;
  let above = source.line(row)?;
  let context = resolve(source, &above, row);
  if is_inside_template_expression(&context.text) {
    return None;
  }

  let mut plan = keystroke.plan();
  if let Some(open) = open_tag_at_end(&context.text) {
    let closes_open =
      close_tag_line(&keystroke.line).is_some_and(|close| close.matches(open.name()));
    if !closes_open {
      return None;
    }

    let indent = format!("{}{}", leading_whitespace(&context.text), source.indent_unit());
    plan.insert_line_above().insert_text(&indent);
    return Some(Decision {
      action: Action::IndentBlock { tag: open },
      plan,
    });
  }

  // the attribute list must still be open on the new line
  if keystroke.line.contains('>') {
    return None;
  }
  let tag = extract_tag_name(&above)?;
  plan.insert_text(&source.indent_unit());
  Some(Decision {
    action: Action::IndentAttributes { tag },
    plan,
  })
}

/// Finish a self-closing tag at the cursor.
fn close_self_closing_tag(plan: &mut EditPlan, config: &Config) {
  let close = if config.add_slash_to_self_close_tag {
    "/>"
  } else {
    ">"
  };

  if plan.char_before_cursor() == Some(' ') {
    plan.insert_text(close);
  } else if config.insert_whitespace_on_close {
    plan.insert_text(&format!(" {close}"));
  } else {
    plan.insert_text(&format!("{close} ")).delete_backward();
  }
}

/// Remove one space the host echoed onto a wrapped attribute line.
///
/// Applies when the opener is indented, the context ends with
/// `indent_size` spaces, and the typed char does not sit right after the
/// opener's indentation.
fn backspace_if_indent_echo(plan: &mut EditPlan, context: &LineContext, keystroke: &Keystroke<'_>) {
  if !context.multi_row || context.indent_size == 0 {
    return;
  }
  if !context.text.ends_with(&" ".repeat(context.indent_size)) {
    return;
  }
  if keystroke.col == context.indent_size + 1 {
    return;
  }

  plan
    .move_cursor_left(1)
    .delete_backward()
    .move_cursor_right(1);
}

fn char_prefix(s: &str, chars: usize) -> &str {
  let end = s.char_indices().nth(chars).map_or(s.len(), |(offset, _)| offset);
  &s[..end]
}
