//! String heuristics standing in for a markup parser.
//!
//! Everything here works on plain text snapshots and never fails: when a
//! question cannot be answered the helpers say "no", which the engine turns
//! into leaving the buffer alone.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex_automata::meta::Regex;

use crate::Tendril;

/// Name of an element as it was typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
  name: Tendril,
}

impl TagToken {
  pub fn new(name: &str) -> Self {
    Self {
      name: Tendril::from(name),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Lower-cased name, the form used for every comparison.
  pub fn normalized(&self) -> String {
    self.name.to_lowercase()
  }

  /// Length of the name in chars.
  pub fn len(&self) -> usize {
    self.name.chars().count()
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_empty()
  }

  pub fn matches(&self, other: &str) -> bool {
    self.normalized() == other.to_lowercase()
  }
}

/// Whether the combined count of `'` and `"` is odd.
///
/// Both kinds are summed, so `title="it's"` reads as an open quote.
pub fn has_odd_quotes(s: &str) -> bool {
  s.chars().filter(|ch| matches!(ch, '\'' | '"')).count() % 2 == 1
}

pub fn trim_trailing_whitespace(s: &str) -> &str {
  s.trim_end()
}

/// Name of the tag opened after the last `<` in `s`.
///
/// Returns `None` when there is no `<`, when the tag after it is already
/// terminated by a `>` outside quotes, or when no name follows (`</`, `<!`,
/// `<?`, `< `). Template directives such as `<#list` and `<@macro` count as
/// names.
pub fn extract_tag_name(s: &str) -> Option<TagToken> {
  let start = s.rfind('<')?;
  let rest = &s[start + 1..];
  if is_terminated(rest) {
    return None;
  }

  let end = rest
    .find(|ch: char| ch.is_whitespace() || ch == '/' || ch == '>')
    .unwrap_or(rest.len());
  let name = &rest[..end];
  if !name.chars().next().is_some_and(is_name_start) {
    return None;
  }

  Some(TagToken::new(name))
}

/// Whether the tag being typed in `s` is one of `self_close_tags`, ignoring
/// case.
pub fn is_self_closing_tag(s: &str, self_close_tags: &IndexSet<String>) -> bool {
  extract_tag_name(s).is_some_and(|tag| is_listed(&tag, self_close_tags))
}

/// Whether `s` ends inside an unterminated `{ ... ` expression, i.e. matches
/// `\{[^}]*$`.
pub fn is_inside_template_expression(s: &str) -> bool {
  s.rfind('{').is_some_and(|open| !s[open..].contains('}'))
}

/// Whether `s` holds an odd number of `<`.
pub fn has_unmatched_left_angle_bracket(s: &str) -> bool {
  s.matches('<').count() % 2 == 1
}

/// Leading spaces and tabs of the first line of `s`.
pub fn leading_whitespace(s: &str) -> &str {
  let end = s
    .find(|ch: char| ch != ' ' && ch != '\t')
    .unwrap_or(s.len());
  &s[..end]
}

/// The open tag `s` ends with, e.g. `div` for `<div class="a">  `.
///
/// Self-closing syntax (`<br/>`) is not an open tag.
pub fn open_tag_at_end(s: &str) -> Option<TagToken> {
  static REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z_:][^\s/<>]*)(?:\s[^<>]*)?>\s*$").expect("open tag regex should compile")
  });

  let mut caps = REGEX.create_captures();
  REGEX.captures(s, &mut caps);
  let whole = caps.get_match()?;
  if s[whole.start()..whole.end()].trim_end().ends_with("/>") {
    return None;
  }
  let name = caps.get_group(1)?;
  Some(TagToken::new(&s[name.start..name.end]))
}

/// The tag closed by `s` when `s` holds nothing but a closing tag, e.g. `div`
/// for `  </div>`.
pub fn close_tag_line(s: &str) -> Option<TagToken> {
  static REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*</([A-Za-z_:][^\s/<>]*)\s*>\s*$").expect("close tag regex should compile")
  });

  let mut caps = REGEX.create_captures();
  REGEX.captures(s, &mut caps);
  let name = caps.get_group(1)?;
  Some(TagToken::new(&s[name.start..name.end]))
}

/// Whether `s` holds a `>` outside a quoted attribute value.
fn is_terminated(s: &str) -> bool {
  let mut quote = None;
  for ch in s.chars() {
    match quote {
      None if ch == '>' => return true,
      None if matches!(ch, '"' | '\'') => quote = Some(ch),
      Some(open) if ch == open => quote = None,
      _ => {},
    }
  }
  false
}

fn is_name_start(ch: char) -> bool {
  ch.is_alphanumeric() || matches!(ch, '_' | ':' | '-' | '.' | '#' | '@')
}

fn is_listed(tag: &TagToken, tags: &IndexSet<String>) -> bool {
  tags.iter().any(|listed| tag.matches(listed))
}

#[cfg(test)]
mod test {
  use super::*;

  fn void_tags() -> IndexSet<String> {
    ["br", "img", "input"].into_iter().map(String::from).collect()
  }

  #[test]
  fn odd_quotes_sum_both_kinds() {
    assert!(!has_odd_quotes(""));
    assert!(has_odd_quotes(r#"<a href="/path"#));
    assert!(!has_odd_quotes(r#"<a href="/path""#));
    assert!(has_odd_quotes("<a title='x"));
    // one single quote plus two double quotes
    assert!(has_odd_quotes(r#"<a title="it's""#));
  }

  #[test]
  fn trims_only_the_end() {
    assert_eq!(trim_trailing_whitespace("  <br/ \t"), "  <br/");
  }

  #[test]
  fn tag_name_from_last_open_bracket() {
    assert_eq!(
      extract_tag_name(r#"<p>text <a href="x""#).as_ref().map(TagToken::name),
      Some("a")
    );
    assert_eq!(extract_tag_name("<Div").unwrap().normalized(), "div");
    assert_eq!(extract_tag_name("<br/").unwrap().name(), "br");
    assert_eq!(extract_tag_name("<div\n  class=\"x\"").unwrap().name(), "div");
    assert_eq!(extract_tag_name("<svg:rect").unwrap().name(), "svg:rect");
  }

  #[test]
  fn tag_name_ignores_quoted_brackets() {
    assert_eq!(
      extract_tag_name(r#"<button @click="() => go()""#).unwrap().name(),
      "button"
    );
    assert_eq!(extract_tag_name(r#"<div title="a > b""#).unwrap().name(), "div");
    assert_eq!(extract_tag_name("<p title='x\"y>z'").unwrap().name(), "p");
    assert_eq!(extract_tag_name(r#"<a href="x">link"#), None);
  }

  #[test]
  fn tag_name_of_template_directives() {
    assert_eq!(extract_tag_name("<#list items as item").unwrap().name(), "#list");
    assert_eq!(extract_tag_name("<@macro a=1").unwrap().name(), "@macro");
    assert_eq!(extract_tag_name("<h1").unwrap().name(), "h1");
    assert_eq!(extract_tag_name("<?xml"), None);
  }

  #[test]
  fn tag_name_absent() {
    assert_eq!(extract_tag_name("plain text"), None);
    assert_eq!(extract_tag_name("<"), None);
    assert_eq!(extract_tag_name("< div"), None);
    assert_eq!(extract_tag_name("</div"), None);
    assert_eq!(extract_tag_name("<!DOCTYPE html"), None);
    assert_eq!(extract_tag_name("<div>hello"), None);
  }

  #[test]
  fn self_closing_ignores_case() {
    let tags = void_tags();
    assert!(is_self_closing_tag(r#"<IMG src="x.png""#, &tags));
    assert!(is_self_closing_tag("<br ", &tags));
    assert!(!is_self_closing_tag("<div", &tags));
    assert!(!is_self_closing_tag("no tag", &tags));
  }

  #[test]
  fn template_expression() {
    assert!(is_inside_template_expression("<div onClick={"));
    assert!(is_inside_template_expression("{a} <p {b"));
    assert!(!is_inside_template_expression("<div {a}"));
    assert!(!is_inside_template_expression("<div"));
  }

  #[test]
  fn unmatched_left_angle_bracket() {
    assert!(has_unmatched_left_angle_bracket("<div"));
    assert!(!has_unmatched_left_angle_bracket("<p><b"));
    assert!(!has_unmatched_left_angle_bracket("  class=\"x\""));
  }

  #[test]
  fn leading_whitespace_of_first_line() {
    assert_eq!(leading_whitespace("  \t<div"), "  \t");
    assert_eq!(leading_whitespace("<div\n    a"), "");
    assert_eq!(leading_whitespace("   "), "   ");
  }

  #[test]
  fn open_tag_ending_a_line() {
    assert_eq!(open_tag_at_end("  <div>").unwrap().name(), "div");
    assert_eq!(open_tag_at_end(r#"<ul class="a">  "#).unwrap().name(), "ul");
    assert_eq!(open_tag_at_end("<p><span>").unwrap().name(), "span");
    assert_eq!(open_tag_at_end("<div\n  class=\"x\">").unwrap().name(), "div");
    assert_eq!(open_tag_at_end("<br/>"), None);
    assert_eq!(open_tag_at_end("<br />"), None);
    assert_eq!(open_tag_at_end("<div>text"), None);
    assert_eq!(open_tag_at_end("</div>"), None);
  }

  #[test]
  fn closing_tag_alone_on_a_line() {
    assert_eq!(close_tag_line("  </div>").unwrap().name(), "div");
    assert_eq!(close_tag_line("</Div >").unwrap().name(), "Div");
    assert_eq!(close_tag_line("</div> text"), None);
    assert_eq!(close_tag_line("<div>"), None);
  }
}
