//! Character classification used by code-line editing.

/// U+00A0, produced by rich-text hosts in place of plain spaces.
pub const NBSP: char = '\u{00A0}';

#[derive(Debug, Eq, PartialEq)]
pub enum CharCategory {
  Whitespace,
  Eol,
  Word,
  Other,
}

pub fn categorize_char(ch: char) -> CharCategory {
  match ch {
    c if char_is_line_ending(c) => CharCategory::Eol,
    c if char_is_whitespace(c) => CharCategory::Whitespace,
    c if char_is_word(c) => CharCategory::Word,
    _ => CharCategory::Other,
  }
}

#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  matches!(ch, '\u{000A}' | '\u{000D}')
}

/// Whitespace that may form an indentation run.
///
/// Only tabs, spaces and no-break spaces count; line endings never do.
#[inline]
pub fn char_is_whitespace(ch: char) -> bool {
  matches!(ch, '\u{0009}' | '\u{0020}' | NBSP)
}

#[inline]
pub fn char_is_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}

/// Number of chars in the leading whitespace run of `text`.
pub fn leading_whitespace_len(text: &str) -> usize {
  text.chars().take_while(|&ch| char_is_whitespace(ch)).count()
}

/// The leading whitespace run of `text`.
pub fn leading_whitespace(text: &str) -> &str {
  let end = text
    .char_indices()
    .find(|&(_, ch)| !char_is_whitespace(ch))
    .map_or(text.len(), |(idx, _)| idx);
  &text[..end]
}

pub fn contains_nbsp(text: &str) -> bool {
  text.contains(NBSP)
}

pub fn replace_nbsp(text: &str) -> String {
  text.replace(NBSP, " ")
}

/// True when `text` is empty or made only of whitespace and line endings.
pub fn is_blank(text: &str) -> bool {
  text
    .chars()
    .all(|ch| char_is_whitespace(ch) || char_is_line_ending(ch))
}

/// Byte index of the char at `char_idx`, or `text.len()` past the end.
pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
  text
    .char_indices()
    .nth(char_idx)
    .map_or(text.len(), |(idx, _)| idx)
}
