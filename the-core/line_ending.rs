#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LineEnding {
  /// CarriageReturn followed by LineFeed.
  Crlf,

  /// U+000A -- LineFeed
  LF,

  /// U+000D -- CarriageReturn
  CR,
}

impl LineEnding {
  #[inline]
  pub const fn len_chars(&self) -> usize {
    match self {
      Self::Crlf => 2,
      _ => 1,
    }
  }

  #[inline]
  pub const fn as_str(&self) -> &'static str {
    match self {
      Self::Crlf => "\u{000D}\u{000A}",
      Self::LF => "\u{000A}",
      Self::CR => "\u{000D}",
    }
  }

  #[inline]
  pub const fn from_char(ch: char) -> Option<LineEnding> {
    match ch {
      '\u{000A}' => Some(LineEnding::LF),
      '\u{000D}' => Some(LineEnding::CR),
      _ => None,
    }
  }
}

/// A line ending found inside a string, in char offsets.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct LineEndingMatch {
  pub char_idx: usize,
  pub ending:   LineEnding,
}

impl LineEndingMatch {
  pub const fn end(&self) -> usize {
    self.char_idx + self.ending.len_chars()
  }
}

/// Finds the first line ending in `text`. `\r\n` is reported as one ending.
pub fn find_line_ending(text: &str) -> Option<LineEndingMatch> {
  let mut chars = text.chars().enumerate().peekable();
  while let Some((idx, ch)) = chars.next() {
    match LineEnding::from_char(ch) {
      Some(LineEnding::CR) if matches!(chars.peek(), Some((_, '\n'))) => {
        return Some(LineEndingMatch {
          char_idx: idx,
          ending:   LineEnding::Crlf,
        });
      },
      Some(ending) => {
        return Some(LineEndingMatch {
          char_idx: idx,
          ending,
        });
      },
      None => {},
    }
  }
  None
}

#[inline]
pub fn contains_line_ending(text: &str) -> bool {
  text.chars().any(|ch| LineEnding::from_char(ch).is_some())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn finds_first_ending() {
    assert_eq!(
      find_line_ending("foo\nbar"),
      Some(LineEndingMatch {
        char_idx: 3,
        ending:   LineEnding::LF,
      })
    );
    assert_eq!(find_line_ending("foo"), None);
    assert_eq!(find_line_ending(""), None);
  }

  #[test]
  fn crlf_is_one_ending() {
    let found = find_line_ending("a\r\nb").expect("line ending");
    assert_eq!(found.ending, LineEnding::Crlf);
    assert_eq!(found.char_idx, 1);
    assert_eq!(found.end(), 3);
  }

  #[test]
  fn lone_cr_is_an_ending() {
    let found = find_line_ending("ab\rc").expect("line ending");
    assert_eq!(found.ending, LineEnding::CR);
    assert_eq!(found.end(), 3);
  }

  #[test]
  fn offsets_are_in_chars() {
    let found = find_line_ending("héé\n").expect("line ending");
    assert_eq!(found.char_idx, 3);
    assert!(contains_line_ending("x\r"));
    assert!(!contains_line_ending("x y"));
  }

  quickcheck::quickcheck! {
    fn ending_is_reported_at_its_position(prefix: String, suffix: String) -> bool {
      let prefix: String = prefix.chars().filter(|c| LineEnding::from_char(*c).is_none()).collect();
      let text = format!("{prefix}\n{suffix}");
      find_line_ending(&text).map(|found| found.char_idx) == Some(prefix.chars().count())
    }
  }
}
