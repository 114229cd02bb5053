//! Indentation units and line indenting.
//!
//! A code block carries an [`IndentConfig`]; the indent unit of a line is
//! read from the block that owns it. Indenting and unindenting apply to
//! every code line touched by a selection and shift the selection ends by
//! what was inserted or removed on their own line.

use serde::{
  Deserialize,
  Serialize,
};
use smallvec::SmallVec;

use crate::{
  Tendril,
  node::{
    NodeId,
    NodeKind,
  },
  selection::{
    Position,
    Selection,
  },
  tree::{
    Document,
    Result,
  },
};

pub const DEFAULT_INDENT_SIZE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentUnit {
  Tab,
  Space,
}

/// `{type: "tab" | "space", size}`. `size` only matters for spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndentConfig {
  #[serde(rename = "type")]
  pub unit: IndentUnit,
  #[serde(default = "default_size")]
  pub size: u8,
}

fn default_size() -> u8 {
  DEFAULT_INDENT_SIZE
}

impl Default for IndentConfig {
  fn default() -> Self {
    Self::spaces(DEFAULT_INDENT_SIZE)
  }
}

impl IndentConfig {
  pub const fn tabs() -> Self {
    Self {
      unit: IndentUnit::Tab,
      size: 1,
    }
  }

  pub const fn spaces(size: u8) -> Self {
    Self {
      unit: IndentUnit::Space,
      size,
    }
  }

  /// The whitespace inserted for one level. A zero space count still
  /// yields one space so an indent always makes progress.
  pub fn unit_str(&self) -> Tendril {
    match self.unit {
      IndentUnit::Tab => Tendril::from("\t"),
      IndentUnit::Space => {
        let mut unit = Tendril::new();
        for _ in 0..self.size.max(1) {
          unit.push(' ');
        }
        unit
      },
    }
  }

  pub fn len_chars(&self) -> usize {
    match self.unit {
      IndentUnit::Tab => 1,
      IndentUnit::Space => usize::from(self.size.max(1)),
    }
  }
}

/// Indent configuration of the code block owning `node`, or the default.
pub fn indent_config_of(doc: &Document, node: NodeId) -> IndentConfig {
  doc
    .code_block_of(node)
    .and_then(|block| match doc.kind(block) {
      Some(NodeKind::CodeBlock { indent }) => Some(*indent),
      _ => None,
    })
    .unwrap_or_default()
}

/// One indent unit for the line `node`.
pub fn detect_indent(doc: &Document, node: NodeId) -> Tendril {
  indent_config_of(doc, node).unit_str()
}

fn touched_lines(doc: &Document, selection: &Selection) -> SmallVec<[NodeId; 4]> {
  selection
    .containers(doc)
    .into_iter()
    .filter(|node| doc.is(*node, NodeKind::is_code_line))
    .collect()
}

fn shift(selection: Selection, shifts: &[(NodeId, usize)], grow: bool) -> Selection {
  selection.map(|position| {
    let Some((_, len)) = shifts.iter().find(|(line, _)| *line == position.node) else {
      return position;
    };
    let offset = if grow {
      position.offset + len
    } else {
      position.offset.saturating_sub(*len)
    };
    Position::new(position.node, offset)
  })
}

/// Inserts one indent unit at column 0 of every touched code line.
pub fn indent(doc: &mut Document, selection: Selection) -> Result<Selection> {
  let lines = touched_lines(doc, &selection);
  let mut shifts: SmallVec<[(NodeId, usize); 4]> = SmallVec::new();
  for line in lines {
    let unit = detect_indent(doc, line);
    doc.insert_text(line, 0, &unit)?;
    shifts.push((line, unit.chars().count()));
  }
  tracing::trace!(lines = shifts.len(), "indent");
  Ok(shift(selection, &shifts, true))
}

/// How many leading chars of `text` one unindent step removes.
///
/// The configured unit wins; a single tab is accepted as a fallback, and a
/// line starting with neither is left alone.
pub fn unindent_len(text: &str, unit: &str) -> usize {
  if text.starts_with(unit) {
    unit.chars().count()
  } else if text.starts_with('\t') {
    1
  } else {
    0
  }
}

/// Removes up to one indent unit from column 0 of every touched code line.
pub fn unindent(doc: &mut Document, selection: Selection) -> Result<Selection> {
  let lines = touched_lines(doc, &selection);
  let mut shifts: SmallVec<[(NodeId, usize); 4]> = SmallVec::new();
  for line in lines {
    let unit = detect_indent(doc, line);
    let removed = unindent_len(&doc.text_content(line), &unit);
    if removed == 0 {
      continue;
    }
    doc.delete_text(line, 0, removed)?;
    shifts.push((line, removed));
  }
  tracing::trace!(lines = shifts.len(), "unindent");
  Ok(shift(selection, &shifts, false))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn block_with_lines(config: IndentConfig, texts: &[&str]) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new();
    let root = doc.root();
    let block = doc.create(NodeKind::code_block(config));
    doc.push(root, block).expect("push block");
    let mut lines = Vec::new();
    for text in texts {
      let line = doc.create(NodeKind::CodeLine);
      doc.push(block, line).expect("push line");
      if !text.is_empty() {
        let text = doc.create_text(*text);
        doc.push(line, text).expect("push text");
      }
      lines.push(line);
    }
    (doc, lines)
  }

  #[test]
  fn unit_from_config() {
    assert_eq!(IndentConfig::tabs().unit_str().as_str(), "\t");
    assert_eq!(IndentConfig::spaces(4).unit_str().as_str(), "    ");
    assert_eq!(IndentConfig::spaces(0).len_chars(), 1);
    assert_eq!(IndentConfig::default().unit_str().as_str(), "  ");
  }

  #[test]
  fn detect_reads_owning_block() {
    let (doc, lines) = block_with_lines(IndentConfig::tabs(), &["x"]);
    assert_eq!(detect_indent(&doc, lines[0]).as_str(), "\t");
    assert_eq!(detect_indent(&doc, doc.root()).as_str(), "  ");
  }

  #[test]
  fn indent_two_lines_shifts_selection() {
    let (mut doc, lines) = block_with_lines(IndentConfig::spaces(4), &["foo", "bar"]);
    let selection = Selection::new(Position::new(lines[0], 1), Position::new(lines[1], 2));

    let selection = indent(&mut doc, selection).expect("indent");

    assert_eq!(doc.text_content(lines[0]), "    foo");
    assert_eq!(doc.text_content(lines[1]), "    bar");
    assert_eq!(selection.anchor, Position::new(lines[0], 5));
    assert_eq!(selection.focus, Position::new(lines[1], 6));
  }

  #[test]
  fn unindent_prefers_unit_then_tab() {
    let (mut doc, lines) = block_with_lines(IndentConfig::spaces(2), &["  a", "\tb", "c", " d"]);
    let selection = Selection::new(Position::new(lines[0], 3), Position::new(lines[3], 1));

    let selection = unindent(&mut doc, selection).expect("unindent");

    assert_eq!(doc.text_content(lines[0]), "a");
    assert_eq!(doc.text_content(lines[1]), "b");
    assert_eq!(doc.text_content(lines[2]), "c");
    assert_eq!(doc.text_content(lines[3]), " d");
    assert_eq!(selection.anchor, Position::new(lines[0], 1));
    assert_eq!(selection.focus, Position::new(lines[3], 1));
  }

  #[test]
  fn unindent_clamps_offsets_at_zero() {
    let (mut doc, lines) = block_with_lines(IndentConfig::spaces(4), &["    x"]);
    let selection = unindent(&mut doc, Selection::point(lines[0], 2)).expect("unindent");
    assert_eq!(selection.anchor.offset, 0);
    assert_eq!(doc.text_content(lines[0]), "x");
  }

  #[test]
  fn config_wire_shape() {
    let config: IndentConfig =
      serde_json::from_str(r#"{"type":"space","size":4}"#).expect("parse config");
    assert_eq!(config, IndentConfig::spaces(4));
    let config: IndentConfig = serde_json::from_str(r#"{"type":"tab"}"#).expect("parse tab");
    assert_eq!(config.unit, IndentUnit::Tab);
  }

  quickcheck::quickcheck! {
    fn unindent_undoes_indent(texts: Vec<String>, tabs: bool) -> bool {
      let texts: Vec<String> = texts
        .into_iter()
        .take(4)
        .map(|text| {
          text
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
        })
        .collect();
      if texts.is_empty() {
        return true;
      }
      let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
      let config = if tabs { IndentConfig::tabs() } else { IndentConfig::spaces(4) };
      let (mut doc, lines) = block_with_lines(config, &refs);
      let last = lines[lines.len() - 1];
      let selection = Selection::new(Position::new(lines[0], 0), Position::new(last, doc.len(last)));

      let indented = indent(&mut doc, selection).expect("indent");
      let restored = unindent(&mut doc, indented).expect("unindent");

      restored == selection
        && lines
          .iter()
          .zip(&texts)
          .all(|(line, text)| doc.text_content(*line) == *text)
    }
  }
}
