//! Backtick autocompletion.
//!
//! Runs after the host inserted a typed backtick. Inside a paragraph-like
//! container sitting directly under a section it recognises two patterns in
//! the text before the cursor:
//!
//! - `` `code` `` becomes an inline code run;
//! - ```` ``` ```` at the very start of the container turns the container
//!   into a code block.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
  indent::IndentConfig,
  node::{
    NodeId,
    NodeKind,
  },
  selection::Selection,
  tree::{
    Document,
    Result,
  },
};

static INLINE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"`([^`\n]+)`$").expect("inline code regex should compile"));

static BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```$").expect("code block regex should compile"));

/// Flattened content of `container` up to `offset`, one char per offset
/// unit. Line breaks read as `\n`.
fn text_before(doc: &Document, container: NodeId, offset: usize) -> String {
  let mut out = String::new();
  for node in doc.descendants(container) {
    match doc.kind(node) {
      Some(NodeKind::Text { content }) => out.push_str(content),
      Some(NodeKind::BreakLine) => out.push('\n'),
      _ => {},
    }
  }
  out.chars().take(offset).collect()
}

/// Applies a backtick conversion at the cursor.
///
/// Returns the selection to apply when a pattern converted, `None` when
/// nothing matched.
pub fn autocomplete(
  doc: &mut Document,
  selection: Selection,
  config: IndentConfig,
) -> Result<Option<Selection>> {
  if selection.is_range() {
    return Ok(None);
  }
  let Some(container) = doc.container_of(selection.anchor.node) else {
    return Ok(None);
  };
  let under_section = doc
    .parent(container)
    .is_some_and(|parent| doc.is(parent, NodeKind::is_section));
  if doc.is(container, NodeKind::is_code_line) || !under_section {
    return Ok(None);
  }

  let offset = selection.anchor.offset;
  let before = text_before(doc, container, offset);
  if !before.ends_with('`') {
    return Ok(None);
  }

  if BLOCK.is_match(&before) {
    return convert_to_block(doc, container, config).map(Some);
  }

  let Some(captures) = INLINE.captures(&before) else {
    return Ok(None);
  };
  let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
    return Ok(None);
  };
  let start = before[..whole.start()].chars().count();
  let code = inner.as_str().to_owned();
  convert_to_inline(doc, container, start, offset, &code).map(Some)
}

fn convert_to_block(doc: &mut Document, container: NodeId, config: IndentConfig) -> Result<Selection> {
  doc.delete_text(container, 0, 3)?;

  let block = doc.create(NodeKind::code_block(config));
  let line = doc.create(NodeKind::CodeLine);
  doc.push(block, line)?;
  if !doc.is_empty(container) {
    if let Some(first) = doc.first(container) {
      doc.append(line, first, None)?;
    }
  }
  doc.replace(container, block)?;

  tracing::debug!(?block, "converted container to code block");
  Ok(Selection::point(line, 0))
}

fn convert_to_inline(
  doc: &mut Document,
  container: NodeId,
  start: usize,
  end: usize,
  code: &str,
) -> Result<Selection> {
  doc.delete_text(container, start, end)?;

  let inline = doc.create(NodeKind::InlineCode);
  let text = doc.create_text(code);
  doc.push(inline, text)?;
  let tail = doc.split_by_offset(container, start)?;
  doc.append(container, inline, tail)?;

  tracing::debug!(?inline, len = code.chars().count(), "converted backticks to inline code");
  Ok(Selection::point(container, end - 2))
}
