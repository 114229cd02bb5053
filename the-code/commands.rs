//! Toolbar commands and the controls that advertise them.

use std::fmt;

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  builder::Split,
  indent::IndentConfig,
  node::{
    NodeId,
    NodeKind,
  },
  tree::{
    Document,
    Result,
    TreeError,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeAction {
  #[serde(rename = "code.createInline")]
  CreateInline,
  #[serde(rename = "code.removeAll")]
  RemoveAll,
  #[serde(rename = "code.createBlock")]
  CreateBlock,
}

impl CodeAction {
  pub const fn slug(self) -> &'static str {
    match self {
      Self::CreateInline => "code.createInline",
      Self::RemoveAll => "code.removeAll",
      Self::CreateBlock => "code.createBlock",
    }
  }
}

impl fmt::Display for CodeAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.slug())
  }
}

/// An action offered for the current selection. `selected` marks an action
/// whose effect is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
  pub action:   CodeAction,
  pub selected: bool,
}

impl Control {
  pub const fn new(action: CodeAction) -> Self {
    Self {
      action,
      selected: false,
    }
  }

  pub const fn selected(action: CodeAction) -> Self {
    Self {
      action,
      selected: true,
    }
  }
}

fn in_code_line(doc: &Document, node: NodeId) -> bool {
  doc
    .parent(node)
    .is_some_and(|parent| doc.is(parent, NodeKind::is_code_line))
}

fn under_section(doc: &Document, node: NodeId) -> bool {
  doc
    .parent(node)
    .is_some_and(|parent| doc.is(parent, NodeKind::is_section))
}

/// Wraps every selected text outside code lines in its own inline code.
pub fn create_code_inline(doc: &mut Document, items: &[NodeId]) -> Result<usize> {
  let mut wrapped = 0;
  for &item in items {
    if !doc.contains(item) || !doc.is(item, NodeKind::is_text) || in_code_line(doc, item) {
      continue;
    }
    let Some(parent) = doc.parent(item) else {
      continue;
    };
    let code = doc.create(NodeKind::InlineCode);
    doc.append(parent, code, Some(item))?;
    doc.detach(item)?;
    doc.push(code, item)?;
    wrapped += 1;
  }
  tracing::debug!(wrapped, "create inline code");
  Ok(wrapped)
}

/// Replaces every selected inline code with its content.
pub fn remove_code(doc: &mut Document, items: &[NodeId]) -> Result<usize> {
  let mut removed = 0;
  for &item in items {
    if doc.contains(item) && doc.is(item, NodeKind::is_inline_code) {
      doc.unwrap_node(item)?;
      removed += 1;
    }
  }
  tracing::debug!(removed, "remove inline code");
  Ok(removed)
}

/// Turns `container` into a code block whose single line holds the former
/// content. Returns `None` when the container already is code.
pub fn create_code_block(
  doc: &mut Document,
  container: NodeId,
  config: IndentConfig,
) -> Result<Option<NodeId>> {
  if doc.code_block_of(container).is_some() || doc.is(container, NodeKind::is_code_line) {
    return Ok(None);
  }

  let block = doc.create(NodeKind::code_block(config));
  let line = doc.create(NodeKind::CodeLine);
  if let Some(first) = doc.first(container) {
    doc.append(line, first, None)?;
  }
  doc.push(block, line)?;
  doc.replace(container, block)?;
  Ok(Some(block))
}

/// Moves `next_line` and every line after it into a new block placed right
/// after `block`. The new block keeps the indent configuration.
pub fn split_block(doc: &mut Document, block: NodeId, next_line: NodeId) -> Result<Split> {
  if doc.parent(next_line) != Some(block) {
    return Err(TreeError::NotADescendant {
      node:     next_line,
      ancestor: block,
    });
  }
  let kind = doc
    .kind(block)
    .filter(|kind| kind.is_code_block())
    .cloned()
    .ok_or_else(|| {
      TreeError::NotAContainer {
        node: block,
        kind: doc.kind(block).map(|kind| kind.type_name().to_string()).unwrap_or_default(),
      }
    })?;

  let tail = doc.create(kind);
  doc.insert_after(block, tail)?;
  doc.append(tail, next_line, None)?;
  Ok(Split { head: block, tail })
}

/// Controls for a selection over `focused` nodes. Only ranges get any.
pub fn selection_controls(doc: &Document, focused: &[NodeId], is_range: bool) -> Vec<Control> {
  if !is_range {
    return Vec::new();
  }
  if focused.iter().any(|node| doc.is(*node, NodeKind::is_inline_code)) {
    return vec![Control::selected(CodeAction::RemoveAll)];
  }
  let has_text = focused
    .iter()
    .any(|node| doc.is(*node, NodeKind::is_text) && !in_code_line(doc, *node));
  if has_text {
    vec![Control::new(CodeAction::CreateInline)]
  } else {
    Vec::new()
  }
}

/// Controls offered when inserting into an empty `container`.
pub fn insert_controls(doc: &Document, container: NodeId) -> Vec<Control> {
  if doc.code_block_of(container).is_some() || !under_section(doc, container) {
    return Vec::new();
  }
  vec![Control::new(CodeAction::CreateBlock)]
}

/// Controls for replacing the focused top-level containers.
pub fn replace_controls(doc: &Document, focused: &[NodeId]) -> Vec<Control> {
  let mut any = false;
  let mut code = false;
  for &node in focused {
    if doc.is(node, NodeKind::is_container) && under_section(doc, node) {
      any = true;
    }
    if doc.is(node, NodeKind::is_code_block) && under_section(doc, node) {
      any = true;
      code = true;
    }
    if doc.is(node, NodeKind::is_code_line)
      && doc.code_block_of(node).is_some_and(|block| under_section(doc, block))
    {
      any = true;
      code = true;
    }
  }
  if !any {
    return Vec::new();
  }
  vec![Control {
    action:   CodeAction::CreateBlock,
    selected: code,
  }]
}
