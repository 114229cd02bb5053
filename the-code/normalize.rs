//! Normalization of code nodes.
//!
//! [`normalize`] inspects one node, fixes at most one violation and returns
//! the node that must be looked at next; `None` means the node is fine.
//! [`normalize_all`] drives it with a worklist until nothing is left to
//! repair.
//!
//! Rules, first match wins:
//!
//! | # | Node | Context | Repair |
//! |---|------|---------|--------|
//! | 1 | inline code, non-line container | parent is a block | convert to a line |
//! | 2 | text, non-blank or not after a line | parent is a block | wrap in a new line |
//! | 3 | anything but a line | parent is a block | splice children up, drop node |
//! | 4 | line break | parent is an attached line | move the rest into a new line |
//! | 5 | text with a no-break space | nearest container is a line | replace with a space |
//! | 6 | empty inline code | any | drop |
//! | 7 | inline code | parent is a line | unwrap |
//! | 8 | inline code after inline code | any | merge into the previous one |
//! | 9 | line containing a line ending | attached | split at the first ending |
//! | 10 | empty block | any | seed one empty line |

use std::collections::{
  BTreeSet,
  VecDeque,
};

use the_core::{
  chars::{
    char_is_line_ending,
    contains_nbsp,
    is_blank,
    replace_nbsp,
  },
  line_ending::{
    LineEnding,
    find_line_ending,
  },
};
use thiserror::Error;

use crate::{
  builder::Attribute,
  node::{
    NodeId,
    NodeKind,
  },
  tree::{
    Document,
    TreeError,
  },
};

pub type Result<T> = std::result::Result<T, NormalizeError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
  #[error(transparent)]
  Tree(#[from] TreeError),
  #[error("normalization did not reach a fixpoint after {steps} steps")]
  Diverged { steps: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
  ConvertToLine,
  WrapText,
  Flatten,
  SplitAtBreak,
  ReplaceNbsp,
  RemoveEmptyInline,
  UnwrapInline,
  MergeInline,
  SplitAtLineEnding,
  SeedEmptyBlock,
}

/// The first rule that applies to `node`, if any.
pub fn find_rule(doc: &Document, node: NodeId) -> Option<Rule> {
  let kind = doc.kind(node)?;
  let parent = doc.parent(node);
  let parent_kind = parent.and_then(|parent| doc.kind(parent));

  if parent_kind.is_some_and(NodeKind::is_code_block) {
    if kind.is_inline_code() || (kind.is_container() && !kind.is_code_line()) {
      return Some(Rule::ConvertToLine);
    }
    if let NodeKind::Text { content } = kind {
      let after_line = doc
        .previous(node)
        .is_some_and(|previous| doc.is(previous, NodeKind::is_code_line));
      if !is_blank(content) || !after_line {
        return Some(Rule::WrapText);
      }
    }
    if !kind.is_code_line() {
      return Some(Rule::Flatten);
    }
  }

  if parent_kind.is_some_and(NodeKind::is_code_line) {
    let line_attached = parent.and_then(|parent| doc.parent(parent)).is_some();
    if line_attached && kind.is_break_line() {
      return Some(Rule::SplitAtBreak);
    }
  }

  if kind.content().is_some_and(contains_nbsp) && doc.in_code_line(node) {
    return Some(Rule::ReplaceNbsp);
  }

  if kind.is_inline_code() {
    if doc.is_empty(node) {
      return Some(Rule::RemoveEmptyInline);
    }
    if parent_kind.is_some_and(NodeKind::is_code_line) {
      return Some(Rule::UnwrapInline);
    }
    let after_inline = doc
      .previous(node)
      .is_some_and(|previous| doc.is(previous, NodeKind::is_inline_code));
    if after_inline {
      return Some(Rule::MergeInline);
    }
  }

  if kind.is_code_line() && parent.is_some() && line_ending_offset(doc, node).is_some() {
    return Some(Rule::SplitAtLineEnding);
  }

  if kind.is_code_block() && doc.first(node).is_none() {
    return Some(Rule::SeedEmptyBlock);
  }

  None
}

/// Offset and length of the first line ending inside `line`.
///
/// A `\r` closing one text and a `\n` opening the next are one ending.
fn line_ending_offset(doc: &Document, line: NodeId) -> Option<(usize, usize)> {
  let mut acc = 0;
  let mut trailing_cr = None;
  for leaf in doc.descendants(line) {
    match doc.kind(leaf) {
      Some(NodeKind::Text { content }) => {
        if content.is_empty() {
          continue;
        }
        if let Some(at) = trailing_cr {
          let len = if content.starts_with('\n') { 2 } else { 1 };
          return Some((at, len));
        }
        let chars = content.chars().count();
        if let Some(found) = find_line_ending(content) {
          if found.ending != LineEnding::CR || found.end() != chars {
            return Some((acc + found.char_idx, found.ending.len_chars()));
          }
          trailing_cr = Some(acc + found.char_idx);
        }
        acc += chars;
      },
      Some(NodeKind::BreakLine) => {
        if let Some(at) = trailing_cr {
          return Some((at, 1));
        }
        acc += 1;
      },
      _ => {},
    }
  }
  trailing_cr.map(|at| (at, 1))
}

/// Repairs the first violation of `node`.
///
/// Returns the node to re-examine next, or `None` when `node` needs no
/// repair. Calling it again on an already normalized node returns `None`.
pub fn normalize(doc: &mut Document, node: NodeId) -> Result<Option<NodeId>> {
  let Some(rule) = find_rule(doc, node) else {
    return Ok(None);
  };
  tracing::trace!(?rule, ?node, "normalize");
  let next = apply(doc, node, rule)?;
  Ok(Some(next))
}

fn apply(doc: &mut Document, node: NodeId, rule: Rule) -> Result<NodeId> {
  let parent = doc.parent(node);
  let next = match rule {
    Rule::ConvertToLine => {
      doc.convert(node, NodeKind::CodeLine)?;
      node
    },
    Rule::WrapText => {
      let line = doc.create(NodeKind::CodeLine);
      doc.wrap(node, line, node)?;
      line
    },
    Rule::Flatten => {
      let parent = parent.ok_or(TreeError::Detached(node))?;
      if let Some(first) = doc.first(node) {
        doc.append(parent, first, Some(node))?;
      }
      doc.cut(node)?;
      parent
    },
    Rule::SplitAtBreak => {
      let line = parent.ok_or(TreeError::Detached(node))?;
      let new_line = doc.create(NodeKind::CodeLine);
      doc.insert_after(line, new_line)?;
      if let Some(rest) = doc.next(node) {
        doc.append(new_line, rest, None)?;
      }
      doc.cut(node)?;
      doc.parent(line).unwrap_or(line)
    },
    Rule::ReplaceNbsp => {
      let content = doc
        .kind(node)
        .and_then(NodeKind::content)
        .map(replace_nbsp)
        .unwrap_or_default();
      doc.set_attribute(node, Attribute::Content(content.into()))?;
      node
    },
    Rule::RemoveEmptyInline => {
      doc.cut(node)?;
      parent.unwrap_or(node)
    },
    Rule::UnwrapInline => {
      doc.unwrap_node(node)?;
      parent.unwrap_or(node)
    },
    Rule::MergeInline => {
      let previous = doc.previous(node).ok_or(TreeError::Detached(node))?;
      if let Some(first) = doc.first(node) {
        doc.append(previous, first, None)?;
      }
      doc.cut(node)?;
      previous
    },
    Rule::SplitAtLineEnding => split_at_line_ending(doc, node)?,
    Rule::SeedEmptyBlock => {
      let line = doc.create(NodeKind::CodeLine);
      doc.push(node, line)?;
      node
    },
  };
  Ok(next)
}

fn split_at_line_ending(doc: &mut Document, line: NodeId) -> Result<NodeId> {
  let Some((at, len)) = line_ending_offset(doc, line) else {
    return Ok(line);
  };
  let right = doc.split_by_offset(line, at + len)?;
  let ending = doc.split_by_offset(line, at)?;

  let new_line = doc.create(NodeKind::CodeLine);
  doc.insert_after(line, new_line)?;
  if let Some(right) = right {
    doc.append(new_line, right, None)?;
  }
  let mut current = ending;
  while let Some(node) = current {
    current = doc.next(node);
    doc.cut(node)?;
  }
  Ok(new_line)
}

/// Upper bound on the number of nodes the subtree of `from` can reach while
/// it is normalized.
///
/// Every line ending or break may open a new line and split one node per
/// nesting level on each side of it. Wrapping texts and seeding blocks add
/// at most one node each.
fn growth_bound(doc: &Document, from: NodeId) -> usize {
  let nodes = doc.descendants(from);
  let mut depth = 0;
  let mut endings = 0;
  for &id in &nodes {
    depth = depth.max(depth_below(doc, from, id));
    endings += match doc.kind(id) {
      Some(NodeKind::Text { content }) => {
        content
          .chars()
          .filter(|ch| char_is_line_ending(*ch))
          .count()
      },
      Some(NodeKind::BreakLine) => 1,
      _ => 0,
    };
  }
  let per_ending = depth.saturating_mul(2).saturating_add(2);
  nodes
    .len()
    .saturating_mul(2)
    .saturating_add(endings.saturating_mul(per_ending))
    .saturating_add(1)
}

fn depth_below(doc: &Document, ancestor: NodeId, node: NodeId) -> usize {
  let mut depth = 0;
  let mut current = Some(node);
  while let Some(id) = current {
    if id == ancestor {
      break;
    }
    depth += 1;
    current = doc.parent(id);
  }
  depth
}

/// Normalizes the subtree of `from` to a fixpoint.
///
/// Every node of the subtree is checked once; each repair queues the
/// returned node, its children and its parent again. Returns the number of
/// repairs. The step budget is quadratic in the size the subtree can grow
/// to; running out of it means the rule table stopped converging.
pub fn normalize_all(doc: &mut Document, from: NodeId) -> Result<usize> {
  fn enqueue(queue: &mut VecDeque<NodeId>, queued: &mut BTreeSet<NodeId>, id: NodeId) {
    if queued.insert(id) {
      queue.push_back(id);
    }
  }

  let mut queue = VecDeque::new();
  let mut queued = BTreeSet::new();

  enqueue(&mut queue, &mut queued, from);
  for id in doc.descendants(from) {
    enqueue(&mut queue, &mut queued, id);
  }

  let size = growth_bound(doc, from).saturating_add(8);
  let budget = size.saturating_mul(size).saturating_mul(4);
  let mut steps = 0;
  let mut repairs = 0;

  while let Some(node) = queue.pop_front() {
    queued.remove(&node);
    if !doc.contains(node) {
      continue;
    }
    steps += 1;
    if steps > budget {
      tracing::warn!(steps, repairs, "normalization exceeded its step budget");
      return Err(NormalizeError::Diverged { steps });
    }

    let Some(next) = normalize(doc, node)? else {
      continue;
    };
    repairs += 1;
    if !doc.contains(next) {
      continue;
    }
    enqueue(&mut queue, &mut queued, next);
    let children: Vec<NodeId> = doc.children(next).collect();
    for child in children {
      enqueue(&mut queue, &mut queued, child);
    }
    if let Some(parent) = doc.parent(next) {
      enqueue(&mut queue, &mut queued, parent);
    }
    if doc.contains(node) && node != next {
      enqueue(&mut queue, &mut queued, node);
    }
  }

  tracing::trace!(steps, repairs, "normalized");
  debug_assert!(doc.validate().is_ok());
  Ok(repairs)
}

/// Normalizes the whole document.
pub fn normalize_document(doc: &mut Document) -> Result<usize> {
  let root = doc.root();
  normalize_all(doc, root)
}
