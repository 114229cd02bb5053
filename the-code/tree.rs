//! Arena-backed document tree.
//!
//! Nodes live in a [`HopSlotMap`] and refer to each other through
//! [`NodeId`] handles: `parent`, `first`/`last` child and
//! `previous`/`next` sibling. Navigation is O(1) and removing a node never
//! leaves a dangling owner behind, a stale handle simply stops resolving.
//!
//! The structural edit primitives live in [`crate::builder`]; this module
//! holds the storage, the read-only queries and the invariant checks.

use std::collections::BTreeSet;

use slotmap::HopSlotMap;
use the_core::{
  chars::contains_nbsp,
  line_ending::contains_line_ending,
};
use thiserror::Error;

use crate::node::{
  Node,
  NodeId,
  NodeKind,
};

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeError {
  #[error("node {0:?} does not exist")]
  UnknownNode(NodeId),
  #[error("node {0:?} is not attached to a parent")]
  Detached(NodeId),
  #[error("node {node:?} of type `{kind}` cannot hold children")]
  NotAContainer { node: NodeId, kind: String },
  #[error("offset {offset} is out of bounds for node {node:?} of length {len}")]
  OffsetOutOfBounds {
    node:   NodeId,
    offset: usize,
    len:    usize,
  },
  #[error("node {node:?} cannot be moved into its own subtree {target:?}")]
  Cycle { node: NodeId, target: NodeId },
  #[error("node {node:?} is not a descendant of {ancestor:?}")]
  NotADescendant { node: NodeId, ancestor: NodeId },
  #[error("anchor {anchor:?} is not a child of {parent:?}")]
  AnchorMismatch { parent: NodeId, anchor: NodeId },
  #[error("attribute `{attribute}` is not supported by `{kind}`")]
  UnsupportedAttribute { attribute: &'static str, kind: String },
  #[error("the root node cannot be removed or moved")]
  RootImmutable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantError {
  MissingRoot,
  RootHasParent,
  ParentMismatch,
  SiblingMismatch,
  LastMismatch,
  LeafWithChildren,
  DuplicateVisit,
  UnreachableNode,
}

/// A code-specific well-formedness violation left in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeViolation {
  NonLineInBlock { block: NodeId, child: NodeId },
  EmptyBlock(NodeId),
  LineEndingInLine(NodeId),
  NbspInLine(NodeId),
  EmptyInlineCode(NodeId),
  InlineCodeInLine(NodeId),
  AdjacentInlineCode(NodeId),
}

#[derive(Debug, Clone)]
pub struct Document {
  root:  NodeId,
  nodes: HopSlotMap<NodeId, Node>,
}

impl Default for Document {
  fn default() -> Self {
    Self::new()
  }
}

impl Document {
  pub fn new() -> Self {
    let mut nodes = HopSlotMap::with_key();
    let root = nodes.insert(Node::new(NodeKind::Root));
    Self { root, nodes }
  }

  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.nodes.contains_key(id)
  }

  pub fn node(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(id)
  }

  pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
    self.nodes.get(id).map(|node| &node.kind)
  }

  pub fn is(&self, id: NodeId, predicate: impl FnOnce(&NodeKind) -> bool) -> bool {
    self.kind(id).is_some_and(predicate)
  }

  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.nodes.get(id).and_then(|node| node.parent)
  }

  pub fn first(&self, id: NodeId) -> Option<NodeId> {
    self.nodes.get(id).and_then(|node| node.first)
  }

  pub fn last(&self, id: NodeId) -> Option<NodeId> {
    self.nodes.get(id).and_then(|node| node.last)
  }

  pub fn previous(&self, id: NodeId) -> Option<NodeId> {
    self.nodes.get(id).and_then(|node| node.previous)
  }

  pub fn next(&self, id: NodeId) -> Option<NodeId> {
    self.nodes.get(id).and_then(|node| node.next)
  }

  pub fn children(&self, id: NodeId) -> Children<'_> {
    Children {
      doc:  self,
      next: self.first(id),
    }
  }

  /// All nodes below `id` in pre-order, `id` excluded.
  pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = self.children(id).collect();
    stack.reverse();
    while let Some(node) = stack.pop() {
      out.push(node);
      let start = stack.len();
      stack.extend(self.children(node));
      stack[start..].reverse();
    }
    out
  }

  /// Offset-space length: chars for text, one for a break, the sum of the
  /// children for everything else.
  pub fn len(&self, id: NodeId) -> usize {
    match self.kind(id) {
      None => 0,
      Some(NodeKind::Text { content }) => content.chars().count(),
      Some(NodeKind::BreakLine) => 1,
      Some(_) => self.children(id).map(|child| self.len(child)).sum(),
    }
  }

  pub fn is_empty(&self, id: NodeId) -> bool {
    self.len(id) == 0
  }

  /// Concatenated text of every text node below (or at) `id`.
  pub fn text_content(&self, id: NodeId) -> String {
    let mut out = String::new();
    self.collect_text(id, &mut out);
    out
  }

  fn collect_text(&self, id: NodeId, out: &mut String) {
    match self.kind(id) {
      Some(NodeKind::Text { content }) => out.push_str(content),
      Some(_) => {
        for child in self.children(id) {
          self.collect_text(child, out);
        }
      },
      None => {},
    }
  }

  pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
    let mut current = self.parent(node);
    while let Some(id) = current {
      if id == ancestor {
        return true;
      }
      current = self.parent(id);
    }
    false
  }

  /// Nearest code block at or above `id`.
  pub fn code_block_of(&self, id: NodeId) -> Option<NodeId> {
    let mut current = Some(id);
    while let Some(node) = current {
      if self.is(node, NodeKind::is_code_block) {
        return Some(node);
      }
      current = self.parent(node);
    }
    None
  }

  /// Nearest container at or above `id`.
  pub fn container_of(&self, id: NodeId) -> Option<NodeId> {
    let mut current = Some(id);
    while let Some(node) = current {
      if self.is(node, NodeKind::is_container) {
        return Some(node);
      }
      current = self.parent(node);
    }
    None
  }

  /// Whether the nearest container around `id` is a code line.
  pub fn in_code_line(&self, id: NodeId) -> bool {
    self
      .container_of(id)
      .is_some_and(|container| self.is(container, NodeKind::is_code_line))
  }

  /// First container at or inside `id`, in document order.
  pub fn first_container(&self, id: NodeId) -> Option<NodeId> {
    if self.is(id, NodeKind::is_container) {
      return Some(id);
    }
    self
      .descendants(id)
      .into_iter()
      .find(|node| self.is(*node, NodeKind::is_container))
  }

  /// Last container at or inside `id`, in document order.
  pub fn last_container(&self, id: NodeId) -> Option<NodeId> {
    if self.is(id, NodeKind::is_container) {
      return Some(id);
    }
    let mut child = self.last(id);
    while let Some(node) = child {
      if let Some(found) = self.last_container(node) {
        return Some(found);
      }
      child = self.previous(node);
    }
    None
  }

  /// Next selectable container after the subtree of `id`.
  pub fn next_container(&self, id: NodeId) -> Option<NodeId> {
    let mut current = id;
    loop {
      let mut sibling = self.next(current);
      while let Some(node) = sibling {
        if let Some(found) = self.first_container(node) {
          return Some(found);
        }
        sibling = self.next(node);
      }
      current = self.parent(current)?;
    }
  }

  /// Previous selectable container before the subtree of `id`.
  pub fn previous_container(&self, id: NodeId) -> Option<NodeId> {
    let mut current = id;
    loop {
      let mut sibling = self.previous(current);
      while let Some(node) = sibling {
        if let Some(found) = self.last_container(node) {
          return Some(found);
        }
        sibling = self.previous(node);
      }
      current = self.parent(current)?;
    }
  }

  /// Every container reachable from the root, in document order.
  pub fn containers(&self) -> Vec<NodeId> {
    self
      .descendants(self.root)
      .into_iter()
      .filter(|node| self.is(*node, NodeKind::is_container))
      .collect()
  }

  pub(crate) fn node_ref(&self, id: NodeId) -> Result<&Node> {
    self.nodes.get(id).ok_or(TreeError::UnknownNode(id))
  }

  pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
    self.nodes.get_mut(id).ok_or(TreeError::UnknownNode(id))
  }

  pub(crate) fn insert_node(&mut self, kind: NodeKind) -> NodeId {
    self.nodes.insert(Node::new(kind))
  }

  /// Detaches `id` from its parent and siblings. The subtree stays alive.
  pub(crate) fn unlink(&mut self, id: NodeId) -> Result<()> {
    if id == self.root {
      return Err(TreeError::RootImmutable);
    }
    let (parent, previous, next) = {
      let node = self.node_ref(id)?;
      (node.parent, node.previous, node.next)
    };
    let Some(parent) = parent else {
      return Ok(());
    };

    match previous {
      Some(previous) => self.node_mut(previous)?.next = next,
      None => self.node_mut(parent)?.first = next,
    }
    match next {
      Some(next) => self.node_mut(next)?.previous = previous,
      None => self.node_mut(parent)?.last = previous,
    }

    let node = self.node_mut(id)?;
    node.parent = None;
    node.previous = None;
    node.next = None;
    Ok(())
  }

  /// Links a detached `id` under `parent`, before `before` or at the end.
  pub(crate) fn link(&mut self, parent: NodeId, id: NodeId, before: Option<NodeId>) -> Result<()> {
    let parent_kind = &self.node_ref(parent)?.kind;
    if !parent_kind.can_have_children() {
      return Err(TreeError::NotAContainer {
        node: parent,
        kind: parent_kind.type_name().to_string(),
      });
    }
    if id == parent || self.is_ancestor(id, parent) {
      return Err(TreeError::Cycle {
        node:   id,
        target: parent,
      });
    }
    if before == Some(id) {
      return if self.parent(id) == Some(parent) {
        Ok(())
      } else {
        Err(TreeError::AnchorMismatch { parent, anchor: id })
      };
    }
    if let Some(anchor) = before {
      if self.parent(anchor) != Some(parent) {
        return Err(TreeError::AnchorMismatch { parent, anchor });
      }
    }
    self.unlink(id)?;

    let previous = match before {
      Some(anchor) => self.previous(anchor),
      None => self.last(parent),
    };
    {
      let node = self.node_mut(id)?;
      node.parent = Some(parent);
      node.previous = previous;
      node.next = before;
    }
    match previous {
      Some(previous) => self.node_mut(previous)?.next = Some(id),
      None => self.node_mut(parent)?.first = Some(id),
    }
    match before {
      Some(anchor) => self.node_mut(anchor)?.previous = Some(id),
      None => self.node_mut(parent)?.last = Some(id),
    }
    Ok(())
  }

  /// Removes a detached subtree from the arena.
  pub(crate) fn free(&mut self, id: NodeId) {
    let mut stack = vec![id];
    while let Some(node) = stack.pop() {
      stack.extend(self.children(node));
      self.nodes.remove(node);
    }
  }

  pub(crate) fn kind_mut(&mut self, id: NodeId) -> Result<&mut NodeKind> {
    Ok(&mut self.node_mut(id)?.kind)
  }

  /// Checks link consistency of every live subtree, attached or not.
  pub fn validate(&self) -> std::result::Result<(), InvariantError> {
    let Some(root) = self.nodes.get(self.root) else {
      return Err(InvariantError::MissingRoot);
    };
    if root.parent.is_some() {
      return Err(InvariantError::RootHasParent);
    }

    let mut visited = BTreeSet::new();
    let tops = self
      .nodes
      .iter()
      .filter(|(_, node)| node.parent.is_none())
      .map(|(id, _)| id);

    for top in tops {
      let mut stack = vec![top];
      while let Some(id) = stack.pop() {
        if !visited.insert(id) {
          return Err(InvariantError::DuplicateVisit);
        }
        let node = &self.nodes[id];
        if !node.kind.can_have_children() && node.first.is_some() {
          return Err(InvariantError::LeafWithChildren);
        }

        let mut previous = None;
        let mut child = node.first;
        while let Some(child_id) = child {
          let Some(child_node) = self.nodes.get(child_id) else {
            return Err(InvariantError::UnreachableNode);
          };
          if child_node.parent != Some(id) {
            return Err(InvariantError::ParentMismatch);
          }
          if child_node.previous != previous {
            return Err(InvariantError::SiblingMismatch);
          }
          stack.push(child_id);
          previous = Some(child_id);
          child = child_node.next;
        }
        if node.last != previous {
          return Err(InvariantError::LastMismatch);
        }
      }
    }

    if visited.len() != self.nodes.len() {
      return Err(InvariantError::UnreachableNode);
    }
    Ok(())
  }

  /// Code-specific invariants still violated below the root.
  pub fn code_violations(&self) -> Vec<CodeViolation> {
    let mut violations = Vec::new();
    for id in self.descendants(self.root) {
      let kind = &self.nodes[id].kind;
      let parent_kind = self.parent(id).and_then(|parent| self.kind(parent));
      match kind {
        NodeKind::CodeBlock { .. } => {
          if self.first(id).is_none() {
            violations.push(CodeViolation::EmptyBlock(id));
          }
          for child in self.children(id) {
            if !self.is(child, NodeKind::is_code_line) {
              violations.push(CodeViolation::NonLineInBlock { block: id, child });
            }
          }
        },
        NodeKind::CodeLine => {
          if contains_line_ending(&self.text_content(id)) {
            violations.push(CodeViolation::LineEndingInLine(id));
          }
        },
        NodeKind::Text { content } => {
          if contains_nbsp(content) && self.in_code_line(id) {
            violations.push(CodeViolation::NbspInLine(id));
          }
        },
        NodeKind::InlineCode => {
          if self.is_empty(id) {
            violations.push(CodeViolation::EmptyInlineCode(id));
          }
          if parent_kind.is_some_and(NodeKind::is_code_line) {
            violations.push(CodeViolation::InlineCodeInLine(id));
          }
          if self
            .previous(id)
            .is_some_and(|previous| self.is(previous, NodeKind::is_inline_code))
          {
            violations.push(CodeViolation::AdjacentInlineCode(id));
          }
        },
        _ => {},
      }
    }
    violations
  }
}

pub struct Children<'a> {
  doc:  &'a Document,
  next: Option<NodeId>,
}

impl Iterator for Children<'_> {
  type Item = NodeId;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.next?;
    self.next = self.doc.next(current);
    Some(current)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn paragraph(doc: &mut Document, text: &str) -> NodeId {
    let paragraph = doc.insert_node(NodeKind::Paragraph);
    let root = doc.root();
    doc.link(root, paragraph, None).expect("link paragraph");
    let text = doc.insert_node(NodeKind::text(text));
    doc.link(paragraph, text, None).expect("link text");
    paragraph
  }

  #[test]
  fn new_document_is_valid() {
    let doc = Document::new();
    assert_eq!(doc.node_count(), 1);
    assert_eq!(doc.validate(), Ok(()));
    assert!(doc.code_violations().is_empty());
  }

  #[test]
  fn link_and_unlink_keep_siblings_consistent() {
    let mut doc = Document::new();
    let a = paragraph(&mut doc, "a");
    let c = paragraph(&mut doc, "c");
    let b = doc.insert_node(NodeKind::Paragraph);
    doc.link(doc.root(), b, Some(c)).expect("link before");

    assert_eq!(doc.children(doc.root()).collect::<Vec<_>>(), vec![a, b, c]);
    assert_eq!(doc.previous(c), Some(b));
    assert_eq!(doc.validate(), Ok(()));

    doc.unlink(b).expect("unlink");
    assert_eq!(doc.children(doc.root()).collect::<Vec<_>>(), vec![a, c]);
    assert_eq!(doc.parent(b), None);
    assert_eq!(doc.validate(), Ok(()));
  }

  #[test]
  fn linking_into_own_subtree_is_rejected() {
    let mut doc = Document::new();
    let p = paragraph(&mut doc, "x");
    let text = doc.first(p).expect("text");
    let err = doc.link(text, p, None).expect_err("text cannot hold children");
    assert!(matches!(err, TreeError::NotAContainer { .. }));

    let inner = doc.insert_node(NodeKind::markup("em"));
    doc.link(p, inner, None).expect("link markup");
    let err = doc.link(inner, p, None).expect_err("cycle");
    assert!(matches!(err, TreeError::Cycle { .. }));
  }

  #[test]
  fn lengths_and_text() {
    let mut doc = Document::new();
    let p = paragraph(&mut doc, "héllo");
    let br = doc.insert_node(NodeKind::BreakLine);
    doc.link(p, br, None).expect("link break");
    assert_eq!(doc.len(p), 6);
    assert_eq!(doc.text_content(p), "héllo");
  }

  #[test]
  fn containers_in_document_order() {
    let mut doc = Document::new();
    let a = paragraph(&mut doc, "a");
    let block = doc.insert_node(NodeKind::code_block(Default::default()));
    doc.link(doc.root(), block, None).expect("link block");
    let line = doc.insert_node(NodeKind::CodeLine);
    doc.link(block, line, None).expect("link line");
    let b = paragraph(&mut doc, "b");

    assert_eq!(doc.containers(), vec![a, line, b]);
    assert_eq!(doc.next_container(a), Some(line));
    assert_eq!(doc.next_container(line), Some(b));
    assert_eq!(doc.previous_container(b), Some(line));
    assert_eq!(doc.previous_container(a), None);
    assert_eq!(doc.last_container(block), Some(line));
    assert_eq!(doc.code_block_of(line), Some(block));
  }

  #[test]
  fn free_removes_whole_subtree() {
    let mut doc = Document::new();
    let p = paragraph(&mut doc, "a");
    let text = doc.first(p).expect("text");
    doc.unlink(p).expect("unlink");
    doc.free(p);
    assert!(!doc.contains(p));
    assert!(!doc.contains(text));
    assert_eq!(doc.validate(), Ok(()));
  }

  #[test]
  fn violations_are_reported() {
    let mut doc = Document::new();
    let block = doc.insert_node(NodeKind::code_block(Default::default()));
    doc.link(doc.root(), block, None).expect("link block");
    assert_eq!(doc.code_violations(), vec![CodeViolation::EmptyBlock(block)]);
  }
}
