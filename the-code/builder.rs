//! Structural edit primitives.
//!
//! These are the only operations that mutate a [`Document`]. Every other
//! component (normalization, key handlers, autocomplete, commands) is a
//! bounded sequence of calls into this set. Each primitive keeps the generic
//! parent/child/sibling links consistent; the code-specific invariants are
//! restored afterwards by [`crate::normalize`].

use smallvec::SmallVec;
use the_core::chars::char_to_byte_idx;

use crate::{
  Tendril,
  handlers,
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

/// Attribute writes accepted by [`Document::set_attribute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
  Content(Tendril),
  Indent(IndentConfig),
  Tag(Tendril),
}

impl Attribute {
  pub fn name(&self) -> &'static str {
    match self {
      Self::Content(_) => "content",
      Self::Indent(_) => "indent",
      Self::Tag(_) => "tag",
    }
  }
}

/// Result of splitting a block into two siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
  pub head: NodeId,
  pub tail: NodeId,
}

impl Document {
  /// Creates a detached node.
  pub fn create(&mut self, kind: NodeKind) -> NodeId {
    self.insert_node(kind)
  }

  /// Creates the host's generic block.
  pub fn create_block(&mut self) -> NodeId {
    self.insert_node(NodeKind::Paragraph)
  }

  /// Creates a detached text node.
  pub fn create_text(&mut self, content: impl Into<Tendril>) -> NodeId {
    self.insert_node(NodeKind::text(content))
  }

  /// Moves `first` and every sibling that follows it under `parent`, before
  /// `before` or at the end.
  pub fn append(&mut self, parent: NodeId, first: NodeId, before: Option<NodeId>) -> Result<()> {
    let mut chain: SmallVec<[NodeId; 8]> = SmallVec::new();
    let mut current = Some(first);
    while let Some(node) = current {
      if Some(node) == before {
        return Err(TreeError::AnchorMismatch {
          parent,
          anchor: node,
        });
      }
      chain.push(node);
      current = self.next(node);
    }
    for node in chain {
      self.link(parent, node, before)?;
    }
    Ok(())
  }

  /// Moves a single node to the end of `parent`.
  pub fn push(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
    self.link(parent, node, None)
  }

  /// Moves a single node right after `reference`.
  pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
    let parent = self
      .parent(reference)
      .ok_or(TreeError::Detached(reference))?;
    let next = self.next(reference);
    self.link(parent, node, next)
  }

  /// Detaches `node` and keeps it alive for reinsertion.
  pub fn detach(&mut self, node: NodeId) -> Result<()> {
    self.unlink(node)
  }

  /// Detaches `node` and drops its whole subtree.
  pub fn cut(&mut self, node: NodeId) -> Result<()> {
    self.node_ref(node)?;
    self.unlink(node)?;
    self.free(node);
    Ok(())
  }

  /// Puts `new` in place of `old` and drops `old`.
  pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
    let parent = self.parent(old).ok_or(TreeError::Detached(old))?;
    self.link(parent, new, Some(old))?;
    self.cut(old)
  }

  /// Splices the children of `node` into its place and drops `node`.
  pub fn unwrap_node(&mut self, node: NodeId) -> Result<()> {
    let parent = self.parent(node).ok_or(TreeError::Detached(node))?;
    if let Some(first) = self.first(node) {
      self.append(parent, first, Some(node))?;
    }
    self.cut(node)
  }

  /// Moves the sibling range `first..=last` into `wrapper`, and puts
  /// `wrapper` where the range was.
  pub fn wrap(&mut self, first: NodeId, wrapper: NodeId, last: NodeId) -> Result<()> {
    let parent = self.parent(first).ok_or(TreeError::Detached(first))?;
    if self.parent(last) != Some(parent) {
      return Err(TreeError::AnchorMismatch {
        parent,
        anchor: last,
      });
    }

    let mut range: SmallVec<[NodeId; 8]> = SmallVec::new();
    let mut current = Some(first);
    while let Some(node) = current {
      range.push(node);
      if node == last {
        break;
      }
      current = self.next(node);
    }
    if range.last() != Some(&last) {
      return Err(TreeError::AnchorMismatch {
        parent,
        anchor: last,
      });
    }

    self.link(parent, wrapper, Some(first))?;
    for node in range {
      self.link(wrapper, node, None)?;
    }
    Ok(())
  }

  /// Splits the content of `node` at `offset`.
  ///
  /// Returns the direct child of `node` that now starts at `offset`, or
  /// `None` when `offset` is the end. Text and nested inline wrappers that
  /// straddle the offset are split in two.
  pub fn split_by_offset(&mut self, node: NodeId, offset: usize) -> Result<Option<NodeId>> {
    let len = self.len(node);
    if offset > len {
      return Err(TreeError::OffsetOutOfBounds { node, offset, len });
    }

    let children: SmallVec<[NodeId; 8]> = self.children(node).collect();
    let mut acc = 0;
    for child in children {
      if offset == acc {
        return Ok(Some(child));
      }
      let child_len = self.len(child);
      if offset < acc + child_len {
        let local = offset - acc;
        let tail = if self.is(child, NodeKind::is_text) {
          self.split_text(child, local)?
        } else {
          self.split_inline(node, child, local)?
        };
        return Ok(Some(tail));
      }
      acc += child_len;
    }
    Ok(None)
  }

  fn split_text(&mut self, text: NodeId, local: usize) -> Result<NodeId> {
    let right = match self.kind_mut(text)? {
      NodeKind::Text { content } => {
        let at = char_to_byte_idx(content, local);
        let right = Tendril::from(&content[at..]);
        content.truncate(at);
        right
      },
      other => {
        return Err(TreeError::UnsupportedAttribute {
          attribute: "content",
          kind:      other.type_name().to_string(),
        });
      },
    };
    let tail = self.create_text(right);
    self.insert_after(text, tail)?;
    Ok(tail)
  }

  fn split_inline(&mut self, parent: NodeId, child: NodeId, local: usize) -> Result<NodeId> {
    let Some(inner) = self.split_by_offset(child, local)? else {
      return Ok(child);
    };
    if self.first(child) == Some(inner) {
      return Ok(child);
    }
    let kind = self.node_ref(child)?.kind().shallow_clone();
    let clone = self.create(kind);
    self.link(parent, clone, self.next(child))?;
    self.append(clone, inner, None)?;
    Ok(clone)
  }

  /// Splits every node between `container` and `tail` so that `tail` and
  /// everything after it end up in a new sibling of `container`.
  pub fn split_by_tail(&mut self, container: NodeId, tail: NodeId) -> Result<NodeId> {
    if !self.is_ancestor(container, tail) {
      return Err(TreeError::NotADescendant {
        node:     tail,
        ancestor: container,
      });
    }

    let mut current = tail;
    loop {
      let parent = self.parent(current).ok_or(TreeError::Detached(current))?;
      if parent == container {
        let kind = self.node_ref(container)?.kind().shallow_clone();
        let clone = self.create(kind);
        self.insert_after(container, clone)?;
        self.append(clone, current, None)?;
        return Ok(clone);
      }

      if self.first(parent) == Some(current) {
        current = parent;
        continue;
      }
      let kind = self.node_ref(parent)?.kind().shallow_clone();
      let clone = self.create(kind);
      self.insert_after(parent, clone)?;
      self.append(clone, current, None)?;
      current = clone;
    }
  }

  /// Moves the content of `source` from `offset` to its end into the end of
  /// `dest`.
  pub fn move_tail(&mut self, source: NodeId, dest: NodeId, offset: usize) -> Result<()> {
    if let Some(tail) = self.split_by_offset(source, offset)? {
      self.append(dest, tail, None)?;
    }
    Ok(())
  }

  /// Merges `source` into `target`.
  ///
  /// Code lines decide for themselves through their combine hook; any other
  /// source has its content appended to the target container, then is
  /// removed together with ancestors it leaves empty.
  pub fn combine(&mut self, target: NodeId, source: NodeId) -> Result<()> {
    let source = self.first_container(source).unwrap_or(source);
    if self.is(source, NodeKind::is_code_line) {
      return handlers::on_combine(self, source, target);
    }

    let target = self.last_container(target).unwrap_or(target);
    if let Some(first) = self.first(source) {
      self.append(target, first, None)?;
    }
    self.cut_with_empty_ancestors(source)
  }

  /// Cuts `node`, then every ancestor that became empty, stopping at a
  /// section.
  pub fn cut_with_empty_ancestors(&mut self, node: NodeId) -> Result<()> {
    let mut parent = self.parent(node);
    self.cut(node)?;
    while let Some(id) = parent {
      if self.is(id, NodeKind::is_section) || self.first(id).is_some() {
        break;
      }
      parent = self.parent(id);
      self.cut(id)?;
    }
    Ok(())
  }

  /// Changes the kind of `node` in place, keeping its identity and children.
  pub fn convert(&mut self, node: NodeId, kind: NodeKind) -> Result<()> {
    if !kind.can_have_children() && self.first(node).is_some() {
      return Err(TreeError::NotAContainer {
        node,
        kind: kind.type_name().to_string(),
      });
    }
    *self.kind_mut(node)? = kind;
    Ok(())
  }

  pub fn set_attribute(&mut self, node: NodeId, attribute: Attribute) -> Result<()> {
    let kind = self.kind_mut(node)?;
    match (kind, attribute) {
      (NodeKind::Text { content }, Attribute::Content(value)) => *content = value,
      (NodeKind::CodeBlock { indent }, Attribute::Indent(value)) => *indent = value,
      (NodeKind::Markup { tag }, Attribute::Tag(value)) => *tag = value,
      (kind, attribute) => {
        return Err(TreeError::UnsupportedAttribute {
          attribute: attribute.name(),
          kind:      kind.type_name().to_string(),
        });
      },
    }
    Ok(())
  }

  /// Resolves a container offset to the leaf that holds it and the offset
  /// inside that leaf. An empty container resolves to itself.
  pub fn get_node_by_offset(&self, container: NodeId, offset: usize) -> Result<(NodeId, usize)> {
    let len = self.len(container);
    if offset > len {
      return Err(TreeError::OffsetOutOfBounds {
        node: container,
        offset,
        len,
      });
    }

    let mut node = container;
    let mut local = offset;
    'descend: loop {
      let mut acc = 0;
      let mut child = self.first(node);
      while let Some(id) = child {
        let child_len = self.len(id);
        let is_last = self.next(id).is_none();
        if local < acc + child_len || (is_last && local == acc + child_len) {
          node = id;
          local -= acc;
          continue 'descend;
        }
        acc += child_len;
        child = self.next(id);
      }
      return Ok((node, local));
    }
  }

  /// Inserts `text` at `offset` of `container`.
  pub fn insert_text(&mut self, container: NodeId, offset: usize, text: &str) -> Result<()> {
    if text.is_empty() {
      return Ok(());
    }
    let (leaf, local) = self.get_node_by_offset(container, offset)?;
    if let NodeKind::Text { content } = self.kind_mut(leaf)? {
      let at = char_to_byte_idx(content, local);
      content.insert_str(at, text);
      return Ok(());
    }

    let tail = self.split_by_offset(container, offset)?;
    let node = self.create_text(text);
    self.link(container, node, tail)
  }

  /// Removes the content of `container` between `from` and `to`.
  pub fn delete_text(&mut self, container: NodeId, from: usize, to: usize) -> Result<()> {
    if from >= to {
      return Ok(());
    }
    let (leaf, local) = self.get_node_by_offset(container, from)?;
    if let NodeKind::Text { content } = self.kind_mut(leaf)? {
      let count = content.chars().count();
      if local + (to - from) <= count {
        let start = char_to_byte_idx(content, local);
        let end = char_to_byte_idx(content, local + (to - from));
        content.replace_range(start..end, "");
        return Ok(());
      }
    }

    let end = self.split_by_offset(container, to)?;
    let mut current = self.split_by_offset(container, from)?;
    while let Some(node) = current {
      if Some(node) == end {
        break;
      }
      current = self.next(node);
      self.cut(node)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line_with(doc: &mut Document, parts: &[&str]) -> NodeId {
    let line = doc.create(NodeKind::CodeLine);
    let root = doc.root();
    doc.push(root, line).expect("push line");
    for part in parts {
      let text = doc.create_text(*part);
      doc.push(line, text).expect("push text");
    }
    line
  }

  #[test]
  fn append_moves_following_siblings() {
    let mut doc = Document::new();
    let a = line_with(&mut doc, &["a", "b", "c"]);
    let b = line_with(&mut doc, &[]);
    let second = doc.children(a).nth(1).expect("second");

    doc.append(b, second, None).expect("append");

    assert_eq!(doc.text_content(a), "a");
    assert_eq!(doc.text_content(b), "bc");
    assert_eq!(doc.validate(), Ok(()));
  }

  #[test]
  fn split_by_offset_splits_text() {
    let mut doc = Document::new();
    let line = line_with(&mut doc, &["hello"]);
    let tail = doc
      .split_by_offset(line, 2)
      .expect("split")
      .expect("tail");
    assert_eq!(doc.kind(tail).and_then(NodeKind::content), Some("llo"));
    assert_eq!(doc.children(line).count(), 2);
    assert_eq!(doc.split_by_offset(line, 5).expect("split at end"), None);
    assert!(doc.split_by_offset(line, 6).is_err());
  }

  #[test]
  fn split_by_offset_splits_nested_inline() {
    let mut doc = Document::new();
    let p = doc.create_block();
    let root = doc.root();
    doc.push(root, p).expect("push");
    let strong = doc.create(NodeKind::markup("strong"));
    doc.push(p, strong).expect("push strong");
    let text = doc.create_text("abcd");
    doc.push(strong, text).expect("push text");

    let tail = doc.split_by_offset(p, 1).expect("split").expect("tail");
    assert_ne!(tail, strong);
    assert_eq!(doc.kind(tail), Some(&NodeKind::markup("strong")));
    assert_eq!(doc.text_content(strong), "a");
    assert_eq!(doc.text_content(tail), "bcd");
    assert_eq!(doc.validate(), Ok(()));
  }

  #[test]
  fn move_tail_moves_content_after_offset() {
    let mut doc = Document::new();
    let a = line_with(&mut doc, &["foobar"]);
    let b = line_with(&mut doc, &[]);
    doc.move_tail(a, b, 3).expect("move tail");
    assert_eq!(doc.text_content(a), "foo");
    assert_eq!(doc.text_content(b), "bar");
  }

  #[test]
  fn split_by_tail_creates_sibling() {
    let mut doc = Document::new();
    let line = line_with(&mut doc, &["a", "b"]);
    let second = doc.last(line).expect("last");
    let tail = doc.split_by_tail(line, second).expect("split by tail");
    assert_eq!(doc.next(line), Some(tail));
    assert_eq!(doc.kind(tail), Some(&NodeKind::CodeLine));
    assert_eq!(doc.text_content(line), "a");
    assert_eq!(doc.text_content(tail), "b");
  }

  #[test]
  fn wrap_moves_range_into_wrapper() {
    let mut doc = Document::new();
    let line = line_with(&mut doc, &["a", "b", "c"]);
    let b = doc.children(line).nth(1).expect("b");
    let wrapper = doc.create(NodeKind::InlineCode);
    doc.wrap(b, wrapper, b).expect("wrap");
    assert_eq!(doc.children(line).nth(1), Some(wrapper));
    assert_eq!(doc.text_content(wrapper), "b");
    assert_eq!(doc.validate(), Ok(()));
  }

  #[test]
  fn insert_and_delete_text() {
    let mut doc = Document::new();
    let line = line_with(&mut doc, &["ab", "cd"]);
    doc.insert_text(line, 0, "  ").expect("insert");
    assert_eq!(doc.text_content(line), "  abcd");
    doc.delete_text(line, 0, 2).expect("delete");
    assert_eq!(doc.text_content(line), "abcd");
    doc.delete_text(line, 1, 3).expect("delete across nodes");
    assert_eq!(doc.text_content(line), "ad");

    let empty = line_with(&mut doc, &[]);
    doc.insert_text(empty, 0, "x").expect("insert into empty");
    assert_eq!(doc.text_content(empty), "x");
    assert_eq!(doc.validate(), Ok(()));
  }

  #[test]
  fn get_node_by_offset_prefers_leaf() {
    let mut doc = Document::new();
    let line = line_with(&mut doc, &["ab", "cd"]);
    let first = doc.first(line).expect("first");
    let last = doc.last(line).expect("last");
    assert_eq!(doc.get_node_by_offset(line, 1), Ok((first, 1)));
    assert_eq!(doc.get_node_by_offset(line, 2), Ok((last, 0)));
    assert_eq!(doc.get_node_by_offset(line, 4), Ok((last, 2)));
  }

  #[test]
  fn set_attribute_checks_kind() {
    let mut doc = Document::new();
    let text = doc.create_text("x");
    doc
      .set_attribute(text, Attribute::Content("y".into()))
      .expect("content");
    assert_eq!(doc.text_content(text), "y");
    let err = doc
      .set_attribute(text, Attribute::Indent(IndentConfig::default()))
      .expect_err("text has no indent");
    assert!(matches!(err, TreeError::UnsupportedAttribute { .. }));
  }

  #[test]
  fn combine_merges_generic_containers() {
    let mut doc = Document::new();
    let root = doc.root();
    let a = doc.create_block();
    let b = doc.create_block();
    doc.push(root, a).expect("push a");
    doc.push(root, b).expect("push b");
    let text_a = doc.create_text("foo");
    let text_b = doc.create_text("bar");
    doc.push(a, text_a).expect("push");
    doc.push(b, text_b).expect("push");

    doc.combine(a, b).expect("combine");

    assert!(!doc.contains(b));
    assert_eq!(doc.text_content(a), "foobar");
    assert_eq!(doc.validate(), Ok(()));
  }
}
