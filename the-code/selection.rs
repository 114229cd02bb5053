//! Cursor and selection positions over containers.
//!
//! A [`Position`] addresses an offset inside a container's flattened content
//! (text chars, one unit per line break). A [`Selection`] is an `anchor` and
//! a `focus`; when both are equal it is a plain cursor.
//!
//! ```text
//! anchor=(line1, 2), focus=(line2, 1):   "ab[c"
//!                                         "d]ef"
//! ```

use smallvec::SmallVec;

use crate::{
  node::NodeId,
  tree::Document,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
  pub node:   NodeId,
  pub offset: usize,
}

impl Position {
  pub const fn new(node: NodeId, offset: usize) -> Self {
    Self { node, offset }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
  pub anchor: Position,
  pub focus:  Position,
}

impl Selection {
  pub const fn new(anchor: Position, focus: Position) -> Self {
    Self { anchor, focus }
  }

  /// A collapsed selection (cursor) at `offset` of `node`.
  pub const fn point(node: NodeId, offset: usize) -> Self {
    let position = Position::new(node, offset);
    Self {
      anchor: position,
      focus:  position,
    }
  }

  /// Cursor at the first position of the first container inside `node`.
  pub fn at_start(doc: &Document, node: NodeId) -> Self {
    let container = doc.first_container(node).unwrap_or(node);
    Self::point(container, 0)
  }

  /// Cursor at the last position of the last container inside `node`.
  pub fn at_end(doc: &Document, node: NodeId) -> Self {
    let container = doc.last_container(node).unwrap_or(node);
    Self::point(container, doc.len(container))
  }

  pub fn is_range(&self) -> bool {
    self.anchor != self.focus
  }

  pub fn is_collapsed(&self) -> bool {
    !self.is_range()
  }

  /// `(start, end)` in document order.
  pub fn ordered(&self, doc: &Document) -> (Position, Position) {
    if self.anchor.node == self.focus.node {
      return if self.anchor.offset <= self.focus.offset {
        (self.anchor, self.focus)
      } else {
        (self.focus, self.anchor)
      };
    }

    let containers = doc.containers();
    let index = |node: NodeId| containers.iter().position(|id| *id == node);
    match (index(self.anchor.node), index(self.focus.node)) {
      (Some(anchor), Some(focus)) if focus < anchor => (self.focus, self.anchor),
      _ => (self.anchor, self.focus),
    }
  }

  /// Every container touched by the selection, in document order.
  pub fn containers(&self, doc: &Document) -> SmallVec<[NodeId; 4]> {
    let (start, end) = self.ordered(doc);
    if start.node == end.node {
      return SmallVec::from_slice(&[start.node]);
    }

    let mut out = SmallVec::new();
    let mut inside = false;
    for container in doc.containers() {
      if container == start.node {
        inside = true;
      }
      if inside {
        out.push(container);
      }
      if container == end.node {
        break;
      }
    }
    if out.is_empty() {
      out.push(start.node);
    }
    out
  }

  /// Applies `f` to both ends.
  pub fn map(self, mut f: impl FnMut(Position) -> Position) -> Self {
    Self {
      anchor: f(self.anchor),
      focus:  f(self.focus),
    }
  }

  /// Clamps both offsets to the current length of their containers.
  pub fn clamped(self, doc: &Document) -> Self {
    self.map(|position| Position::new(position.node, position.offset.min(doc.len(position.node))))
  }
}
