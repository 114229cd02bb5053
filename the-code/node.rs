//! Node kinds of the document tree.
//!
//! Every node carries a [`NodeKind`] discriminator. Behavior that a class
//! hierarchy would put on subclasses (container/widget/inline-widget
//! predicates, type names) is a `match` over the kind.

use crate::{
  Tendril,
  indent::IndentConfig,
};

slotmap::new_key_type! {
  /// Stable handle of a node inside a [`crate::tree::Document`].
  pub struct NodeId;
}

pub const CODE_INLINE: &str = "code-inline";
pub const CODE_BLOCK: &str = "code-block";
pub const CODE_LINE: &str = "code-line";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
  /// Top-level section holding blocks.
  Root,
  /// Generic block container, what a host creates for a plain line of text.
  Paragraph,
  Text {
    content: Tendril,
  },
  BreakLine,
  /// Generic inline wrapper (`strong`, `em`, ...).
  Markup {
    tag: Tendril,
  },
  InlineCode,
  CodeBlock {
    indent: IndentConfig,
  },
  CodeLine,
}

impl NodeKind {
  pub fn text(content: impl Into<Tendril>) -> Self {
    Self::Text {
      content: content.into(),
    }
  }

  pub fn markup(tag: impl Into<Tendril>) -> Self {
    Self::Markup { tag: tag.into() }
  }

  pub fn code_block(indent: IndentConfig) -> Self {
    Self::CodeBlock { indent }
  }

  pub fn type_name(&self) -> &str {
    match self {
      Self::Root => "root",
      Self::Paragraph => "paragraph",
      Self::Text { .. } => "text",
      Self::BreakLine => "breakLine",
      Self::Markup { tag } => tag.as_str(),
      Self::InlineCode => CODE_INLINE,
      Self::CodeBlock { .. } => CODE_BLOCK,
      Self::CodeLine => CODE_LINE,
    }
  }

  pub fn is_section(&self) -> bool {
    matches!(self, Self::Root)
  }

  pub fn is_container(&self) -> bool {
    matches!(self, Self::Paragraph | Self::CodeLine)
  }

  pub fn is_widget(&self) -> bool {
    matches!(self, Self::CodeBlock { .. })
  }

  pub fn is_inline_widget(&self) -> bool {
    matches!(self, Self::InlineCode | Self::Markup { .. })
  }

  pub fn is_text(&self) -> bool {
    matches!(self, Self::Text { .. })
  }

  pub fn is_break_line(&self) -> bool {
    matches!(self, Self::BreakLine)
  }

  pub fn is_inline_code(&self) -> bool {
    matches!(self, Self::InlineCode)
  }

  pub fn is_code_block(&self) -> bool {
    matches!(self, Self::CodeBlock { .. })
  }

  pub fn is_code_line(&self) -> bool {
    matches!(self, Self::CodeLine)
  }

  /// Whether the kind may own child nodes.
  pub fn can_have_children(&self) -> bool {
    !matches!(self, Self::Text { .. } | Self::BreakLine)
  }

  /// Generic text handling must not trim whitespace inside code lines.
  pub fn trim_whitespace(&self) -> bool {
    !self.is_code_line()
  }

  /// A childless copy of this kind, used when a node is split in two.
  pub fn shallow_clone(&self) -> Self {
    match self {
      Self::Text { .. } => Self::text(""),
      other => other.clone(),
    }
  }

  pub fn content(&self) -> Option<&str> {
    match self {
      Self::Text { content } => Some(content.as_str()),
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Node {
  pub(crate) kind:     NodeKind,
  pub(crate) parent:   Option<NodeId>,
  pub(crate) first:    Option<NodeId>,
  pub(crate) last:     Option<NodeId>,
  pub(crate) previous: Option<NodeId>,
  pub(crate) next:     Option<NodeId>,
}

impl Node {
  pub fn new(kind: NodeKind) -> Self {
    Self {
      kind,
      parent: None,
      first: None,
      last: None,
      previous: None,
      next: None,
    }
  }

  pub fn kind(&self) -> &NodeKind {
    &self.kind
  }
}
