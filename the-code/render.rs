//! Virtual tree rendering, virtual tree parsing and HTML stringification.
//!
//! | Node | Virtual type | HTML |
//! |------|--------------|------|
//! | inline code | `code` | `<code>..</code>` |
//! | code line | `code` | `<code>..</code>` |
//! | code block | `pre` | `<pre>..</pre>\n` |
//! | paragraph | `p` | `<p>..</p>\n` |
//! | line break | `br` | `<br />` |
//! | markup | its tag | `<tag>..</tag>` |
//!
//! Parsing maps `pre` to a code block and `code` to inline code; inline code
//! directly inside a block becomes a line once the document is normalized.

use std::collections::BTreeMap;

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
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

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VirtualNode {
  #[serde(rename = "type")]
  pub kind:       String,
  #[serde(default)]
  pub attributes: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content:    Option<String>,
  #[serde(default)]
  pub body:       Vec<VirtualNode>,
}

impl VirtualNode {
  pub fn element(kind: impl Into<String>, body: Vec<VirtualNode>) -> Self {
    Self {
      kind: kind.into(),
      body,
      ..Self::default()
    }
  }

  pub fn text(content: impl Into<String>) -> Self {
    Self {
      kind: "text".into(),
      content: Some(content.into()),
      ..Self::default()
    }
  }
}

fn tag_of(kind: &NodeKind) -> &str {
  match kind {
    NodeKind::Root => "section",
    NodeKind::Paragraph => "p",
    NodeKind::Text { .. } => "text",
    NodeKind::BreakLine => "br",
    NodeKind::Markup { tag } => tag.as_str(),
    NodeKind::InlineCode | NodeKind::CodeLine => "code",
    NodeKind::CodeBlock { .. } => "pre",
  }
}

pub fn render(doc: &Document, node: NodeId) -> Result<VirtualNode> {
  let kind = doc.kind(node).ok_or(TreeError::UnknownNode(node))?;
  if let NodeKind::Text { content } = kind {
    return Ok(VirtualNode::text(content.as_str()));
  }
  let body = doc
    .children(node)
    .map(|child| render(doc, child))
    .collect::<Result<Vec<_>>>()?;
  Ok(VirtualNode::element(tag_of(kind), body))
}

/// Builds a detached subtree from a virtual tree.
pub fn parse_tree(doc: &mut Document, element: &VirtualNode, config: IndentConfig) -> Result<NodeId> {
  let kind = match element.kind.as_str() {
    "pre" => NodeKind::code_block(config),
    "code" => NodeKind::InlineCode,
    "text" => NodeKind::text(element.content.as_deref().unwrap_or_default()),
    "br" => NodeKind::BreakLine,
    "p" | "div" | "section" => NodeKind::Paragraph,
    tag => NodeKind::markup(tag),
  };
  let leaf = !kind.can_have_children();
  let node = doc.create(kind);
  if leaf {
    return Ok(node);
  }
  for child in &element.body {
    let child = parse_tree(doc, child, config)?;
    doc.push(node, child)?;
  }
  Ok(node)
}

fn escape(text: &str, out: &mut String) {
  for ch in text.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      ch => out.push(ch),
    }
  }
}

/// HTML of `node` and its subtree.
pub fn stringify(doc: &Document, node: NodeId) -> Result<String> {
  let mut out = String::new();
  write_node(doc, node, &mut out)?;
  Ok(out)
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) -> Result<()> {
  let kind = doc.kind(node).ok_or(TreeError::UnknownNode(node))?;
  let (tag, trailer) = match kind {
    NodeKind::Text { content } => {
      escape(content, out);
      return Ok(());
    },
    NodeKind::BreakLine => {
      out.push_str("<br />");
      return Ok(());
    },
    NodeKind::Root => {
      for child in doc.children(node) {
        write_node(doc, child, out)?;
      }
      return Ok(());
    },
    NodeKind::Paragraph | NodeKind::CodeBlock { .. } => (tag_of(kind), "\n"),
    _ => (tag_of(kind), ""),
  };

  out.push('<');
  out.push_str(tag);
  out.push('>');
  for child in doc.children(node) {
    write_node(doc, child, out)?;
  }
  out.push_str("</");
  out.push_str(tag);
  out.push('>');
  out.push_str(trailer);
  Ok(())
}
