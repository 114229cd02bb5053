//! JSON form of the document.
//!
//! Every node is `{"type": ..}`; text adds `content`, nodes that hold
//! children add `body` (empty when they have none). Code blocks carry no
//! indent on the wire; the configuration passed to [`parse_json`] supplies
//! it.

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::{
  indent::IndentConfig,
  node::{
    CODE_BLOCK,
    CODE_INLINE,
    CODE_LINE,
    NodeId,
    NodeKind,
  },
  tree::{
    Document,
    TreeError,
  },
};

pub type Result<T> = std::result::Result<T, SerializeError>;

#[derive(Debug, Error)]
pub enum SerializeError {
  #[error(transparent)]
  Json(#[from] serde_json::Error),
  #[error(transparent)]
  Tree(#[from] TreeError),
  #[error("`{0}` cannot be created from json")]
  UnsupportedType(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonNode {
  #[serde(rename = "type")]
  pub kind:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub body:    Option<Vec<JsonNode>>,
}

impl JsonNode {
  pub fn new(kind: impl Into<String>) -> Self {
    Self {
      kind:    kind.into(),
      content: None,
      body:    None,
    }
  }

  pub fn text(content: impl Into<String>) -> Self {
    Self {
      content: Some(content.into()),
      ..Self::new("text")
    }
  }

  pub fn with_body(mut self, body: Vec<JsonNode>) -> Self {
    self.body = Some(body);
    self
  }
}

/// JSON tree of `node` and its subtree.
pub fn json(doc: &Document, node: NodeId) -> Result<JsonNode> {
  let kind = doc.kind(node).ok_or(TreeError::UnknownNode(node))?;
  let mut out = JsonNode::new(kind.type_name());
  if let Some(content) = kind.content() {
    out.content = Some(content.to_owned());
  }
  if kind.can_have_children() {
    let body = doc
      .children(node)
      .map(|child| json(doc, child))
      .collect::<Result<Vec<_>>>()?;
    out.body = Some(body);
  }
  Ok(out)
}

pub fn to_string(doc: &Document, node: NodeId) -> Result<String> {
  Ok(serde_json::to_string(&json(doc, node)?)?)
}

fn kind_from_json(value: &JsonNode, config: IndentConfig) -> Result<NodeKind> {
  let kind = match value.kind.as_str() {
    "text" => NodeKind::text(value.content.as_deref().unwrap_or_default()),
    "breakLine" => NodeKind::BreakLine,
    "paragraph" => NodeKind::Paragraph,
    CODE_INLINE => NodeKind::InlineCode,
    CODE_BLOCK => NodeKind::code_block(config),
    CODE_LINE => NodeKind::CodeLine,
    "root" | "" => return Err(SerializeError::UnsupportedType(value.kind.clone())),
    tag => NodeKind::markup(tag),
  };
  Ok(kind)
}

/// Builds a detached subtree from its JSON form. New code blocks get
/// `config` as their indent.
pub fn parse_json(doc: &mut Document, value: &JsonNode, config: IndentConfig) -> Result<NodeId> {
  let kind = kind_from_json(value, config)?;
  let leaf = !kind.can_have_children();
  let node = doc.create(kind);
  if leaf {
    return Ok(node);
  }
  for child in value.body.iter().flatten() {
    let child = parse_json(doc, child, config)?;
    doc.push(node, child)?;
  }
  Ok(node)
}

pub fn parse_json_str(doc: &mut Document, input: &str, config: IndentConfig) -> Result<NodeId> {
  let value: JsonNode = serde_json::from_str(input)?;
  parse_json(doc, &value, config)
}
