//! The code plugin: configuration, keymap and every code operation behind
//! one value the host holds on to.

use crate::{
  autocomplete,
  builder::Split,
  commands::{
    self,
    Control,
  },
  config::{
    self,
    CodeConfig,
  },
  handlers::{
    self,
    Context,
  },
  indent::IndentConfig,
  keymap::{
    KeyEvent,
    KeyOutcome,
    Keymap,
  },
  node::{
    CODE_BLOCK,
    CODE_INLINE,
    CODE_LINE,
    NodeId,
  },
  normalize,
  render::{
    self,
    VirtualNode,
  },
  selection::Selection,
  serialize::{
    self,
    JsonNode,
  },
  tree::{
    self,
    Document,
  },
};

#[derive(Debug, Clone)]
pub struct CodePlugin {
  config: CodeConfig,
  keymap: Keymap,
}

impl Default for CodePlugin {
  fn default() -> Self {
    Self {
      config: CodeConfig::default(),
      keymap: Keymap::default(),
    }
  }
}

impl CodePlugin {
  pub fn new(config: CodeConfig) -> config::Result<Self> {
    config.validate()?;
    let keymap = config.keymap()?;
    Ok(Self { config, keymap })
  }

  /// Node types this plugin owns.
  pub const fn register() -> [&'static str; 3] {
    [CODE_INLINE, CODE_BLOCK, CODE_LINE]
  }

  pub fn config(&self) -> &CodeConfig {
    &self.config
  }

  pub fn indent(&self) -> IndentConfig {
    self.config.indent
  }

  pub fn keymap(&self) -> &Keymap {
    &self.keymap
  }

  pub fn normalize(&self, doc: &mut Document, node: NodeId) -> normalize::Result<Option<NodeId>> {
    normalize::normalize(doc, node)
  }

  pub fn normalize_all(&self, doc: &mut Document, from: NodeId) -> normalize::Result<usize> {
    normalize::normalize_all(doc, from)
  }

  /// Dispatches a key press on the code line under the anchor. When a
  /// handler acted the document is normalized before returning.
  pub fn handle_key(
    &self,
    doc: &mut Document,
    selection: Selection,
    event: &KeyEvent,
  ) -> normalize::Result<(KeyOutcome, Selection)> {
    let mut ctx = Context::new(doc, selection);
    let outcome = handlers::handle_key(&mut ctx, &self.keymap, event)?;
    let selection = ctx.selection;
    if outcome.is_handled() {
      normalize::normalize_document(doc)?;
    }
    Ok((outcome, selection.clamped(doc)))
  }

  /// Runs backtick autocompletion at the cursor, normalizing on conversion.
  pub fn autocomplete(&self, doc: &mut Document, selection: Selection) -> normalize::Result<Option<Selection>> {
    let Some(selection) = autocomplete::autocomplete(doc, selection, self.config.indent)? else {
      return Ok(None);
    };
    normalize::normalize_document(doc)?;
    Ok(Some(selection.clamped(doc)))
  }

  pub fn json(&self, doc: &Document, node: NodeId) -> serialize::Result<JsonNode> {
    serialize::json(doc, node)
  }

  pub fn parse_json(&self, doc: &mut Document, value: &JsonNode) -> serialize::Result<NodeId> {
    serialize::parse_json(doc, value, self.config.indent)
  }

  pub fn render(&self, doc: &Document, node: NodeId) -> tree::Result<VirtualNode> {
    render::render(doc, node)
  }

  pub fn parse_tree(&self, doc: &mut Document, element: &VirtualNode) -> tree::Result<NodeId> {
    render::parse_tree(doc, element, self.config.indent)
  }

  pub fn stringify(&self, doc: &Document, node: NodeId) -> tree::Result<String> {
    render::stringify(doc, node)
  }

  pub fn create_code_inline(&self, doc: &mut Document, items: &[NodeId]) -> tree::Result<usize> {
    commands::create_code_inline(doc, items)
  }

  pub fn remove_code(&self, doc: &mut Document, items: &[NodeId]) -> tree::Result<usize> {
    commands::remove_code(doc, items)
  }

  pub fn create_code_block(&self, doc: &mut Document, container: NodeId) -> tree::Result<Option<NodeId>> {
    commands::create_code_block(doc, container, self.config.indent)
  }

  pub fn split_block(&self, doc: &mut Document, block: NodeId, next_line: NodeId) -> tree::Result<Split> {
    commands::split_block(doc, block, next_line)
  }

  pub fn selection_controls(&self, doc: &Document, focused: &[NodeId], is_range: bool) -> Vec<Control> {
    commands::selection_controls(doc, focused, is_range)
  }

  pub fn insert_controls(&self, doc: &Document, container: NodeId) -> Vec<Control> {
    commands::insert_controls(doc, container)
  }

  pub fn replace_controls(&self, doc: &Document, focused: &[NodeId]) -> Vec<Control> {
    commands::replace_controls(doc, focused)
  }
}
