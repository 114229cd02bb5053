//! Key handlers of a code line.
//!
//! Every handler takes the line under the anchor and a [`Context`], performs
//! a short sequence of builder primitives, updates the selection and reports
//! whether it acted. A precondition that does not hold is not an error: the
//! handler returns [`KeyOutcome::Continue`] and leaves the document alone.
//! Errors only surface when a primitive rejects its arguments.

use the_core::chars::{
  char_is_whitespace,
  leading_whitespace_len,
};

use crate::{
  indent::{
    self,
    detect_indent,
    unindent_len,
  },
  keymap::{
    KeyEvent,
    KeyOutcome,
    Keymap,
    LineCommand,
  },
  node::{
    NodeId,
    NodeKind,
  },
  selection::{
    Position,
    Selection,
  },
  tree::{
    Document,
    Result,
  },
};

pub struct Context<'a> {
  pub doc:       &'a mut Document,
  pub selection: Selection,
}

impl<'a> Context<'a> {
  pub fn new(doc: &'a mut Document, selection: Selection) -> Self {
    Self { doc, selection }
  }

  pub fn anchor_at_first_position_in_container(&self) -> bool {
    self.selection.anchor.offset == 0
  }

  pub fn anchor_at_last_position_in_container(&self) -> bool {
    self.selection.anchor.offset >= self.doc.len(self.selection.anchor.node)
  }

  pub fn set_selection(&mut self, selection: Selection) {
    self.selection = selection;
  }

  fn set_cursor(&mut self, node: NodeId, offset: usize) {
    self.selection = Selection::point(node, offset);
  }
}

/// Resolves the code line under the anchor and runs the bound command.
pub fn handle_key(ctx: &mut Context<'_>, keymap: &Keymap, event: &KeyEvent) -> Result<KeyOutcome> {
  let Some(command) = keymap.get(event) else {
    return Ok(KeyOutcome::Continue);
  };
  let anchor = ctx.selection.anchor.node;
  let Some(line) = ctx.doc.container_of(anchor) else {
    return Ok(KeyOutcome::Continue);
  };
  if !ctx.doc.is(line, NodeKind::is_code_line) {
    return Ok(KeyOutcome::Continue);
  }

  let outcome = run(ctx, line, command)?;
  tracing::debug!(%command, ?outcome, "code line key");
  Ok(outcome)
}

pub fn run(ctx: &mut Context<'_>, line: NodeId, command: LineCommand) -> Result<KeyOutcome> {
  match command {
    LineCommand::MoveUp => up(ctx, line),
    LineCommand::MoveDown => down(ctx, line),
    LineCommand::Enter => enter(ctx, line),
    LineCommand::ExitBlock => exit_block(ctx, line),
    LineCommand::Tab => tab(ctx, line),
    LineCommand::Indent => indent(ctx),
    LineCommand::Unindent => unindent(ctx),
    LineCommand::Home => home(ctx, line),
    LineCommand::Backspace => backspace(ctx, line),
    LineCommand::Delete => delete(ctx, line),
  }
}

/// Opens a paragraph above a block that starts a section.
pub fn up(ctx: &mut Context<'_>, line: NodeId) -> Result<KeyOutcome> {
  let Some((block, section)) = block_in_section(ctx, line) else {
    return Ok(KeyOutcome::Continue);
  };
  if ctx.doc.first(block) != Some(line) || ctx.doc.previous(block).is_some() {
    return Ok(KeyOutcome::Continue);
  }

  let paragraph = ctx.doc.create_block();
  ctx.doc.append(section, paragraph, Some(block))?;
  ctx.set_cursor(paragraph, 0);
  Ok(KeyOutcome::Handled)
}

/// Opens a paragraph below a block that ends a section.
pub fn down(ctx: &mut Context<'_>, line: NodeId) -> Result<KeyOutcome> {
  let Some((block, _)) = block_in_section(ctx, line) else {
    return Ok(KeyOutcome::Continue);
  };
  if ctx.doc.last(block) != Some(line) || ctx.doc.next(block).is_some() {
    return Ok(KeyOutcome::Continue);
  }

  let paragraph = ctx.doc.create_block();
  ctx.doc.insert_after(block, paragraph)?;
  ctx.set_cursor(paragraph, 0);
  Ok(KeyOutcome::Handled)
}

/// The block of `line` and the section holding it.
fn block_in_section(ctx: &Context<'_>, line: NodeId) -> Option<(NodeId, NodeId)> {
  let block = ctx.doc.parent(line)?;
  let section = ctx.doc.parent(block)?;
  ctx
    .doc
    .is(section, NodeKind::is_section)
    .then_some((block, section))
}

/// Removes a range that lies inside `line`, collapsing to its start.
fn delete_range_in_line(ctx: &mut Context<'_>, line: NodeId) -> Result<bool> {
  if !ctx.selection.is_range() {
    return Ok(true);
  }
  let (start, end) = ctx.selection.ordered(ctx.doc);
  if start.node != line || end.node != line {
    return Ok(false);
  }
  ctx.doc.delete_text(line, start.offset, end.offset)?;
  ctx.set_cursor(line, start.offset);
  Ok(true)
}

/// Splits the line at the cursor. The new line starts with the leading
/// whitespace found before the cursor.
pub fn enter(ctx: &mut Context<'_>, line: NodeId) -> Result<KeyOutcome> {
  if !delete_range_in_line(ctx, line)? {
    return Ok(KeyOutcome::Continue);
  }
  let offset = ctx.selection.anchor.offset.min(ctx.doc.len(line));
  let carried: String = ctx
    .doc
    .text_content(line)
    .chars()
    .take(offset)
    .take_while(|ch| char_is_whitespace(*ch))
    .collect();

  let new_line = ctx.doc.create(NodeKind::CodeLine);
  ctx.doc.insert_after(line, new_line)?;
  ctx.doc.move_tail(line, new_line, offset)?;
  ctx.doc.insert_text(new_line, 0, &carried)?;
  ctx.set_cursor(new_line, carried.chars().count());
  Ok(KeyOutcome::Handled)
}

/// Leaves the block from its last line: the tail of the line moves into a
/// new paragraph after the block. Anywhere else it behaves like enter.
pub fn exit_block(ctx: &mut Context<'_>, line: NodeId) -> Result<KeyOutcome> {
  let Some((block, _)) = block_in_section(ctx, line) else {
    return enter(ctx, line);
  };
  if ctx.doc.last(block) != Some(line) {
    return enter(ctx, line);
  }
  if !delete_range_in_line(ctx, line)? {
    return Ok(KeyOutcome::Continue);
  }

  let offset = ctx.selection.anchor.offset.min(ctx.doc.len(line));
  let paragraph = ctx.doc.create_block();
  ctx.doc.insert_after(block, paragraph)?;
  ctx.doc.move_tail(line, paragraph, offset)?;
  ctx.set_cursor(paragraph, 0);
  Ok(KeyOutcome::Handled)
}

/// Inserts one indent unit at the cursor, or indents every touched line when
/// the selection is a range.
pub fn tab(ctx: &mut Context<'_>, line: NodeId) -> Result<KeyOutcome> {
  if ctx.selection.is_range() {
    return indent(ctx);
  }
  let unit = detect_indent(ctx.doc, line);
  let offset = ctx.selection.anchor.offset.min(ctx.doc.len(line));
  ctx.doc.insert_text(line, offset, &unit)?;
  ctx.set_cursor(line, offset + unit.chars().count());
  Ok(KeyOutcome::Handled)
}

pub fn indent(ctx: &mut Context<'_>) -> Result<KeyOutcome> {
  let selection = indent::indent(ctx.doc, ctx.selection)?;
  ctx.set_selection(selection);
  Ok(KeyOutcome::Handled)
}

pub fn unindent(ctx: &mut Context<'_>) -> Result<KeyOutcome> {
  let selection = indent::unindent(ctx.doc, ctx.selection)?;
  ctx.set_selection(selection);
  Ok(KeyOutcome::Handled)
}

/// Toggles the cursor between the first non-whitespace column and column 0.
pub fn home(ctx: &mut Context<'_>, line: NodeId) -> Result<KeyOutcome> {
  let leading = leading_whitespace_len(&ctx.doc.text_content(line));
  if leading == 0 {
    return Ok(KeyOutcome::Continue);
  }
  let offset = ctx.selection.anchor.offset;
  let target = if offset == leading { 0 } else { leading };
  ctx.set_cursor(line, target);
  Ok(KeyOutcome::Handled)
}

pub fn backspace(ctx: &mut Context<'_>, line: NodeId) -> Result<KeyOutcome> {
  if ctx.selection.is_range() {
    return Ok(KeyOutcome::Continue);
  }

  if ctx.anchor_at_first_position_in_container() {
    return backspace_at_line_start(ctx, line);
  }

  let offset = ctx.selection.anchor.offset;
  let text = ctx.doc.text_content(line);
  if offset > leading_whitespace_len(&text) {
    return Ok(KeyOutcome::Continue);
  }
  let unit = detect_indent(ctx.doc, line);
  let unit_len = unit.chars().count().max(1);
  if offset % unit_len != 0 || unindent_len(&text, &unit) == 0 {
    return Ok(KeyOutcome::Continue);
  }
  tracing::debug!(offset, "backspace in indentation unindents");
  unindent(ctx)
}

fn backspace_at_line_start(ctx: &mut Context<'_>, line: NodeId) -> Result<KeyOutcome> {
  if let Some(previous) = ctx.doc.previous(line) {
    let join = ctx.doc.len(previous);
    if let Some(first) = ctx.doc.first(line) {
      ctx.doc.append(previous, first, None)?;
    }
    ctx.doc.cut(line)?;
    ctx.set_cursor(previous, join);
    return Ok(KeyOutcome::Handled);
  }

  if ctx.doc.next(line).is_some() {
    return Ok(KeyOutcome::Handled);
  }
  let Some(block) = ctx.doc.parent(line) else {
    return Ok(KeyOutcome::Handled);
  };

  if ctx.anchor_at_last_position_in_container() {
    let paragraph = ctx.doc.create_block();
    ctx.doc.replace(block, paragraph)?;
    ctx.set_cursor(paragraph, 0);
  } else if let Some(previous) = ctx.doc.previous(block) {
    let Position { node, offset } = Selection::at_end(ctx.doc, previous).anchor;
    ctx.set_cursor(node, offset);
  }
  Ok(KeyOutcome::Handled)
}

pub fn delete(ctx: &mut Context<'_>, line: NodeId) -> Result<KeyOutcome> {
  if ctx.selection.is_range() || !ctx.anchor_at_last_position_in_container() {
    return Ok(KeyOutcome::Continue);
  }

  if let Some(next) = ctx.doc.next(line) {
    ctx.doc.move_tail(next, line, 0)?;
    ctx.doc.cut(next)?;
    return Ok(KeyOutcome::Handled);
  }

  let Some(next) = ctx.doc.next_container(line) else {
    return Ok(KeyOutcome::Continue);
  };
  ctx.doc.combine(line, next)?;
  Ok(KeyOutcome::Handled)
}

/// Combine hook of a code line that is merged into `target`.
///
/// When the block before the line's block is a code block holding `target`,
/// the line moves into it. Otherwise the line's content joins `target` and
/// the line is dropped. A block left without lines is removed.
pub fn on_combine(doc: &mut Document, line: NodeId, target: NodeId) -> Result<()> {
  let block = doc.parent(line);
  let previous_block = block
    .and_then(|block| doc.previous(block))
    .filter(|previous| doc.is(*previous, NodeKind::is_code_block))
    .filter(|previous| doc.code_block_of(target) == Some(*previous));

  if let Some(previous_block) = previous_block {
    doc.detach(line)?;
    doc.push(previous_block, line)?;
  } else {
    let target = doc.last_container(target).unwrap_or(target);
    if let Some(first) = doc.first(line) {
      doc.append(target, first, None)?;
    }
    doc.cut(line)?;
  }

  if let Some(block) = block {
    if doc.is(block, NodeKind::is_code_block) && doc.first(block).is_none() {
      doc.cut(block)?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    indent::IndentConfig,
    keymap::{
      Key,
      Modifiers,
    },
  };

  fn code_block(doc: &mut Document, config: IndentConfig, texts: &[&str]) -> (NodeId, Vec<NodeId>) {
    let root = doc.root();
    let block = doc.create(NodeKind::code_block(config));
    doc.push(root, block).expect("push block");
    let lines = texts
      .iter()
      .map(|text| {
        let line = doc.create(NodeKind::CodeLine);
        doc.push(block, line).expect("push line");
        if !text.is_empty() {
          let text = doc.create_text(*text);
          doc.push(line, text).expect("push text");
        }
        line
      })
      .collect();
    (block, lines)
  }

  fn paragraph(doc: &mut Document, text: &str) -> NodeId {
    let root = doc.root();
    let paragraph = doc.create_block();
    doc.push(root, paragraph).expect("push paragraph");
    let text = doc.create_text(text);
    doc.push(paragraph, text).expect("push text");
    paragraph
  }

  fn texts(doc: &Document, block: NodeId) -> Vec<String> {
    doc.children(block).map(|line| doc.text_content(line)).collect()
  }

  fn press(doc: &mut Document, selection: Selection, event: KeyEvent) -> (KeyOutcome, Selection) {
    let keymap = Keymap::default();
    let mut ctx = Context::new(doc, selection);
    let outcome = handle_key(&mut ctx, &keymap, &event).expect("handle key");
    (outcome, ctx.selection)
  }

  fn key(key: Key) -> KeyEvent {
    KeyEvent::plain(key)
  }

  fn with(key: Key, bits: u8) -> KeyEvent {
    KeyEvent::new(key, Modifiers::from_bits(bits))
  }

  #[test]
  fn enter_splits_line() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["foobar"]);

    let (outcome, selection) = press(&mut doc, Selection::point(lines[0], 3), key(Key::Enter));

    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(texts(&doc, block), vec!["foo", "bar"]);
    let second = doc.last(block).unwrap();
    assert_eq!(selection, Selection::point(second, 0));
  }

  #[test]
  fn enter_carries_leading_whitespace() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["    if x {"]);

    let (_, selection) = press(&mut doc, Selection::point(lines[0], 10), key(Key::Enter));

    assert_eq!(texts(&doc, block), vec!["    if x {", "    "]);
    assert_eq!(selection.anchor.offset, 4);
  }

  #[test]
  fn enter_inside_indentation_carries_only_prefix() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["    x"]);

    press(&mut doc, Selection::point(lines[0], 2), key(Key::Enter));

    assert_eq!(texts(&doc, block), vec!["  ", "    x"]);
  }

  #[test]
  fn enter_replaces_range_in_line() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["abcdef"]);
    let selection = Selection::new(Position::new(lines[0], 4), Position::new(lines[0], 2));

    press(&mut doc, selection, key(Key::Enter));

    assert_eq!(texts(&doc, block), vec!["ab", "ef"]);
  }

  #[test]
  fn shift_enter_on_last_line_leaves_block() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["a", "bcd"]);

    let (outcome, selection) =
      press(&mut doc, Selection::point(lines[1], 1), with(Key::Enter, Modifiers::SHIFT));

    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(texts(&doc, block), vec!["a", "b"]);
    let paragraph = doc.next(block).unwrap();
    assert!(doc.is(paragraph, |kind| *kind == NodeKind::Paragraph));
    assert_eq!(doc.text_content(paragraph), "cd");
    assert_eq!(selection, Selection::point(paragraph, 0));
  }

  #[test]
  fn shift_enter_elsewhere_splits() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["ab", "c"]);

    press(&mut doc, Selection::point(lines[0], 1), with(Key::Enter, Modifiers::SHIFT));

    assert_eq!(texts(&doc, block), vec!["a", "b", "c"]);
  }

  #[test]
  fn up_from_first_line_opens_paragraph_above() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["a", "b"]);

    let (outcome, selection) = press(&mut doc, Selection::point(lines[0], 0), key(Key::Up));

    assert_eq!(outcome, KeyOutcome::Handled);
    let paragraph = doc.previous(block).unwrap();
    assert_eq!(doc.first(doc.root()), Some(paragraph));
    assert_eq!(selection, Selection::point(paragraph, 0));

    let (outcome, _) = press(&mut doc, Selection::point(lines[1], 0), key(Key::Up));
    assert_eq!(outcome, KeyOutcome::Continue);
  }

  #[test]
  fn up_from_first_line_after_another_block_continues() {
    let mut doc = Document::new();
    let before = paragraph(&mut doc, "intro");
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["a"]);
    let nodes = doc.node_count();

    let (outcome, selection) = press(&mut doc, Selection::point(lines[0], 0), key(Key::Up));

    assert_eq!(outcome, KeyOutcome::Continue);
    assert_eq!(selection, Selection::point(lines[0], 0));
    assert_eq!(doc.previous(block), Some(before));
    assert_eq!(doc.node_count(), nodes);
  }

  #[test]
  fn down_from_last_line_opens_paragraph_below() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["a"]);

    let (outcome, _) = press(&mut doc, Selection::point(lines[0], 1), key(Key::Down));
    assert_eq!(outcome, KeyOutcome::Handled);
    assert!(doc.next(block).is_some());

    let (outcome, _) = press(&mut doc, Selection::point(lines[0], 1), key(Key::Down));
    assert_eq!(outcome, KeyOutcome::Continue);
  }

  #[test]
  fn tab_inserts_unit_at_cursor() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::tabs(), &["ab"]);

    let (_, selection) = press(&mut doc, Selection::point(lines[0], 1), key(Key::Tab));

    assert_eq!(texts(&doc, block), vec!["a\tb"]);
    assert_eq!(selection, Selection::point(lines[0], 2));
  }

  #[test]
  fn tab_with_range_indents_lines() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::spaces(4), &["ab", "cd"]);
    let selection = Selection::new(Position::new(lines[0], 1), Position::new(lines[1], 2));

    let (_, selection) = press(&mut doc, selection, key(Key::Tab));

    assert_eq!(texts(&doc, block), vec!["    ab", "    cd"]);
    assert_eq!(selection.anchor, Position::new(lines[0], 5));
    assert_eq!(selection.focus, Position::new(lines[1], 6));
  }

  #[test]
  fn bracket_shortcuts_indent_and_unindent() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["x"]);
    let cursor = Selection::point(lines[0], 1);

    let (_, cursor) = press(&mut doc, cursor, with(Key::Char(']'), Modifiers::META));
    assert_eq!(texts(&doc, block), vec!["  x"]);
    assert_eq!(cursor.anchor.offset, 3);

    let (_, cursor) = press(&mut doc, cursor, with(Key::Char('['), Modifiers::CTRL));
    assert_eq!(texts(&doc, block), vec!["x"]);
    assert_eq!(cursor.anchor.offset, 1);
  }

  #[test]
  fn home_toggles_between_indent_and_column_zero() {
    let mut doc = Document::new();
    let (_, lines) = code_block(&mut doc, IndentConfig::default(), &["   x = 1", "y"]);

    let (outcome, selection) = press(&mut doc, Selection::point(lines[0], 6), key(Key::Home));
    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(selection.anchor.offset, 3);

    let (_, selection) = press(&mut doc, selection, key(Key::Home));
    assert_eq!(selection.anchor.offset, 0);

    let (_, selection) = press(&mut doc, selection, key(Key::Home));
    assert_eq!(selection.anchor.offset, 3);

    let (outcome, _) = press(&mut doc, Selection::point(lines[1], 1), key(Key::Home));
    assert_eq!(outcome, KeyOutcome::Continue);
  }

  #[test]
  fn backspace_at_line_start_merges_with_previous() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["abc", "def"]);

    let (outcome, selection) = press(&mut doc, Selection::point(lines[1], 0), key(Key::Backspace));

    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(texts(&doc, block), vec!["abcdef"]);
    assert_eq!(selection, Selection::point(lines[0], 3));
    assert!(!doc.contains(lines[1]));
  }

  #[test]
  fn backspace_at_start_of_first_of_several_lines_is_swallowed() {
    let mut doc = Document::new();
    let before = paragraph(&mut doc, "intro");
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["a", "b"]);
    let nodes = doc.node_count();

    let (outcome, selection) = press(&mut doc, Selection::point(lines[0], 0), key(Key::Backspace));

    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(selection, Selection::point(lines[0], 0));
    assert_eq!(texts(&doc, block), vec!["a", "b"]);
    assert_eq!(doc.previous(block), Some(before));
    assert_eq!(doc.text_content(before), "intro");
    assert_eq!(doc.node_count(), nodes);
  }

  #[test]
  fn backspace_in_empty_sole_line_converts_block() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &[""]);

    let (outcome, selection) = press(&mut doc, Selection::point(lines[0], 0), key(Key::Backspace));

    assert_eq!(outcome, KeyOutcome::Handled);
    assert!(!doc.contains(block));
    let paragraph = doc.first(doc.root()).unwrap();
    assert!(doc.is(paragraph, |kind| *kind == NodeKind::Paragraph));
    assert_eq!(selection, Selection::point(paragraph, 0));
  }

  #[test]
  fn backspace_in_sole_line_moves_to_previous_block() {
    let mut doc = Document::new();
    let before = paragraph(&mut doc, "intro");
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["code"]);

    let (outcome, selection) = press(&mut doc, Selection::point(lines[0], 0), key(Key::Backspace));

    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(selection, Selection::point(before, 5));
    assert_eq!(texts(&doc, block), vec!["code"]);
  }

  #[test]
  fn backspace_in_indentation_unindents() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["    x"]);

    let (outcome, selection) = press(&mut doc, Selection::point(lines[0], 4), key(Key::Backspace));
    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(texts(&doc, block), vec!["  x"]);
    assert_eq!(selection.anchor.offset, 2);

    let (outcome, _) = press(&mut doc, Selection::point(lines[0], 1), key(Key::Backspace));
    assert_eq!(outcome, KeyOutcome::Continue);

    let (outcome, _) = press(&mut doc, Selection::point(lines[0], 3), key(Key::Backspace));
    assert_eq!(outcome, KeyOutcome::Continue);
  }

  #[test]
  fn delete_at_line_end_pulls_next_line() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["ab", "cd"]);

    let (outcome, selection) = press(&mut doc, Selection::point(lines[0], 2), key(Key::Delete));

    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(texts(&doc, block), vec!["abcd"]);
    assert_eq!(selection, Selection::point(lines[0], 2));
  }

  #[test]
  fn delete_at_document_end_does_nothing() {
    let mut doc = Document::new();
    let (_, lines) = code_block(&mut doc, IndentConfig::default(), &["ab"]);
    let (outcome, _) = press(&mut doc, Selection::point(lines[0], 2), key(Key::Delete));
    assert_eq!(outcome, KeyOutcome::Continue);
  }

  #[test]
  fn delete_before_paragraph_combines_it() {
    let mut doc = Document::new();
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["ab"]);
    let after = paragraph(&mut doc, "cd");

    let (outcome, _) = press(&mut doc, Selection::point(lines[0], 2), key(Key::Delete));

    assert_eq!(outcome, KeyOutcome::Handled);
    assert_eq!(texts(&doc, block), vec!["abcd"]);
    assert!(!doc.contains(after));
  }

  #[test]
  fn delete_before_code_block_moves_its_line_over() {
    let mut doc = Document::new();
    let (first, lines) = code_block(&mut doc, IndentConfig::default(), &["ab"]);
    let (second, moved) = code_block(&mut doc, IndentConfig::default(), &["cd"]);

    press(&mut doc, Selection::point(lines[0], 2), key(Key::Delete));

    assert_eq!(texts(&doc, first), vec!["ab", "cd"]);
    assert_eq!(doc.parent(moved[0]), Some(first));
    assert!(!doc.contains(second));
  }

  #[test]
  fn on_combine_merges_into_paragraph() {
    let mut doc = Document::new();
    let before = paragraph(&mut doc, "ab");
    let (block, lines) = code_block(&mut doc, IndentConfig::default(), &["cd", "ef"]);

    on_combine(&mut doc, lines[0], before).expect("combine");

    assert_eq!(doc.text_content(before), "abcd");
    assert_eq!(texts(&doc, block), vec!["ef"]);
  }

  #[test]
  fn unbound_key_and_plain_container_continue() {
    let mut doc = Document::new();
    let (_, lines) = code_block(&mut doc, IndentConfig::default(), &["ab"]);
    let (outcome, _) = press(&mut doc, Selection::point(lines[0], 0), key(Key::End));
    assert_eq!(outcome, KeyOutcome::Continue);

    let plain = paragraph(&mut doc, "text");
    let (outcome, _) = press(&mut doc, Selection::point(plain, 0), key(Key::Enter));
    assert_eq!(outcome, KeyOutcome::Continue);
  }

  quickcheck::quickcheck! {
    fn enter_then_backspace_restores_line(body: String, split: usize) -> bool {
      let content: String = std::iter::once('x')
        .chain(body.chars().filter(|ch| !matches!(ch, '\n' | '\r')))
        .collect();
      let k = split % (content.chars().count() + 1);

      let mut doc = Document::new();
      let (block, lines) = code_block(&mut doc, IndentConfig::default(), &[content.as_str()]);
      let (_, cursor) = press(&mut doc, Selection::point(lines[0], k), key(Key::Enter));
      let (_, cursor) = press(&mut doc, cursor, key(Key::Backspace));

      texts(&doc, block) == vec![content] && cursor == Selection::point(lines[0], k)
    }
  }
}
