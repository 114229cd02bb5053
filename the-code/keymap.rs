//! Key events and the code line keymap.
//!
//! Shortcut names use the host notation: modifiers and key joined with `+`,
//! e.g. `ctrl+]`, `shift+enter`, `meta+left`. `cmd` is accepted as an alias
//! for `meta`.

use std::{
  collections::HashMap,
  fmt,
  str::FromStr,
};

use serde::{
  Deserialize,
  Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
  bits: u8,
}

impl Modifiers {
  pub const CTRL: u8 = 0b0000_0001;
  pub const ALT: u8 = 0b0000_0010;
  pub const SHIFT: u8 = 0b0000_0100;
  pub const META: u8 = 0b0000_1000;

  #[must_use]
  pub const fn empty() -> Self {
    Self { bits: 0 }
  }

  #[must_use]
  pub const fn from_bits(bits: u8) -> Self {
    Self { bits }
  }

  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.bits == 0
  }

  #[must_use]
  pub const fn ctrl(self) -> bool {
    (self.bits & Self::CTRL) != 0
  }

  #[must_use]
  pub const fn alt(self) -> bool {
    (self.bits & Self::ALT) != 0
  }

  #[must_use]
  pub const fn shift(self) -> bool {
    (self.bits & Self::SHIFT) != 0
  }

  #[must_use]
  pub const fn meta(self) -> bool {
    (self.bits & Self::META) != 0
  }

  pub fn insert(&mut self, bits: u8) {
    self.bits |= bits;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
  Char(char),
  Enter,
  Escape,
  Backspace,
  Tab,
  Delete,
  Home,
  End,
  Left,
  Right,
  Up,
  Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
  pub key:       Key,
  pub modifiers: Modifiers,
}

impl KeyEvent {
  pub const fn new(key: Key, modifiers: Modifiers) -> Self {
    Self { key, modifiers }
  }

  pub const fn plain(key: Key) -> Self {
    Self::new(key, Modifiers::empty())
  }
}

/// Whether a handler acted. `Handled` suppresses the host's default
/// behavior for the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOutcome {
  #[default]
  Continue,
  Handled,
}

impl KeyOutcome {
  pub const fn is_handled(self) -> bool {
    matches!(self, Self::Handled)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
  pub code:      Key,
  pub modifiers: Modifiers,
}

impl KeyBinding {
  pub const fn new(code: Key) -> Self {
    Self {
      code,
      modifiers: Modifiers::empty(),
    }
  }

  pub const fn with_modifiers(mut self, bits: u8) -> Self {
    self.modifiers = Modifiers::from_bits(bits);
    self
  }

  pub const fn from_key_event(event: &KeyEvent) -> Self {
    Self {
      code:      event.key,
      modifiers: event.modifiers,
    }
  }

  #[must_use]
  pub const fn to_key_event(&self) -> KeyEvent {
    KeyEvent::new(self.code, self.modifiers)
  }
}

impl fmt::Display for KeyBinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let modifiers = self.modifiers;
    if modifiers.ctrl() {
      f.write_str("ctrl+")?;
    }
    if modifiers.alt() {
      f.write_str("alt+")?;
    }
    if modifiers.shift() {
      f.write_str("shift+")?;
    }
    if modifiers.meta() {
      f.write_str("meta+")?;
    }

    match self.code {
      Key::Char(' ') => f.write_str("space"),
      Key::Char(c) => write!(f, "{c}"),
      Key::Enter => f.write_str("enter"),
      Key::Escape => f.write_str("esc"),
      Key::Backspace => f.write_str("backspace"),
      Key::Tab => f.write_str("tab"),
      Key::Delete => f.write_str("delete"),
      Key::Home => f.write_str("home"),
      Key::End => f.write_str("end"),
      Key::Left => f.write_str("left"),
      Key::Right => f.write_str("right"),
      Key::Up => f.write_str("up"),
      Key::Down => f.write_str("down"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyBindingError(pub String);

impl fmt::Display for ParseKeyBindingError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl std::error::Error for ParseKeyBindingError {}

impl FromStr for KeyBinding {
  type Err = ParseKeyBindingError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
      return Err(ParseKeyBindingError("empty key literal".into()));
    }

    // A trailing `+` is the key itself, as in `ctrl++`.
    let (modifiers, key_token) = match trimmed.strip_suffix("++") {
      Some(prefix) => (prefix, "+"),
      None if trimmed == "+" => ("", "+"),
      None => {
        match trimmed.rsplit_once('+') {
          Some((prefix, key)) => (prefix, key),
          None => ("", trimmed),
        }
      },
    };

    let mut bits = 0;
    for token in modifiers.split('+') {
      let modifier = token.trim();
      if modifier.is_empty() {
        continue;
      }
      let bit = match modifier.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Modifiers::CTRL,
        "alt" | "option" => Modifiers::ALT,
        "shift" => Modifiers::SHIFT,
        "meta" | "cmd" | "super" => Modifiers::META,
        invalid => {
          return Err(ParseKeyBindingError(format!(
            "invalid key modifier '{invalid}+'"
          )));
        },
      };
      if bits & bit != 0 {
        return Err(ParseKeyBindingError(format!(
          "repeated key modifier '{modifier}+'"
        )));
      }
      bits |= bit;
    }

    let code = parse_key_token(key_token.trim())?;
    Ok(KeyBinding::new(code).with_modifiers(bits))
  }
}

fn parse_key_token(token: &str) -> Result<Key, ParseKeyBindingError> {
  let mut chars = token.chars();
  if let (Some(c), None) = (chars.next(), chars.next()) {
    return Ok(Key::Char(c));
  }

  match token.to_ascii_lowercase().as_str() {
    "" => Err(ParseKeyBindingError("missing key token".into())),
    "space" => Ok(Key::Char(' ')),
    "enter" | "ret" | "return" => Ok(Key::Enter),
    "esc" | "escape" => Ok(Key::Escape),
    "backspace" | "bs" => Ok(Key::Backspace),
    "tab" => Ok(Key::Tab),
    "delete" | "del" => Ok(Key::Delete),
    "home" => Ok(Key::Home),
    "end" => Ok(Key::End),
    "left" => Ok(Key::Left),
    "right" => Ok(Key::Right),
    "up" => Ok(Key::Up),
    "down" => Ok(Key::Down),
    invalid => Err(ParseKeyBindingError(format!("unknown key '{invalid}'"))),
  }
}

/// Commands a code line reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCommand {
  MoveUp,
  MoveDown,
  Enter,
  ExitBlock,
  Tab,
  Indent,
  Unindent,
  Home,
  Backspace,
  Delete,
}

impl LineCommand {
  pub const fn name(self) -> &'static str {
    match self {
      Self::MoveUp => "move_up",
      Self::MoveDown => "move_down",
      Self::Enter => "enter",
      Self::ExitBlock => "exit_block",
      Self::Tab => "tab",
      Self::Indent => "indent",
      Self::Unindent => "unindent",
      Self::Home => "home",
      Self::Backspace => "backspace",
      Self::Delete => "delete",
    }
  }
}

impl fmt::Display for LineCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

const DEFAULT_BINDINGS: &[(&str, LineCommand)] = &[
  ("up", LineCommand::MoveUp),
  ("down", LineCommand::MoveDown),
  ("enter", LineCommand::Enter),
  ("shift+enter", LineCommand::ExitBlock),
  ("tab", LineCommand::Tab),
  ("ctrl+]", LineCommand::Indent),
  ("meta+]", LineCommand::Indent),
  ("ctrl+[", LineCommand::Unindent),
  ("meta+[", LineCommand::Unindent),
  ("shift+tab", LineCommand::Unindent),
  ("home", LineCommand::Home),
  ("meta+left", LineCommand::Home),
  ("backspace", LineCommand::Backspace),
  ("delete", LineCommand::Delete),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
  bindings: HashMap<KeyBinding, LineCommand>,
}

impl Keymap {
  pub fn empty() -> Self {
    Self {
      bindings: HashMap::new(),
    }
  }

  pub fn bind(&mut self, binding: KeyBinding, command: LineCommand) -> Option<LineCommand> {
    self.bindings.insert(binding, command)
  }

  /// Binds a shortcut given by name.
  pub fn bind_str(
    &mut self,
    literal: &str,
    command: LineCommand,
  ) -> Result<Option<LineCommand>, ParseKeyBindingError> {
    let binding = KeyBinding::from_str(literal)?;
    Ok(self.bind(binding, command))
  }

  pub fn unbind(&mut self, binding: &KeyBinding) -> Option<LineCommand> {
    self.bindings.remove(binding)
  }

  pub fn get(&self, event: &KeyEvent) -> Option<LineCommand> {
    self
      .bindings
      .get(&KeyBinding::from_key_event(event))
      .copied()
  }

  pub fn len(&self) -> usize {
    self.bindings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&KeyBinding, &LineCommand)> {
    self.bindings.iter()
  }
}

impl Default for Keymap {
  fn default() -> Self {
    let mut keymap = Self::empty();
    for (literal, command) in DEFAULT_BINDINGS {
      match KeyBinding::from_str(literal) {
        Ok(binding) => {
          keymap.bind(binding, *command);
        },
        Err(err) => tracing::warn!(%err, literal, "skipping default binding"),
      }
    }
    keymap
  }
}
