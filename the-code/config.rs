use std::collections::BTreeMap;

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::{
  indent::{
    IndentConfig,
    IndentUnit,
  },
  keymap::{
    Keymap,
    LineCommand,
    ParseKeyBindingError,
  },
};

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("invalid toml config: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("invalid json config: {0}")]
  Json(#[from] serde_json::Error),
  #[error("space indent size must be positive")]
  ZeroIndentSize,
  #[error("invalid key binding: {0}")]
  Binding(#[from] ParseKeyBindingError),
}

/// Plugin configuration.
///
/// ```toml
/// indent = { type = "space", size = 4 }
///
/// [keys]
/// "ctrl+i" = "indent"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct CodeConfig {
  pub indent: IndentConfig,
  /// Extra bindings layered over the default keymap.
  pub keys:   BTreeMap<String, LineCommand>,
}

impl CodeConfig {
  pub fn from_toml(input: &str) -> Result<Self> {
    let config: Self = toml::from_str(input)?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_json(input: &str) -> Result<Self> {
    let config: Self = serde_json::from_str(input)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.indent.unit == IndentUnit::Space && self.indent.size == 0 {
      return Err(ConfigError::ZeroIndentSize);
    }
    Ok(())
  }

  /// The default keymap with `keys` applied on top.
  pub fn keymap(&self) -> Result<Keymap> {
    let mut keymap = Keymap::default();
    for (literal, command) in &self.keys {
      keymap.bind_str(literal, *command)?;
    }
    Ok(keymap)
  }
}
