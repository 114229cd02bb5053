use smartstring::{LazyCompact, SmartString};

pub mod autocomplete;
pub mod builder;
pub mod commands;
pub mod config;
pub mod handlers;
pub mod indent;
pub mod keymap;
pub mod node;
pub mod normalize;
pub mod plugin;
pub mod render;
pub mod selection;
pub mod serialize;
pub mod tree;

pub type Tendril = SmartString<LazyCompact>;
