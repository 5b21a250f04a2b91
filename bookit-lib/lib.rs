//! Core data model for the bookmark manager: records handed over by the
//! repository, key input forwarded by a rendering surface, view filtering,
//! configuration and the export format.

pub mod bookmark;
pub mod config;
pub mod export;
pub mod input;
pub mod view;

pub use bookmark::{
  Bookmark,
  BookmarkId,
  Category,
  CategoryId,
  OrderingDimension,
  find_bookmark,
  sort_for_dimension,
};
pub use config::{
  Config,
  ConfigError,
  ReorderConfig,
  ShortcutConfig,
};
pub use input::{
  Key,
  KeyEvent,
  KeyInput,
  KeyOutcome,
  Modifiers,
};
pub use view::ViewState;
