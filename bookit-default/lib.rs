//! Interactive core of the bookmark manager.
//!
//! Two independent engines operate on a snapshot of bookmarks handed over by
//! a repository: [`ShortcutMatcher`] reads typed key sequences and decides
//! when to open a bookmark, [`ReorderCoordinator`] turns drag gestures into
//! optimistic local reorders plus persistence requests. Neither owns the
//! source of truth; both only send requests back to it.

mod reorder;
mod repository;
mod shortcut;

pub use reorder::{
  GestureId,
  Reconcile,
  RefetchTicket,
  ReorderCoordinator,
  ReorderRequest,
};
pub use repository::{
  BookmarkRepository,
  InMemoryRepository,
  Navigator,
  RecordingNavigator,
  RepositoryError,
  apply_order,
};
pub use shortcut::{
  ActivationToken,
  Effects,
  MatcherEvent,
  Phase,
  Selection,
  ShortcutEffect,
  ShortcutMatcher,
  ShortcutState,
  Transition,
  transition,
};
