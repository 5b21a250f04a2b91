//! Dashboard view filter: free-text search, starred-only and category scope.

use crate::bookmark::{
  Bookmark,
  CategoryId,
  OrderingDimension,
  sort_for_dimension,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
  pub search:            String,
  pub starred_only:      bool,
  pub selected_category: Option<CategoryId>,
}

impl ViewState {
  #[must_use]
  pub fn all() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn category(id: CategoryId) -> Self {
    Self {
      selected_category: Some(id),
      ..Self::default()
    }
  }

  #[must_use]
  pub fn with_search(mut self, search: impl Into<String>) -> Self {
    self.search = search.into();
    self
  }

  #[must_use]
  pub fn with_starred_only(mut self, starred_only: bool) -> Self {
    self.starred_only = starred_only;
    self
  }

  /// The visible list is a strict subset of its dimension's full order, so
  /// reordering it would corrupt the stored order.
  #[must_use]
  pub fn is_filtered(&self) -> bool {
    self.starred_only || !self.search.trim().is_empty()
  }

  #[must_use]
  pub const fn dimension(&self) -> OrderingDimension {
    OrderingDimension::from_category(self.selected_category)
  }

  #[must_use]
  pub fn matches(&self, bookmark: &Bookmark) -> bool {
    if self.starred_only && !bookmark.starred {
      return false;
    }
    if let Some(category) = self.selected_category
      && bookmark.category_id != Some(category)
    {
      return false;
    }

    let needle = self.search.trim().to_lowercase();
    if needle.is_empty() {
      return true;
    }

    bookmark.name.to_lowercase().contains(&needle)
      || bookmark.url.to_lowercase().contains(&needle)
      || bookmark
        .description
        .as_deref()
        .is_some_and(|description| description.to_lowercase().contains(&needle))
  }

  /// Bookmarks shown by this view, in the view's order.
  pub fn visible(&self, bookmarks: &[Bookmark]) -> Vec<Bookmark> {
    let mut visible: Vec<Bookmark> = bookmarks
      .iter()
      .filter(|bookmark| self.matches(bookmark))
      .cloned()
      .collect();
    sort_for_dimension(&mut visible, self.dimension());
    visible
  }
}
