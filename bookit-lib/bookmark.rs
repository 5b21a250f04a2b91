//! Bookmark and category records as handed over by the repository.

use std::{
  cmp::Ordering,
  fmt,
};

use serde::{
  Deserialize,
  Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(pub i64);

impl fmt::Display for BookmarkId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Which sort key a view orders by.
///
/// The "All" view orders by `sort_order`; a category view orders by
/// `category_sort_order` among the bookmarks of that category. The two
/// numbering spaces are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderingDimension {
  Global,
  Category(CategoryId),
}

impl OrderingDimension {
  /// The category id carried on the wire when persisting an ordering.
  /// `None` means the global ordering.
  #[must_use]
  pub const fn category_id(self) -> Option<CategoryId> {
    match self {
      Self::Global => None,
      Self::Category(id) => Some(id),
    }
  }

  #[must_use]
  pub const fn from_category(category: Option<CategoryId>) -> Self {
    match category {
      Some(id) => Self::Category(id),
      None => Self::Global,
    }
  }
}

impl fmt::Display for OrderingDimension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Global => write!(f, "global"),
      Self::Category(id) => write!(f, "category:{id}"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
  pub id:                  BookmarkId,
  pub name:                String,
  pub url:                 String,
  #[serde(default)]
  pub description:         Option<String>,
  #[serde(default)]
  pub favicon:             Option<String>,
  #[serde(default)]
  pub custom_image:        Option<String>,
  #[serde(default)]
  pub category_id:         Option<CategoryId>,
  #[serde(default)]
  pub keyboard_shortcut:   Option<String>,
  #[serde(default)]
  pub starred:             bool,
  #[serde(default)]
  pub sort_order:          i64,
  #[serde(default)]
  pub category_sort_order: i64,
}

impl Bookmark {
  pub fn new(id: i64, name: impl Into<String>, url: impl Into<String>) -> Self {
    Self {
      id:                  BookmarkId(id),
      name:                name.into(),
      url:                 url.into(),
      description:         None,
      favicon:             None,
      custom_image:        None,
      category_id:         None,
      keyboard_shortcut:   None,
      starred:             false,
      sort_order:          0,
      category_sort_order: 0,
    }
  }

  #[must_use]
  pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
    self.keyboard_shortcut = Some(shortcut.into());
    self
  }

  #[must_use]
  pub fn with_category(mut self, category: CategoryId) -> Self {
    self.category_id = Some(category);
    self
  }

  #[must_use]
  pub fn with_orders(mut self, sort_order: i64, category_sort_order: i64) -> Self {
    self.sort_order = sort_order;
    self.category_sort_order = category_sort_order;
    self
  }

  #[must_use]
  pub fn starred(mut self) -> Self {
    self.starred = true;
    self
  }

  /// Lower-cased shortcut, or `None` when unset or blank.
  pub fn shortcut_key(&self) -> Option<String> {
    self
      .keyboard_shortcut
      .as_deref()
      .map(str::trim)
      .filter(|shortcut| !shortcut.is_empty())
      .map(str::to_lowercase)
  }

  #[must_use]
  pub const fn order_in(&self, dimension: OrderingDimension) -> i64 {
    match dimension {
      OrderingDimension::Global => self.sort_order,
      OrderingDimension::Category(_) => self.category_sort_order,
    }
  }

  /// Write the sort key of `dimension`, leaving the other one untouched.
  pub fn set_order_in(&mut self, dimension: OrderingDimension, value: i64) {
    match dimension {
      OrderingDimension::Global => self.sort_order = value,
      OrderingDimension::Category(_) => self.category_sort_order = value,
    }
  }

  #[must_use]
  pub fn belongs_to(&self, dimension: OrderingDimension) -> bool {
    match dimension {
      OrderingDimension::Global => true,
      OrderingDimension::Category(id) => self.category_id == Some(id),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id:         CategoryId,
  pub name:       String,
  #[serde(default = "default_category_color")]
  pub color:      String,
  #[serde(default)]
  pub icon:       Option<String>,
  #[serde(default)]
  pub sort_order: i64,
}

pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

fn default_category_color() -> String {
  DEFAULT_CATEGORY_COLOR.to_string()
}

impl Category {
  pub fn new(id: i64, name: impl Into<String>) -> Self {
    Self {
      id:         CategoryId(id),
      name:       name.into(),
      color:      default_category_color(),
      icon:       None,
      sort_order: 0,
    }
  }
}

fn compare_in(dimension: OrderingDimension, a: &Bookmark, b: &Bookmark) -> Ordering {
  a.order_in(dimension)
    .cmp(&b.order_in(dimension))
    .then_with(|| a.id.cmp(&b.id))
}

/// Sort by the dimension's key, ties broken by id.
pub fn sort_for_dimension(bookmarks: &mut [Bookmark], dimension: OrderingDimension) {
  bookmarks.sort_by(|a, b| compare_in(dimension, a, b));
}

pub fn find_bookmark(bookmarks: &[Bookmark], id: BookmarkId) -> Option<&Bookmark> {
  bookmarks.iter().find(|bookmark| bookmark.id == id)
}
