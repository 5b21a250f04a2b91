//! Versioned export document for moving a bookmark collection between
//! installations.

use std::collections::{
  HashMap,
  HashSet,
};

use chrono::{
  DateTime,
  Utc,
};
use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::bookmark::{
  Bookmark,
  BookmarkId,
  Category,
  CategoryId,
  DEFAULT_CATEGORY_COLOR,
};

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
  #[error("unsupported export version {0} (expected {EXPORT_VERSION})")]
  UnsupportedVersion(u32),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCategory {
  pub name:       String,
  #[serde(default)]
  pub color:      Option<String>,
  #[serde(default)]
  pub icon:       Option<String>,
  #[serde(default)]
  pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBookmark {
  pub name:              String,
  pub url:               String,
  #[serde(default)]
  pub description:       Option<String>,
  #[serde(default)]
  pub favicon:           Option<String>,
  #[serde(default)]
  pub custom_image:      Option<String>,
  #[serde(default)]
  pub category_name:     Option<String>,
  #[serde(default)]
  pub keyboard_shortcut: Option<String>,
  #[serde(default)]
  pub starred:           bool,
  #[serde(default)]
  pub sort_order:        i64,
}

/// Counts reported by [`ExportDocument::merge_into`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
  pub categories_created: usize,
  pub categories_skipped: usize,
  pub bookmarks_created:  usize,
  pub bookmarks_skipped:  usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
  pub version:     u32,
  pub exported_at: DateTime<Utc>,
  #[serde(default)]
  pub categories:  Vec<ExportCategory>,
  #[serde(default)]
  pub bookmarks:   Vec<ExportBookmark>,
}

impl ExportDocument {
  pub fn from_snapshot(categories: &[Category], bookmarks: &[Bookmark], now: DateTime<Utc>) -> Self {
    let names: HashMap<CategoryId, &str> = categories
      .iter()
      .map(|category| (category.id, category.name.as_str()))
      .collect();

    let mut categories: Vec<&Category> = categories.iter().collect();
    categories.sort_by_key(|category| (category.sort_order, category.id));
    let mut bookmarks: Vec<&Bookmark> = bookmarks.iter().collect();
    bookmarks.sort_by_key(|bookmark| (bookmark.sort_order, bookmark.id));

    Self {
      version:     EXPORT_VERSION,
      exported_at: now,
      categories:  categories
        .into_iter()
        .map(|category| ExportCategory {
          name:       category.name.clone(),
          color:      Some(category.color.clone()),
          icon:       category.icon.clone(),
          sort_order: category.sort_order,
        })
        .collect(),
      bookmarks:   bookmarks
        .into_iter()
        .map(|bookmark| ExportBookmark {
          name:              bookmark.name.clone(),
          url:               bookmark.url.clone(),
          description:       bookmark.description.clone(),
          favicon:           bookmark.favicon.clone(),
          custom_image:      bookmark.custom_image.clone(),
          category_name:     bookmark
            .category_id
            .and_then(|id| names.get(&id))
            .map(|name| (*name).to_string()),
          keyboard_shortcut: bookmark.keyboard_shortcut.clone(),
          starred:           bookmark.starred,
          sort_order:        bookmark.sort_order,
        })
        .collect(),
    }
  }

  pub fn from_json(json: &str) -> Result<Self, ExportError> {
    let document: Self = serde_json::from_str(json)?;
    if document.version != EXPORT_VERSION {
      return Err(ExportError::UnsupportedVersion(document.version));
    }
    Ok(document)
  }

  pub fn to_json_pretty(&self) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Rebuild records with fresh sequential ids, as an import into an empty
  /// store.
  pub fn into_snapshot(self) -> (Vec<Category>, Vec<Bookmark>) {
    let mut categories = Vec::new();
    let mut bookmarks = Vec::new();
    self.merge_into(&mut categories, &mut bookmarks);
    (categories, bookmarks)
  }

  /// Merge the document into an existing store.
  ///
  /// Categories are matched by name ignoring case; existing ones are kept and
  /// the exported duplicate is skipped. Bookmarks whose URL (ignoring case)
  /// is already stored, or appeared earlier in the document, are skipped.
  /// New bookmarks get fresh ids and are appended after the existing ones in
  /// their exported global order, in both the global and their category's
  /// ordering. Unknown category names become uncategorised.
  pub fn merge_into(self, categories: &mut Vec<Category>, bookmarks: &mut Vec<Bookmark>) -> ImportSummary {
    let mut summary = ImportSummary::default();

    let mut by_name: HashMap<String, CategoryId> = categories
      .iter()
      .map(|category| (category.name.to_lowercase(), category.id))
      .collect();
    let mut next_category = categories.iter().map(|category| category.id.0).max().unwrap_or(0) + 1;
    for exported in self.categories {
      let key = exported.name.to_lowercase();
      if by_name.contains_key(&key) {
        summary.categories_skipped += 1;
        continue;
      }
      let id = CategoryId(next_category);
      next_category += 1;
      by_name.insert(key, id);
      categories.push(Category {
        id,
        name: exported.name,
        color: exported
          .color
          .filter(|color| !color.is_empty())
          .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
        icon: exported.icon,
        sort_order: exported.sort_order,
      });
      summary.categories_created += 1;
    }

    let mut urls: HashSet<String> = bookmarks.iter().map(|bookmark| bookmark.url.to_lowercase()).collect();
    let mut next_id = bookmarks.iter().map(|bookmark| bookmark.id.0).max().unwrap_or(0) + 1;
    let mut next_global = bookmarks
      .iter()
      .map(|bookmark| bookmark.sort_order + 1)
      .max()
      .unwrap_or(0);
    let mut next_in_category: HashMap<CategoryId, i64> = HashMap::new();

    let mut exported = self.bookmarks;
    exported.sort_by_key(|bookmark| bookmark.sort_order);
    for exported in exported {
      if !urls.insert(exported.url.to_lowercase()) {
        summary.bookmarks_skipped += 1;
        continue;
      }

      let category_id = exported
        .category_name
        .as_deref()
        .and_then(|name| by_name.get(&name.to_lowercase()).copied());
      let category_sort_order = match category_id {
        Some(id) => {
          let slot = next_in_category.entry(id).or_insert_with(|| {
            bookmarks
              .iter()
              .filter(|bookmark| bookmark.category_id == Some(id))
              .map(|bookmark| bookmark.category_sort_order + 1)
              .max()
              .unwrap_or(0)
          });
          let order = *slot;
          *slot += 1;
          order
        },
        None => 0,
      };

      bookmarks.push(Bookmark {
        id: BookmarkId(next_id),
        name: exported.name,
        url: exported.url,
        description: exported.description,
        favicon: exported.favicon,
        custom_image: exported.custom_image,
        category_id,
        keyboard_shortcut: exported.keyboard_shortcut,
        starred: exported.starred,
        sort_order: next_global,
        category_sort_order,
      });
      next_id += 1;
      next_global += 1;
      summary.bookmarks_created += 1;
    }

    summary
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn exported_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
  }

  #[test]
  fn export_resolves_category_names() {
    let categories = vec![Category::new(7, "Dev")];
    let bookmarks = vec![
      Bookmark::new(2, "Crates", "https://crates.io")
        .with_category(CategoryId(7))
        .with_orders(1, 0),
      Bookmark::new(1, "News", "https://news.ycombinator.com").with_orders(0, 0),
    ];
    let document = ExportDocument::from_snapshot(&categories, &bookmarks, exported_at());
    assert_eq!(document.version, EXPORT_VERSION);
    assert_eq!(document.bookmarks[0].name, "News");
    assert_eq!(document.bookmarks[0].category_name, None);
    assert_eq!(document.bookmarks[1].category_name.as_deref(), Some("Dev"));
  }

  #[test]
  fn import_assigns_fresh_ids_and_dense_category_orders() {
    let json = r#"{
      "version": 1,
      "exportedAt": "2025-03-01T12:00:00Z",
      "categories": [{ "name": "Dev", "sortOrder": 0 }],
      "bookmarks": [
        { "name": "B", "url": "https://b", "categoryName": "Dev", "sortOrder": 9 },
        { "name": "A", "url": "https://a", "categoryName": "Dev", "sortOrder": 3 },
        { "name": "C", "url": "https://c", "categoryName": "Gone", "sortOrder": 4 }
      ]
    }"#;
    let (categories, bookmarks) = ExportDocument::from_json(json).unwrap().into_snapshot();
    assert_eq!(categories[0].color, DEFAULT_CATEGORY_COLOR);

    let summary: Vec<_> = bookmarks
      .iter()
      .map(|b| (b.name.as_str(), b.id.0, b.sort_order, b.category_id, b.category_sort_order))
      .collect();
    assert_eq!(summary, vec![
      ("A", 1, 0, Some(CategoryId(1)), 0),
      ("C", 2, 1, None, 0),
      ("B", 3, 2, Some(CategoryId(1)), 1),
    ]);
  }

  fn document(json: &str) -> ExportDocument {
    ExportDocument::from_json(json).unwrap()
  }

  #[test]
  fn merge_matches_categories_ignoring_case() {
    let mut categories = vec![Category::new(4, "Dev")];
    let mut bookmarks = Vec::new();
    let summary = document(
      r#"{
        "version": 1,
        "exportedAt": "2025-03-01T12:00:00Z",
        "categories": [{ "name": "dev" }, { "name": "News" }],
        "bookmarks": [
          { "name": "Crates", "url": "https://crates.io", "categoryName": "DEV" },
          { "name": "HN", "url": "https://news.ycombinator.com", "categoryName": "news" }
        ]
      }"#,
    )
    .merge_into(&mut categories, &mut bookmarks);

    assert_eq!(summary.categories_created, 1);
    assert_eq!(summary.categories_skipped, 1);
    let names: Vec<_> = categories.iter().map(|c| (c.id, c.name.as_str())).collect();
    assert_eq!(names, vec![(CategoryId(4), "Dev"), (CategoryId(5), "News")]);
    assert_eq!(bookmarks[0].category_id, Some(CategoryId(4)));
    assert_eq!(bookmarks[1].category_id, Some(CategoryId(5)));
  }

  #[test]
  fn merge_skips_known_urls_and_appends_after_existing() {
    let mut categories = vec![Category::new(1, "Dev")];
    let mut bookmarks = vec![
      Bookmark::new(10, "Crates", "https://crates.io")
        .with_category(CategoryId(1))
        .with_orders(0, 0),
      Bookmark::new(11, "Docs", "https://docs.rs")
        .with_category(CategoryId(1))
        .with_orders(1, 1),
    ];
    let summary = document(
      r#"{
        "version": 1,
        "exportedAt": "2025-03-01T12:00:00Z",
        "categories": [],
        "bookmarks": [
          { "name": "Crates again", "url": "HTTPS://CRATES.IO" },
          { "name": "Blog", "url": "https://blog.rust-lang.org", "categoryName": "Dev", "sortOrder": 2 },
          { "name": "Blog twice", "url": "https://blog.rust-lang.org/", "sortOrder": 3 },
          { "name": "Blog dup", "url": "https://Blog.rust-lang.org", "sortOrder": 4 }
        ]
      }"#,
    )
    .merge_into(&mut categories, &mut bookmarks);

    assert_eq!(summary, ImportSummary {
      categories_created: 0,
      categories_skipped: 0,
      bookmarks_created:  2,
      bookmarks_skipped:  2,
    });
    let added: Vec<_> = bookmarks[2..]
      .iter()
      .map(|b| (b.id.0, b.name.as_str(), b.sort_order, b.category_id, b.category_sort_order))
      .collect();
    assert_eq!(added, vec![
      (12, "Blog", 2, Some(CategoryId(1)), 2),
      (13, "Blog twice", 3, None, 0),
    ]);
  }

  quickcheck::quickcheck! {
    fn snapshot_category_orders_are_dense(picks: Vec<u8>) -> bool {
      let bookmarks: Vec<ExportBookmark> = picks
        .iter()
        .enumerate()
        .map(|(i, pick)| ExportBookmark {
          name:              format!("b{i}"),
          url:               format!("https://b{i}"),
          description:       None,
          favicon:           None,
          custom_image:      None,
          category_name:     (pick % 4 != 0).then(|| format!("c{}", pick % 4)),
          keyboard_shortcut: None,
          starred:           false,
          sort_order:        i64::from(*pick),
        })
        .collect();
      let categories = (1..4)
        .map(|n| ExportCategory {
          name:       format!("C{n}"),
          color:      None,
          icon:       None,
          sort_order: n,
        })
        .collect();
      let (categories, bookmarks) = ExportDocument {
        version: EXPORT_VERSION,
        exported_at: exported_at(),
        categories,
        bookmarks,
      }
      .into_snapshot();

      let global: Vec<i64> = bookmarks.iter().map(|b| b.sort_order).collect();
      let dense_global = global == (0..bookmarks.len() as i64).collect::<Vec<_>>();
      let dense_categories = categories.iter().all(|category| {
        let orders: Vec<i64> = bookmarks
          .iter()
          .filter(|b| b.category_id == Some(category.id))
          .map(|b| b.category_sort_order)
          .collect();
        orders == (0..orders.len() as i64).collect::<Vec<_>>()
      });
      // Lower-case names in the bookmarks still find the "C<n>" categories.
      let resolved = bookmarks.iter().all(|b| {
        let index: usize = b.name[1..].parse().unwrap();
        b.category_id.is_some() == (picks[index] % 4 != 0)
      });
      dense_global && dense_categories && resolved
    }
  }

  #[test]
  fn rejects_other_versions() {
    let json = r#"{ "version": 2, "exportedAt": "2025-03-01T12:00:00Z", "categories": [], "bookmarks": [] }"#;
    assert!(matches!(
      ExportDocument::from_json(json),
      Err(ExportError::UnsupportedVersion(2))
    ));
  }
}
