//! Seams to the outside world: the bookmark store and URL opening.

use std::sync::atomic::{
  AtomicBool,
  AtomicUsize,
  Ordering,
};

use async_trait::async_trait;
use bookit_lib::{
  Bookmark,
  BookmarkId,
  Category,
  OrderingDimension,
};
use parking_lot::Mutex;
use thiserror::Error;

use crate::reorder::ReorderRequest;

#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error("bookmark {0} does not exist")]
  NotFound(BookmarkId),
  #[error("repository unavailable: {0}")]
  Unavailable(String),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

/// The authoritative store. The core only reads snapshots from it and sends
/// back explicit requests.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
  async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, RepositoryError>;
  async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
  /// Position `i` of `ordered_ids` becomes each bookmark's sort key in the
  /// request's dimension.
  async fn persist_order(&self, request: &ReorderRequest) -> Result<(), RepositoryError>;
}

/// Opens a URL in a new browsing context that shares nothing with ours.
pub trait Navigator: Send + Sync {
  fn open(&self, url: &str);
}

/// Renumber `bookmarks` the way a persisted reorder does. Fails without
/// touching anything if an id is unknown.
pub fn apply_order(
  bookmarks: &mut [Bookmark],
  request: &ReorderRequest,
) -> Result<(), RepositoryError> {
  let dimension = request.dimension();
  let mut positions = Vec::with_capacity(request.ordered_ids.len());
  for id in &request.ordered_ids {
    let position = bookmarks
      .iter()
      .position(|bookmark| bookmark.id == *id)
      .ok_or(RepositoryError::NotFound(*id))?;
    positions.push(position);
  }

  for (order, position) in positions.into_iter().enumerate() {
    bookmarks[position].set_order_in(dimension, order as i64);
  }
  Ok(())
}

#[derive(Debug, Default)]
struct Store {
  bookmarks:  Vec<Bookmark>,
  categories: Vec<Category>,
}

/// Process-local repository with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
  store:         Mutex<Store>,
  fail_next:     AtomicBool,
  persist_calls: AtomicUsize,
}

impl InMemoryRepository {
  pub fn new(categories: Vec<Category>, bookmarks: Vec<Bookmark>) -> Self {
    Self {
      store: Mutex::new(Store {
        bookmarks,
        categories,
      }),
      ..Self::default()
    }
  }

  /// Make the next `persist_order` fail without applying anything.
  pub fn fail_next_persist(&self) {
    self.fail_next.store(true, Ordering::SeqCst);
  }

  pub fn persist_calls(&self) -> usize {
    self.persist_calls.load(Ordering::SeqCst)
  }

  pub fn bookmarks(&self) -> Vec<Bookmark> {
    self.store.lock().bookmarks.clone()
  }

  pub fn order_of(&self, dimension: OrderingDimension) -> Vec<BookmarkId> {
    let mut bookmarks: Vec<_> = self
      .store
      .lock()
      .bookmarks
      .iter()
      .filter(|bookmark| bookmark.belongs_to(dimension))
      .cloned()
      .collect();
    bookit_lib::sort_for_dimension(&mut bookmarks, dimension);
    bookmarks.into_iter().map(|bookmark| bookmark.id).collect()
  }
}

#[async_trait]
impl BookmarkRepository for InMemoryRepository {
  async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, RepositoryError> {
    Ok(self.bookmarks())
  }

  async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
    Ok(self.store.lock().categories.clone())
  }

  async fn persist_order(&self, request: &ReorderRequest) -> Result<(), RepositoryError> {
    self.persist_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_next.swap(false, Ordering::SeqCst) {
      return Err(RepositoryError::Unavailable("injected failure".into()));
    }
    apply_order(&mut self.store.lock().bookmarks, request)
  }
}

/// Remembers every URL it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
  opened: Mutex<Vec<String>>,
}

impl RecordingNavigator {
  pub fn opened(&self) -> Vec<String> {
    self.opened.lock().clone()
  }
}

impl Navigator for RecordingNavigator {
  fn open(&self, url: &str) {
    self.opened.lock().push(url.to_string());
  }
}
