//! Drag-and-drop reordering over two independent orderings.
//!
//! Every bookmark carries a global `sort_order` (the "All" view) and a
//! `category_sort_order` (its category's view). A drag only renumbers the
//! dimension of the view it happened in, and only the bookmarks visible in
//! that view, as a dense `0..n` run.
//!
//! The new order is applied locally first and then persisted. Each drag is a
//! gesture with a monotonically increasing id. When a persist fails the local
//! state is replaced by a fresh snapshot from the repository, but only once
//! no gesture is in flight, so a refetch never overwrites a newer optimistic
//! update.

use std::collections::BTreeSet;

use bookit_lib::{
  Bookmark,
  BookmarkId,
  CategoryId,
  OrderingDimension,
  ViewState,
};
use serde::{
  Deserialize,
  Serialize,
};

use crate::repository::RepositoryError;

pub type GestureId = u64;

/// What gets persisted for one drag: the full visible order and the
/// dimension it applies to (`category_id` is `None` for the global order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
  #[serde(skip)]
  pub gesture:     GestureId,
  pub ordered_ids: Vec<BookmarkId>,
  pub category_id: Option<CategoryId>,
}

impl ReorderRequest {
  #[must_use]
  pub const fn dimension(&self) -> OrderingDimension {
    OrderingDimension::from_category(self.category_id)
  }
}

/// Permission to apply a refetched snapshot, tied to the newest gesture at
/// the time the refetch started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefetchTicket {
  after: GestureId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
  /// Local state already reflects what the repository holds, or a newer
  /// gesture will decide.
  Settled,
  /// Fetch the authoritative snapshot and hand it to
  /// [`ReorderCoordinator::apply_refetch`].
  Refetch(RefetchTicket),
}

#[derive(Debug, Clone)]
pub struct ReorderCoordinator {
  bookmarks:    Vec<Bookmark>,
  enabled:      bool,
  last_gesture: GestureId,
  in_flight:    BTreeSet<GestureId>,
  refetch_owed: bool,
}

impl Default for ReorderCoordinator {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}

impl ReorderCoordinator {
  pub fn new(bookmarks: Vec<Bookmark>) -> Self {
    Self {
      bookmarks,
      enabled: true,
      last_gesture: 0,
      in_flight: BTreeSet::new(),
      refetch_owed: false,
    }
  }

  #[must_use]
  pub fn with_enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  pub fn bookmarks(&self) -> &[Bookmark] {
    &self.bookmarks
  }

  pub fn visible(&self, view: &ViewState) -> Vec<Bookmark> {
    view.visible(&self.bookmarks)
  }

  pub fn in_flight(&self) -> usize {
    self.in_flight.len()
  }

  /// Load a snapshot unconditionally, e.g. the initial fetch.
  pub fn replace_snapshot(&mut self, bookmarks: Vec<Bookmark>) {
    self.bookmarks = bookmarks;
  }

  /// Move `source` to the position of `destination` in the visible list of
  /// `view`, apply the result locally and return the request to persist.
  ///
  /// Returns `None`, leaving everything untouched, when the view is
  /// filtered, reordering is disabled, the ids are equal or either id is not
  /// visible.
  pub fn reorder(
    &mut self,
    view: &ViewState,
    source: BookmarkId,
    destination: BookmarkId,
  ) -> Option<ReorderRequest> {
    if !self.enabled || view.is_filtered() {
      tracing::debug!(%source, %destination, "reorder refused for filtered view");
      return None;
    }
    if source == destination {
      return None;
    }

    let mut ordered_ids: Vec<BookmarkId> = self
      .visible(view)
      .into_iter()
      .map(|bookmark| bookmark.id)
      .collect();
    let from = ordered_ids.iter().position(|id| *id == source)?;
    let to = ordered_ids.iter().position(|id| *id == destination)?;

    let moved = ordered_ids.remove(from);
    ordered_ids.insert(to, moved);

    let dimension = view.dimension();
    for (order, id) in ordered_ids.iter().enumerate() {
      if let Some(bookmark) = self.bookmarks.iter_mut().find(|bookmark| bookmark.id == *id) {
        bookmark.set_order_in(dimension, order as i64);
      }
    }

    self.last_gesture += 1;
    let gesture = self.last_gesture;
    self.in_flight.insert(gesture);
    tracing::debug!(gesture, %dimension, from, to, "reorder applied locally");

    Some(ReorderRequest {
      gesture,
      ordered_ids,
      category_id: dimension.category_id(),
    })
  }

  /// Record how persisting `gesture` went.
  pub fn complete(
    &mut self,
    gesture: GestureId,
    result: Result<(), RepositoryError>,
  ) -> Reconcile {
    if !self.in_flight.remove(&gesture) {
      return Reconcile::Settled;
    }

    if let Err(err) = result {
      tracing::warn!(gesture, %err, "failed to persist bookmark order, reverting to repository state");
      self.refetch_owed = true;
    }

    self.take_refetch()
  }

  /// Apply a snapshot fetched for `ticket`.
  ///
  /// A ticket that predates a newer gesture is dropped, since the snapshot
  /// may not contain that gesture's order yet. The refetch stays owed: it is
  /// handed back right away when nothing is in flight any more, otherwise it
  /// comes back from the last completion.
  pub fn apply_refetch(&mut self, ticket: RefetchTicket, bookmarks: Vec<Bookmark>) -> Reconcile {
    if !self.is_current(ticket) {
      tracing::debug!(ticket = ticket.after, latest = self.last_gesture, "dropping stale refetch");
      self.refetch_owed = true;
      return self.take_refetch();
    }
    self.bookmarks = bookmarks;
    Reconcile::Settled
  }

  /// Whether a snapshot fetched for `ticket` would still be applied.
  pub fn is_current(&self, ticket: RefetchTicket) -> bool {
    ticket.after == self.last_gesture
  }

  /// The refetch itself failed; try again after the next completion.
  pub fn refetch_failed(&mut self, err: &RepositoryError) {
    tracing::warn!(%err, "failed to refetch bookmarks");
    self.refetch_owed = true;
  }

  fn take_refetch(&mut self) -> Reconcile {
    if self.refetch_owed && self.in_flight.is_empty() {
      self.refetch_owed = false;
      Reconcile::Refetch(RefetchTicket {
        after: self.last_gesture,
      })
    } else {
      Reconcile::Settled
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const CAT: CategoryId = CategoryId(7);

  fn category_items() -> Vec<Bookmark> {
    ["A", "B", "C", "D"]
      .into_iter()
      .enumerate()
      .map(|(i, name)| {
        Bookmark::new(i as i64 + 1, name, format!("https://{name}"))
          .with_category(CAT)
          .with_orders(10 + i as i64 * 3, i as i64)
      })
      .collect()
  }

  fn names(bookmarks: &[Bookmark]) -> Vec<&str> {
    bookmarks.iter().map(|b| b.name.as_str()).collect()
  }

  fn by_name<'a>(bookmarks: &'a [Bookmark], name: &str) -> &'a Bookmark {
    bookmarks.iter().find(|b| b.name == name).unwrap()
  }

  #[test]
  fn category_move_renumbers_category_order_only() {
    let initial = category_items();
    let mut coordinator = ReorderCoordinator::new(initial.clone());
    let view = ViewState::category(CAT);

    let request = coordinator
      .reorder(&view, BookmarkId(4), BookmarkId(2))
      .unwrap();
    assert_eq!(request.ordered_ids, vec![
      BookmarkId(1),
      BookmarkId(4),
      BookmarkId(2),
      BookmarkId(3)
    ]);
    assert_eq!(request.category_id, Some(CAT));

    let bookmarks = coordinator.bookmarks();
    for (name, order) in [("A", 0), ("D", 1), ("B", 2), ("C", 3)] {
      assert_eq!(by_name(bookmarks, name).category_sort_order, order, "{name}");
    }
    for (before, after) in initial.iter().zip(bookmarks) {
      assert_eq!(before.sort_order, after.sort_order);
    }
    assert_eq!(names(&coordinator.visible(&view)), vec!["A", "D", "B", "C"]);
  }

  #[test]
  fn global_move_never_touches_category_order() {
    let initial = category_items();
    let mut coordinator = ReorderCoordinator::new(initial.clone());

    let request = coordinator
      .reorder(&ViewState::all(), BookmarkId(1), BookmarkId(3))
      .unwrap();
    assert_eq!(request.category_id, None);
    assert_eq!(names(&coordinator.visible(&ViewState::all())), vec!["B", "C", "A", "D"]);

    let orders: Vec<_> = coordinator.bookmarks().iter().map(|b| b.sort_order).collect();
    assert_eq!(orders, vec![2, 0, 1, 3]);
    for (before, after) in initial.iter().zip(coordinator.bookmarks()) {
      assert_eq!(before.category_sort_order, after.category_sort_order);
    }
  }

  #[test]
  fn only_visible_items_are_renumbered() {
    let mut bookmarks = category_items();
    bookmarks.push(
      Bookmark::new(9, "Other", "https://other")
        .with_category(CategoryId(8))
        .with_orders(0, 42),
    );
    let mut coordinator = ReorderCoordinator::new(bookmarks);
    coordinator.reorder(&ViewState::category(CAT), BookmarkId(1), BookmarkId(2));
    assert_eq!(by_name(coordinator.bookmarks(), "Other").category_sort_order, 42);
  }

  #[test]
  fn filtered_views_and_invalid_ids_are_no_ops() {
    let initial = category_items();
    let mut coordinator = ReorderCoordinator::new(initial.clone());

    for view in [
      ViewState::all().with_search("a"),
      ViewState::category(CAT).with_starred_only(true),
    ] {
      assert!(coordinator.reorder(&view, BookmarkId(1), BookmarkId(2)).is_none());
    }
    let view = ViewState::all();
    assert!(coordinator.reorder(&view, BookmarkId(1), BookmarkId(1)).is_none());
    assert!(coordinator.reorder(&view, BookmarkId(1), BookmarkId(99)).is_none());
    assert!(coordinator.reorder(&view, BookmarkId(99), BookmarkId(1)).is_none());
    assert!(coordinator.reorder(&ViewState::category(CategoryId(8)), BookmarkId(1), BookmarkId(2)).is_none());

    assert_eq!(coordinator.bookmarks(), initial.as_slice());
    assert_eq!(coordinator.in_flight(), 0);
  }

  #[test]
  fn disabled_coordinator_refuses() {
    let mut coordinator = ReorderCoordinator::new(category_items()).with_enabled(false);
    assert!(coordinator.reorder(&ViewState::all(), BookmarkId(1), BookmarkId(2)).is_none());
  }

  #[test]
  fn success_settles_and_failure_refetches() {
    let initial = category_items();
    let mut coordinator = ReorderCoordinator::new(initial.clone());
    let view = ViewState::all();

    let first = coordinator.reorder(&view, BookmarkId(1), BookmarkId(2)).unwrap();
    assert_eq!(coordinator.complete(first.gesture, Ok(())), Reconcile::Settled);

    let second = coordinator.reorder(&view, BookmarkId(4), BookmarkId(2)).unwrap();
    let failed = Err(RepositoryError::Unavailable("offline".into()));
    let Reconcile::Refetch(ticket) = coordinator.complete(second.gesture, failed) else {
      panic!("expected a refetch");
    };
    assert_eq!(coordinator.apply_refetch(ticket, initial.clone()), Reconcile::Settled);
    assert_eq!(coordinator.bookmarks(), initial.as_slice());
  }

  #[test]
  fn stale_failure_waits_for_in_flight_gesture() {
    let mut coordinator = ReorderCoordinator::new(category_items());
    let all = ViewState::all();
    let category = ViewState::category(CAT);

    let first = coordinator.reorder(&all, BookmarkId(1), BookmarkId(2)).unwrap();
    let second = coordinator.reorder(&category, BookmarkId(3), BookmarkId(1)).unwrap();

    let failed = Err(RepositoryError::Unavailable("offline".into()));
    assert_eq!(coordinator.complete(first.gesture, failed), Reconcile::Settled);
    assert!(matches!(
      coordinator.complete(second.gesture, Ok(())),
      Reconcile::Refetch(_)
    ));
    assert_eq!(coordinator.complete(second.gesture, Ok(())), Reconcile::Settled);
  }

  #[test]
  fn refetch_is_dropped_when_a_newer_gesture_started() {
    let initial = category_items();
    let mut coordinator = ReorderCoordinator::new(initial.clone());
    let view = ViewState::all();

    let first = coordinator.reorder(&view, BookmarkId(1), BookmarkId(2)).unwrap();
    let Reconcile::Refetch(ticket) =
      coordinator.complete(first.gesture, Err(RepositoryError::Unavailable("x".into())))
    else {
      panic!("expected a refetch");
    };

    let second = coordinator.reorder(&view, BookmarkId(4), BookmarkId(3)).unwrap();
    let optimistic = coordinator.bookmarks().to_vec();
    assert_eq!(coordinator.apply_refetch(ticket, initial), Reconcile::Settled);
    assert_eq!(coordinator.bookmarks(), optimistic.as_slice());

    assert!(matches!(
      coordinator.complete(second.gesture, Ok(())),
      Reconcile::Refetch(_)
    ));
  }

  #[test]
  fn stale_refetch_is_reissued_when_nothing_is_in_flight() {
    let initial = category_items();
    let mut coordinator = ReorderCoordinator::new(initial.clone());
    let view = ViewState::all();

    let first = coordinator.reorder(&view, BookmarkId(1), BookmarkId(3)).unwrap();
    let Reconcile::Refetch(stale) =
      coordinator.complete(first.gesture, Err(RepositoryError::Unavailable("x".into())))
    else {
      panic!("expected a refetch");
    };

    // A newer drag starts and finishes before the refetch answer arrives.
    let second = coordinator.reorder(&view, BookmarkId(4), BookmarkId(2)).unwrap();
    assert_eq!(coordinator.complete(second.gesture, Ok(())), Reconcile::Settled);
    assert_eq!(coordinator.in_flight(), 0);

    let Reconcile::Refetch(fresh) = coordinator.apply_refetch(stale, initial.clone()) else {
      panic!("a dropped refetch must be reissued");
    };
    assert_ne!(fresh, stale);
    assert!(!coordinator.is_current(stale));
    assert!(coordinator.is_current(fresh));

    let authoritative = initial.clone();
    assert_eq!(coordinator.apply_refetch(fresh, authoritative), Reconcile::Settled);
    assert_eq!(coordinator.bookmarks(), initial.as_slice());
  }

  quickcheck::quickcheck! {
    fn reorder_yields_dense_run_in_view_dimension(len: u8, from: u8, to: u8, category: bool) -> bool {
      let len = (len % 12) as i64 + 2;
      let bookmarks: Vec<_> = (0..len)
        .map(|i| {
          Bookmark::new(i, format!("b{i}"), format!("https://b{i}"))
            .with_category(CAT)
            .with_orders(len - i, i * 2)
        })
        .collect();
      let view = if category { ViewState::category(CAT) } else { ViewState::all() };
      let visible = view.visible(&bookmarks);
      let source = visible[from as usize % visible.len()].id;
      let destination = visible[to as usize % visible.len()].id;

      let mut coordinator = ReorderCoordinator::new(bookmarks.clone());
      let Some(request) = coordinator.reorder(&view, source, destination) else {
        return source == destination;
      };

      let dimension = view.dimension();
      let mut orders: Vec<i64> = coordinator.bookmarks().iter().map(|b| b.order_in(dimension)).collect();
      orders.sort_unstable();
      let dense = orders == (0..len).collect::<Vec<_>>();
      let other_untouched = bookmarks.iter().zip(coordinator.bookmarks()).all(|(before, after)| {
        match dimension {
          OrderingDimension::Global => before.category_sort_order == after.category_sort_order,
          OrderingDimension::Category(_) => before.sort_order == after.sort_order,
        }
      });
      let visible_after: Vec<_> = coordinator.visible(&view).iter().map(|b| b.id).collect();
      dense && other_untouched && visible_after == request.ordered_ids
    }
  }
}
