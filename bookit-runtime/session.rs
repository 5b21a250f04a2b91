//! Drives both engines against a repository, a timer and a navigator.

use std::sync::Arc;

use bookit_default::{
  ActivationToken,
  BookmarkRepository,
  Effects,
  GestureId,
  Navigator,
  Reconcile,
  ReorderCoordinator,
  ReorderRequest,
  RepositoryError,
  ShortcutEffect,
  ShortcutMatcher,
  ShortcutState,
};
use bookit_event::CancellableTimer;
use bookit_lib::{
  Bookmark,
  BookmarkId,
  Category,
  Config,
  KeyInput,
  KeyOutcome,
  ViewState,
};
use tokio::sync::mpsc::Receiver;

const TIMER_CHANNEL_CAPACITY: usize = 8;

/// Read-only state for a rendering surface, recomputed on demand.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
  pub shortcut:   ShortcutState,
  pub view:       ViewState,
  pub visible:    Vec<Bookmark>,
  pub categories: Vec<Category>,
  pub in_flight:  usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
  /// Nothing moved (filtered view, unknown ids, same position).
  Ignored,
  Persisted,
  /// The repository rejected the order and local state was re-synced from it.
  Reverted,
  /// The repository rejected the order, but the re-sync waits for other moves
  /// still in flight (or for a refetch that failed to be retried).
  RevertPending,
}

pub struct Session<R, N> {
  repository:  Arc<R>,
  navigator:   N,
  matcher:     ShortcutMatcher,
  coordinator: ReorderCoordinator,
  categories:  Vec<Category>,
  view:        ViewState,
  timer:       CancellableTimer<ActivationToken>,
  timer_rx:    Receiver<ActivationToken>,
}

impl<R, N> Session<R, N>
where
  R: BookmarkRepository,
  N: Navigator,
{
  pub fn new(repository: Arc<R>, navigator: N, config: &Config) -> Self {
    let (timer, timer_rx) = CancellableTimer::channel(TIMER_CHANNEL_CAPACITY);
    Self {
      repository,
      navigator,
      matcher: ShortcutMatcher::new(config.shortcuts.clone()),
      coordinator: ReorderCoordinator::default().with_enabled(config.reorder.enabled),
      categories: Vec::new(),
      view: ViewState::default(),
      timer,
      timer_rx,
    }
  }

  /// Fetch bookmarks and categories from the repository.
  pub async fn load(&mut self) -> Result<(), RepositoryError> {
    let bookmarks = self.repository.list_bookmarks().await?;
    self.categories = self.repository.list_categories().await?;
    self.categories.sort_by_key(|category| (category.sort_order, category.id));
    tracing::debug!(
      bookmarks = bookmarks.len(),
      categories = self.categories.len(),
      "loaded snapshot"
    );
    self.coordinator.replace_snapshot(bookmarks);
    Ok(())
  }

  pub fn repository(&self) -> &R {
    &self.repository
  }

  pub fn navigator(&self) -> &N {
    &self.navigator
  }

  pub fn view(&self) -> &ViewState {
    &self.view
  }

  pub fn set_view(&mut self, view: ViewState) {
    self.view = view;
  }

  pub fn bookmarks(&self) -> &[Bookmark] {
    self.coordinator.bookmarks()
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    SessionSnapshot {
      shortcut:   self.matcher.state().clone(),
      view:       self.view.clone(),
      visible:    self.coordinator.visible(&self.view),
      categories: self.categories.clone(),
      in_flight:  self.coordinator.in_flight(),
    }
  }

  pub fn handle_key(&mut self, input: KeyInput) -> KeyOutcome {
    let (outcome, effects) = self
      .matcher
      .handle_key(input, self.coordinator.bookmarks());
    self.apply_effects(effects);
    outcome
  }

  /// Cancel any sequence in progress, e.g. when the surface loses focus.
  pub fn cancel_shortcut(&mut self) {
    let effects = self.matcher.reset();
    self.apply_effects(effects);
  }

  /// Apply elapsed activations without waiting. Returns whether any arrived.
  pub fn poll_timer(&mut self) -> bool {
    let mut fired = false;
    while let Ok(token) = self.timer_rx.try_recv() {
      self.activation_elapsed(token);
      fired = true;
    }
    fired
  }

  /// Wait for the next elapsed activation and apply it.
  pub async fn next_timer_event(&mut self) -> Option<ActivationToken> {
    let token = self.timer_rx.recv().await?;
    self.activation_elapsed(token);
    Some(token)
  }

  fn activation_elapsed(&mut self, token: ActivationToken) {
    let effects = self.matcher.activation_elapsed(token);
    self.apply_effects(effects);
  }

  fn apply_effects(&mut self, effects: Effects) {
    for effect in effects {
      match effect {
        ShortcutEffect::ScheduleActivation { token, delay } => {
          if !self.timer.schedule(token, delay, token) {
            // Nothing would ever deliver the activation; leave Activating.
            let effects = self.matcher.reset();
            self.apply_effects(effects);
          }
        },
        ShortcutEffect::CancelActivation { token } => {
          self.timer.cancel(token);
        },
        ShortcutEffect::Navigate { bookmark_id, url } => {
          tracing::info!(bookmark = %bookmark_id, %url, "opening bookmark");
          self.navigator.open(&url);
        },
      }
    }
  }

  /// Apply a drag locally and return the request to persist. The caller
  /// hands the result back through [`Session::finish_move`]; several moves
  /// may be in flight at once.
  pub fn begin_move(&mut self, source: BookmarkId, destination: BookmarkId) -> Option<ReorderRequest> {
    self.coordinator.reorder(&self.view, source, destination)
  }

  pub async fn finish_move(
    &mut self,
    gesture: GestureId,
    result: Result<(), RepositoryError>,
  ) -> MoveOutcome {
    let failed = result.is_err();
    let mut resynced = false;

    let mut reconcile = self.coordinator.complete(gesture, result);
    while let Reconcile::Refetch(ticket) = reconcile {
      reconcile = match self.repository.list_bookmarks().await {
        Ok(bookmarks) => {
          resynced |= self.coordinator.is_current(ticket);
          self.coordinator.apply_refetch(ticket, bookmarks)
        },
        Err(err) => {
          self.coordinator.refetch_failed(&err);
          Reconcile::Settled
        },
      };
    }

    match (failed, resynced) {
      (false, _) => MoveOutcome::Persisted,
      (true, true) => MoveOutcome::Reverted,
      (true, false) => MoveOutcome::RevertPending,
    }
  }

  /// Move, persist and reconcile in one go.
  pub async fn move_bookmark(&mut self, source: BookmarkId, destination: BookmarkId) -> MoveOutcome {
    let Some(request) = self.begin_move(source, destination) else {
      return MoveOutcome::Ignored;
    };
    let result = self.repository.persist_order(&request).await;
    self.finish_move(request.gesture, result).await
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use bookit_default::{
    InMemoryRepository,
    Phase,
    RecordingNavigator,
  };
  use bookit_lib::{
    CategoryId,
    Key,
    OrderingDimension,
  };

  use super::*;

  fn repository() -> Arc<InMemoryRepository> {
    let category = CategoryId(1);
    Arc::new(InMemoryRepository::new(vec![Category::new(1, "Dev")], vec![
      Bookmark::new(1, "GitHub", "https://github.com")
        .with_shortcut("gh")
        .with_category(category)
        .with_orders(0, 0),
      Bookmark::new(2, "Go", "https://go.dev")
        .with_shortcut("go")
        .with_category(category)
        .with_orders(1, 1),
      Bookmark::new(3, "Google", "https://google.com")
        .with_shortcut("goo")
        .with_orders(2, 0),
      Bookmark::new(4, "Docs", "https://docs.rs")
        .with_category(category)
        .with_orders(3, 2),
    ]))
  }

  async fn session() -> Session<InMemoryRepository, RecordingNavigator> {
    let mut session = Session::new(repository(), RecordingNavigator::default(), &Config::default());
    session.load().await.unwrap();
    session
  }

  fn type_str<R: BookmarkRepository, N: Navigator>(session: &mut Session<R, N>, text: &str) {
    for c in text.chars() {
      session.handle_key(KeyInput::new(c));
    }
  }

  #[tokio::test(start_paused = true)]
  async fn unambiguous_shortcut_opens_after_delay() {
    let mut session = session().await;
    type_str(&mut session, "gh");
    assert_eq!(session.snapshot().shortcut.phase(), Phase::Activating);
    assert!(session.navigator().opened().is_empty());

    session.next_timer_event().await.unwrap();
    assert_eq!(session.navigator().opened(), vec!["https://github.com".to_string()]);
    assert_eq!(session.snapshot().shortcut.phase(), Phase::Idle);
  }

  #[tokio::test(start_paused = true)]
  async fn escape_during_delay_prevents_navigation() {
    let mut session = session().await;
    type_str(&mut session, "gh");
    assert_eq!(session.handle_key(KeyInput::new(Key::Escape)), KeyOutcome::Handled);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!session.poll_timer());
    assert!(session.navigator().opened().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn enter_opens_ambiguous_exact_match() {
    let mut session = session().await;
    type_str(&mut session, "go");
    assert_eq!(session.snapshot().shortcut.phase(), Phase::Typing);

    session.handle_key(KeyInput::new(Key::Enter));
    // A second Enter while waiting must not schedule another navigation.
    session.handle_key(KeyInput::new(Key::Enter));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(session.poll_timer());
    assert_eq!(session.navigator().opened(), vec!["https://go.dev".to_string()]);
  }

  #[tokio::test]
  async fn move_persists_category_order() {
    let mut session = session().await;
    session.set_view(ViewState::category(CategoryId(1)));

    let outcome = session.move_bookmark(BookmarkId(4), BookmarkId(2)).await;
    assert_eq!(outcome, MoveOutcome::Persisted);

    let expected = vec![BookmarkId(1), BookmarkId(4), BookmarkId(2)];
    let visible: Vec<_> = session.snapshot().visible.iter().map(|b| b.id).collect();
    assert_eq!(visible, expected);
    assert_eq!(
      session.repository().order_of(OrderingDimension::Category(CategoryId(1))),
      expected
    );
    assert_eq!(
      session.repository().order_of(OrderingDimension::Global),
      vec![BookmarkId(1), BookmarkId(2), BookmarkId(3), BookmarkId(4)]
    );
  }

  #[tokio::test]
  async fn failed_persist_reverts_to_repository_order() {
    let mut session = session().await;
    session.repository().fail_next_persist();

    let outcome = session.move_bookmark(BookmarkId(1), BookmarkId(4)).await;
    assert_eq!(outcome, MoveOutcome::Reverted);
    assert_eq!(session.bookmarks(), session.repository().bookmarks().as_slice());
    let visible: Vec<_> = session.snapshot().visible.iter().map(|b| b.id).collect();
    assert_eq!(visible, vec![BookmarkId(1), BookmarkId(2), BookmarkId(3), BookmarkId(4)]);
  }

  #[tokio::test]
  async fn filtered_view_ignores_moves() {
    let mut session = session().await;
    session.set_view(ViewState::all().with_starred_only(true));
    assert_eq!(
      session.move_bookmark(BookmarkId(1), BookmarkId(2)).await,
      MoveOutcome::Ignored
    );
    session.set_view(ViewState::all().with_search("go"));
    assert_eq!(
      session.move_bookmark(BookmarkId(2), BookmarkId(3)).await,
      MoveOutcome::Ignored
    );
    assert_eq!(session.repository().persist_calls(), 0);
  }

  #[tokio::test]
  async fn overlapping_moves_reconcile_after_last_completion() {
    let mut session = session().await;
    let repository = Arc::clone(&session.repository);

    let first = session.begin_move(BookmarkId(1), BookmarkId(2)).unwrap();
    let second = session.begin_move(BookmarkId(4), BookmarkId(1)).unwrap();

    repository.fail_next_persist();
    let first_result = repository.persist_order(&first).await;
    let second_result = repository.persist_order(&second).await;

    assert_eq!(
      session.finish_move(first.gesture, first_result).await,
      MoveOutcome::RevertPending
    );
    // The optimistic second move is still shown while it is in flight.
    let visible: Vec<_> = session.snapshot().visible.iter().map(|b| b.id).collect();
    assert_eq!(visible, second.ordered_ids);

    assert_eq!(session.finish_move(second.gesture, second_result).await, MoveOutcome::Persisted);
    assert_eq!(session.bookmarks(), repository.bookmarks().as_slice());
  }

  #[test]
  fn activation_without_runtime_closes_the_bar() {
    let mut session = Session::new(repository(), RecordingNavigator::default(), &Config::default());
    tokio::runtime::Builder::new_current_thread()
      .build()
      .unwrap()
      .block_on(session.load())
      .unwrap();

    // No runtime here, so the confirmation delay cannot be scheduled.
    type_str(&mut session, "gh");
    assert_eq!(session.snapshot().shortcut.phase(), Phase::Idle);
    assert!(session.navigator().opened().is_empty());

    type_str(&mut session, "go");
    assert_eq!(session.snapshot().shortcut.phase(), Phase::Typing);
  }
}
