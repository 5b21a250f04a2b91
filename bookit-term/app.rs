//! Surface state around the session: cursor, focus and status line.

use bookit_default::{
  BookmarkRepository,
  Navigator,
};
use bookit_lib::ViewState;
use bookit_runtime::{
  MoveOutcome,
  Session,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  List,
  /// The search field owns the keyboard; the matcher sees text entry.
  Search,
}

pub struct App<R, N> {
  pub session:      Session<R, N>,
  pub cursor:       usize,
  pub focus:        Focus,
  pub status:       Option<String>,
  pub should_quit:  bool,
  pub needs_render: bool,
}

impl<R, N> App<R, N>
where
  R: BookmarkRepository,
  N: Navigator,
{
  pub fn new(session: Session<R, N>) -> Self {
    Self {
      session,
      cursor: 0,
      focus: Focus::List,
      status: None,
      should_quit: false,
      needs_render: true,
    }
  }

  fn visible_len(&self) -> usize {
    self.session.snapshot().visible.len()
  }

  pub fn move_cursor(&mut self, delta: isize) {
    let len = self.visible_len();
    if len == 0 {
      self.cursor = 0;
      return;
    }
    self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
  }

  fn clamp_cursor(&mut self) {
    self.move_cursor(0);
  }

  /// Drag the bookmark under the cursor one row up or down.
  pub async fn move_selected(&mut self, delta: isize) {
    let visible = self.session.snapshot().visible;
    let Some(source) = visible.get(self.cursor) else {
      return;
    };
    let Some(destination) = self
      .cursor
      .checked_add_signed(delta)
      .and_then(|index| visible.get(index))
    else {
      return;
    };

    match self.session.move_bookmark(source.id, destination.id).await {
      MoveOutcome::Persisted => {
        self.status = None;
        self.move_cursor(delta);
      },
      MoveOutcome::Reverted | MoveOutcome::RevertPending => {
        self.status = Some("Could not save the new order".into());
        self.clamp_cursor();
      },
      MoveOutcome::Ignored => {
        if self.session.view().is_filtered() {
          self.status = Some("Clear search and starred filter to reorder".into());
        }
      },
    }
  }

  pub fn toggle_starred(&mut self) {
    let view = self.session.view().clone();
    let starred_only = !view.starred_only;
    self.set_view(view.with_starred_only(starred_only));
  }

  /// All, then each category in order, then back to All.
  pub fn cycle_category(&mut self) {
    let snapshot = self.session.snapshot();
    let next = match snapshot.view.selected_category {
      None => snapshot.categories.first().map(|category| category.id),
      Some(current) => snapshot
        .categories
        .iter()
        .skip_while(|category| category.id != current)
        .nth(1)
        .map(|category| category.id),
    };
    let mut view = snapshot.view;
    view.selected_category = next;
    self.set_view(view);
  }

  pub fn focus_search(&mut self) {
    self.session.cancel_shortcut();
    self.focus = Focus::Search;
  }

  pub fn blur_search(&mut self) {
    self.focus = Focus::List;
  }

  pub fn push_search(&mut self, c: char) {
    let mut search = self.session.view().search.clone();
    search.push(c);
    let view = self.session.view().clone().with_search(search);
    self.set_view(view);
  }

  pub fn pop_search(&mut self) {
    let mut search = self.session.view().search.clone();
    if search.pop().is_some() {
      let view = self.session.view().clone().with_search(search);
      self.set_view(view);
    }
  }

  fn set_view(&mut self, view: ViewState) {
    self.session.set_view(view);
    self.status = None;
    self.cursor = 0;
  }
}
