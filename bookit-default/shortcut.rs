//! Typed shortcut sequences.
//!
//! Keystrokes outside of text entry are read as a prefix search over the
//! bookmarks' shortcut strings. An unambiguous exact match activates on its
//! own; an exact match that is also the prefix of longer shortcuts waits for
//! Enter or more characters. Activation is deferred by a short confirmation
//! delay so the surface can show what is about to open, and Escape can still
//! call it off.
//!
//! The state machine is a pure function of `(state, event, bookmarks)`. Timers
//! and navigation are described as [`ShortcutEffect`]s for the host to carry
//! out; the host reports an elapsed timer back as
//! [`MatcherEvent::ActivationElapsed`].

use std::time::Duration;

use bookit_lib::{
  Bookmark,
  BookmarkId,
  Key,
  KeyInput,
  KeyOutcome,
  ShortcutConfig,
};
use smallvec::SmallVec;

pub type ActivationToken = u64;

/// Which entry Enter would open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
  /// The exact match slot.
  #[default]
  Exact,
  /// Index into the potential matches.
  Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Typing,
  Activating,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortcutState {
  pub is_open:            bool,
  /// Lower-cased characters typed so far.
  pub sequence:           String,
  pub exact_match:        Option<Bookmark>,
  pub has_longer_matches: bool,
  /// Shortcuts extending `sequence`, capped for display.
  pub potential_matches:  Vec<Bookmark>,
  pub selected:           Selection,
  /// Set only while an activation is waiting for its confirmation delay.
  pub activated:          Option<Bookmark>,
  pending:                Option<ActivationToken>,
  next_token:             ActivationToken,
}

impl ShortcutState {
  #[must_use]
  pub fn phase(&self) -> Phase {
    if self.activated.is_some() {
      Phase::Activating
    } else if self.is_open {
      Phase::Typing
    } else {
      Phase::Idle
    }
  }

  pub fn pending_activation(&self) -> Option<ActivationToken> {
    self.pending
  }

  /// The exact match slot is only selectable while longer shortcuts compete
  /// with it.
  #[must_use]
  pub fn exact_slot_selectable(&self) -> bool {
    self.exact_match.is_some() && self.has_longer_matches
  }

  /// The bookmark Enter would open, if any.
  pub fn selected_bookmark(&self) -> Option<&Bookmark> {
    match self.selected {
      Selection::Exact => self.exact_match.as_ref(),
      Selection::Index(index) => self.potential_matches.get(index),
    }
  }

  /// Back to rest. The token counter survives so tokens never repeat.
  fn idle(&self) -> Self {
    Self {
      next_token: self.next_token,
      ..Self::default()
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherEvent {
  Key(KeyInput),
  ActivationElapsed { token: ActivationToken },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutEffect {
  ScheduleActivation {
    token: ActivationToken,
    delay: Duration,
  },
  CancelActivation {
    token: ActivationToken,
  },
  /// Open `url` in a new, unrelated browsing context.
  Navigate {
    bookmark_id: BookmarkId,
    url:         String,
  },
}

pub type Effects = SmallVec<[ShortcutEffect; 2]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  pub state:   ShortcutState,
  pub effects: Effects,
  pub outcome: KeyOutcome,
}

impl Transition {
  fn unchanged(state: &ShortcutState, outcome: KeyOutcome) -> Self {
    Self {
      state: state.clone(),
      effects: Effects::new(),
      outcome,
    }
  }

  fn to(state: ShortcutState) -> Self {
    Self {
      state,
      effects: Effects::new(),
      outcome: KeyOutcome::Handled,
    }
  }
}

struct Matches {
  exact:      Option<Bookmark>,
  has_longer: bool,
  potential:  Vec<Bookmark>,
}

/// Scan `bookmarks` against `sequence`. The first exact match in iteration
/// order wins, so duplicated shortcuts resolve deterministically.
fn find_matches(sequence: &str, bookmarks: &[Bookmark], limit: usize) -> Matches {
  let mut matches = Matches {
    exact:      None,
    has_longer: false,
    potential:  Vec::new(),
  };

  for bookmark in bookmarks {
    let Some(shortcut) = bookmark.shortcut_key() else {
      continue;
    };
    if shortcut == sequence {
      if matches.exact.is_none() {
        matches.exact = Some(bookmark.clone());
      }
    } else if shortcut.starts_with(sequence) {
      matches.has_longer = true;
      if matches.potential.len() < limit {
        matches.potential.push(bookmark.clone());
      }
    }
  }

  matches
}

fn open_with(state: &ShortcutState, sequence: String, matches: Matches) -> ShortcutState {
  ShortcutState {
    is_open: true,
    sequence,
    exact_match: matches.exact,
    has_longer_matches: matches.has_longer,
    potential_matches: matches.potential,
    selected: Selection::Exact,
    activated: None,
    pending: None,
    next_token: state.next_token,
  }
}

/// Enter `Activating` for `bookmark`. Dropped if an activation is already
/// pending.
fn activate(mut state: ShortcutState, bookmark: Bookmark, config: &ShortcutConfig) -> Transition {
  if state.pending.is_some() {
    return Transition::to(state);
  }

  let token = state.next_token;
  state.next_token = state.next_token.wrapping_add(1);
  state.pending = Some(token);
  tracing::debug!(
    bookmark = %bookmark.id,
    sequence = %state.sequence,
    token,
    "shortcut activated"
  );
  state.activated = Some(bookmark);

  let mut transition = Transition::to(state);
  transition.effects.push(ShortcutEffect::ScheduleActivation {
    token,
    delay: config.activation_delay(),
  });
  transition
}

fn cancel(state: &ShortcutState) -> Transition {
  let mut transition = Transition::to(state.idle());
  if let Some(token) = state.pending {
    tracing::debug!(token, "pending activation cancelled");
    transition
      .effects
      .push(ShortcutEffect::CancelActivation { token });
  }
  transition
}

fn type_char(
  state: &ShortcutState,
  c: char,
  bookmarks: &[Bookmark],
  config: &ShortcutConfig,
) -> Transition {
  let mut sequence = state.sequence.clone();
  sequence.extend(c.to_lowercase());

  let matches = find_matches(&sequence, bookmarks, config.max_potential_matches);
  let unambiguous = matches.exact.clone().filter(|_| !matches.has_longer);
  let next = open_with(state, sequence, matches);

  match unambiguous {
    Some(bookmark) => activate(next, bookmark, config),
    None => Transition::to(next),
  }
}

/// Backspace never activates, even when it leaves an unambiguous exact match.
fn backspace(state: &ShortcutState, bookmarks: &[Bookmark], config: &ShortcutConfig) -> Transition {
  let mut sequence = state.sequence.clone();
  sequence.pop();
  if sequence.is_empty() {
    return cancel(state);
  }

  let matches = find_matches(&sequence, bookmarks, config.max_potential_matches);
  Transition::to(open_with(state, sequence, matches))
}

fn move_selection(state: &ShortcutState, down: bool) -> Transition {
  let last = state.potential_matches.len().checked_sub(1);
  let selected = match (state.selected, down, last) {
    (Selection::Exact, true, Some(_)) => Selection::Index(0),
    (Selection::Index(index), true, Some(last)) => Selection::Index((index + 1).min(last)),
    (Selection::Index(0), false, _) if state.exact_slot_selectable() => Selection::Exact,
    (Selection::Index(index), false, _) => Selection::Index(index.saturating_sub(1)),
    (Selection::Exact, false, Some(_)) if !state.exact_slot_selectable() => Selection::Index(0),
    (selected, ..) => selected,
  };

  let mut next = state.clone();
  next.selected = selected;
  Transition::to(next)
}

fn confirm(state: &ShortcutState, config: &ShortcutConfig) -> Transition {
  match state.selected_bookmark() {
    Some(bookmark) => activate(state.clone(), bookmark.clone(), config),
    // Swallowed regardless so an enclosing form is not submitted.
    None => Transition::unchanged(state, KeyOutcome::Handled),
  }
}

fn elapsed(state: &ShortcutState, token: ActivationToken) -> Transition {
  let (Some(pending), Some(bookmark)) = (state.pending, state.activated.as_ref()) else {
    return Transition::unchanged(state, KeyOutcome::Continue);
  };
  if pending != token {
    return Transition::unchanged(state, KeyOutcome::Continue);
  }

  let mut transition = Transition::to(state.idle());
  transition.outcome = KeyOutcome::Continue;
  transition.effects.push(ShortcutEffect::Navigate {
    bookmark_id: bookmark.id,
    url:         bookmark.url.clone(),
  });
  transition
}

/// Apply one event. Matches are always computed against `bookmarks` as
/// passed for this event; a list that changed since the previous keystroke is
/// only noticed here.
pub fn transition(
  state: &ShortcutState,
  event: MatcherEvent,
  bookmarks: &[Bookmark],
  config: &ShortcutConfig,
) -> Transition {
  let input = match event {
    MatcherEvent::ActivationElapsed { token } => return elapsed(state, token),
    MatcherEvent::Key(input) => input,
  };

  if input.in_text_entry || input.event.modifiers.is_chord() {
    return Transition::unchanged(state, KeyOutcome::Continue);
  }

  let key = input.event.key;
  if key == Key::Escape {
    return if state.is_open {
      cancel(state)
    } else {
      Transition::unchanged(state, KeyOutcome::Continue)
    };
  }

  if state.phase() == Phase::Activating {
    return Transition::unchanged(state, KeyOutcome::Handled);
  }

  match key {
    Key::Enter | Key::NumpadEnter if state.is_open => confirm(state, config),
    Key::Backspace if state.is_open => backspace(state, bookmarks, config),
    Key::Down if state.is_open => move_selection(state, true),
    Key::Up if state.is_open => move_selection(state, false),
    _ => {
      match input.event.printable() {
        Some(c) => type_char(state, c, bookmarks, config),
        None => Transition::unchanged(state, KeyOutcome::Continue),
      }
    },
  }
}

/// Owns a [`ShortcutState`] and feeds it through [`transition`].
#[derive(Debug, Clone, Default)]
pub struct ShortcutMatcher {
  state:  ShortcutState,
  config: ShortcutConfig,
}

impl ShortcutMatcher {
  pub fn new(config: ShortcutConfig) -> Self {
    Self {
      state: ShortcutState::default(),
      config,
    }
  }

  pub fn state(&self) -> &ShortcutState {
    &self.state
  }

  pub fn config(&self) -> &ShortcutConfig {
    &self.config
  }

  pub fn phase(&self) -> Phase {
    self.state.phase()
  }

  pub fn handle(&mut self, event: MatcherEvent, bookmarks: &[Bookmark]) -> (KeyOutcome, Effects) {
    let Transition {
      state,
      effects,
      outcome,
    } = transition(&self.state, event, bookmarks, &self.config);
    self.state = state;
    (outcome, effects)
  }

  pub fn handle_key(&mut self, input: KeyInput, bookmarks: &[Bookmark]) -> (KeyOutcome, Effects) {
    self.handle(MatcherEvent::Key(input), bookmarks)
  }

  pub fn activation_elapsed(&mut self, token: ActivationToken) -> Effects {
    self.handle(MatcherEvent::ActivationElapsed { token }, &[]).1
  }

  /// Drop any sequence in progress, as Escape would.
  pub fn reset(&mut self) -> Effects {
    let Transition { state, effects, .. } = cancel(&self.state);
    self.state = state;
    effects
  }
}
