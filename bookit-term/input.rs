//! Input handling - routes crossterm key events to the view or the session.

use bookit_default::{
  BookmarkRepository,
  Navigator,
  Phase,
};
use bookit_lib::{
  Key,
  KeyEvent,
  KeyInput,
  Modifiers,
};
use crossterm::event::{
  KeyCode,
  KeyEvent as CrosstermKeyEvent,
  KeyEventKind,
  KeyModifiers,
};

use crate::app::{
  App,
  Focus,
};

/// Ctrl chords the view reacts to. The matcher never sees them as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Quit,
  CursorDown,
  CursorUp,
  MoveDown,
  MoveUp,
  ToggleStarred,
  CycleCategory,
  FocusSearch,
}

pub async fn handle_key<R, N>(app: &mut App<R, N>, event: CrosstermKeyEvent)
where
  R: BookmarkRepository,
  N: Navigator,
{
  if event.kind == KeyEventKind::Release {
    return;
  }
  let key_event = to_key_event(event);
  app.needs_render = true;

  if let Some(command) = command_for(&key_event) {
    run_command(app, command).await;
    return;
  }

  match app.focus {
    Focus::Search => handle_search_key(app, key_event),
    Focus::List => {
      let outcome = app.session.handle_key(KeyInput::new(key_event));
      if outcome.is_handled() || app.session.snapshot().shortcut.phase() != Phase::Idle {
        return;
      }
      match key_event.key {
        Key::Down => app.move_cursor(1),
        Key::Up => app.move_cursor(-1),
        _ => {},
      }
    },
  }
}

fn handle_search_key<R, N>(app: &mut App<R, N>, key_event: KeyEvent)
where
  R: BookmarkRepository,
  N: Navigator,
{
  // Focus is in a text field, so this only confirms the matcher stays out.
  app.session.handle_key(KeyInput::in_text_entry(key_event));

  match key_event.key {
    Key::Enter | Key::NumpadEnter | Key::Escape => app.blur_search(),
    Key::Backspace => app.pop_search(),
    _ => {
      if let Some(c) = key_event.printable() {
        app.push_search(c);
      }
    },
  }
}

async fn run_command<R, N>(app: &mut App<R, N>, command: Command)
where
  R: BookmarkRepository,
  N: Navigator,
{
  match command {
    Command::Quit => app.should_quit = true,
    Command::CursorDown => app.move_cursor(1),
    Command::CursorUp => app.move_cursor(-1),
    Command::MoveDown => app.move_selected(1).await,
    Command::MoveUp => app.move_selected(-1).await,
    Command::ToggleStarred => app.toggle_starred(),
    Command::CycleCategory => app.cycle_category(),
    Command::FocusSearch => app.focus_search(),
  }
}

pub fn command_for(event: &KeyEvent) -> Option<Command> {
  if !event.modifiers.ctrl() {
    return None;
  }
  let Key::Char(c) = event.key else {
    return None;
  };
  match c.to_ascii_lowercase() {
    'c' => Some(Command::Quit),
    'n' => Some(Command::CursorDown),
    'p' => Some(Command::CursorUp),
    'j' => Some(Command::MoveDown),
    'k' => Some(Command::MoveUp),
    's' => Some(Command::ToggleStarred),
    't' => Some(Command::CycleCategory),
    'f' => Some(Command::FocusSearch),
    _ => None,
  }
}

pub fn to_key_event(event: CrosstermKeyEvent) -> KeyEvent {
  KeyEvent::new(to_key(event.code)).with_modifiers(to_modifiers(event.modifiers))
}

fn to_key(code: KeyCode) -> Key {
  match code {
    KeyCode::Char(c) => Key::Char(c),
    KeyCode::Enter => Key::Enter,
    KeyCode::Tab | KeyCode::BackTab => Key::Tab,
    KeyCode::Esc => Key::Escape,
    KeyCode::Backspace => Key::Backspace,
    KeyCode::Delete => Key::Delete,
    KeyCode::Home => Key::Home,
    KeyCode::End => Key::End,
    KeyCode::PageUp => Key::PageUp,
    KeyCode::PageDown => Key::PageDown,
    KeyCode::Left => Key::Left,
    KeyCode::Right => Key::Right,
    KeyCode::Up => Key::Up,
    KeyCode::Down => Key::Down,
    _ => Key::Other,
  }
}

fn to_modifiers(modifiers: KeyModifiers) -> Modifiers {
  let mut out = Modifiers::empty();
  if modifiers.contains(KeyModifiers::CONTROL) {
    out.insert(Modifiers::CTRL);
  }
  if modifiers.contains(KeyModifiers::ALT) {
    out.insert(Modifiers::ALT);
  }
  if modifiers.contains(KeyModifiers::SHIFT) {
    out.insert(Modifiers::SHIFT);
  }
  if modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META) {
    out.insert(Modifiers::META);
  }
  out
}
