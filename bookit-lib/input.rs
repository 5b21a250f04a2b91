//! Key input types forwarded by a rendering surface.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
  bits: u8,
}

impl Modifiers {
  pub const CTRL: u8 = 0b0000_0001;
  pub const ALT: u8 = 0b0000_0010;
  pub const SHIFT: u8 = 0b0000_0100;
  pub const META: u8 = 0b0000_1000;

  #[must_use]
  pub const fn empty() -> Self {
    Self { bits: 0 }
  }

  #[must_use]
  pub const fn from_bits(bits: u8) -> Self {
    Self { bits }
  }

  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.bits == 0
  }

  #[must_use]
  pub const fn ctrl(self) -> bool {
    (self.bits & Self::CTRL) != 0
  }

  #[must_use]
  pub const fn alt(self) -> bool {
    (self.bits & Self::ALT) != 0
  }

  #[must_use]
  pub const fn shift(self) -> bool {
    (self.bits & Self::SHIFT) != 0
  }

  #[must_use]
  pub const fn meta(self) -> bool {
    (self.bits & Self::META) != 0
  }

  /// True when a modifier that turns a key into a command chord is held.
  /// Shift is not one of them: it only changes the character produced.
  #[must_use]
  pub const fn is_chord(self) -> bool {
    self.ctrl() || self.alt() || self.meta()
  }

  pub fn insert(&mut self, bits: u8) {
    self.bits |= bits;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
  Char(char),
  Enter,
  NumpadEnter,
  Escape,
  Backspace,
  Tab,
  Delete,
  Home,
  End,
  PageUp,
  PageDown,
  Left,
  Right,
  Up,
  Down,
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
  pub key:       Key,
  pub modifiers: Modifiers,
}

impl KeyEvent {
  #[must_use]
  pub const fn new(key: Key) -> Self {
    Self {
      key,
      modifiers: Modifiers::empty(),
    }
  }

  #[must_use]
  pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
    self.modifiers = modifiers;
    self
  }

  /// The character this event types, if it is a single printable character
  /// with no chord modifier held.
  #[must_use]
  pub fn printable(&self) -> Option<char> {
    if self.modifiers.is_chord() {
      return None;
    }
    match self.key {
      Key::Char(c) if !c.is_control() => Some(c),
      _ => None,
    }
  }
}

impl From<char> for KeyEvent {
  fn from(c: char) -> Self {
    Self::new(Key::Char(c))
  }
}

impl From<Key> for KeyEvent {
  fn from(key: Key) -> Self {
    Self::new(key)
  }
}

/// A key event together with where keyboard focus was when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
  pub event:         KeyEvent,
  /// Focus is inside an input, textarea or content-editable surface.
  pub in_text_entry: bool,
}

impl KeyInput {
  #[must_use]
  pub fn new(event: impl Into<KeyEvent>) -> Self {
    Self {
      event:         event.into(),
      in_text_entry: false,
    }
  }

  #[must_use]
  pub fn in_text_entry(event: impl Into<KeyEvent>) -> Self {
    Self {
      event:         event.into(),
      in_text_entry: true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOutcome {
  /// Not ours; let the surface apply its default handling.
  #[default]
  Continue,
  /// Consumed; the surface must suppress the default action.
  Handled,
}

impl KeyOutcome {
  #[must_use]
  pub const fn is_handled(self) -> bool {
    matches!(self, Self::Handled)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shift_does_not_block_printable_chars() {
    let mut modifiers = Modifiers::empty();
    modifiers.insert(Modifiers::SHIFT);
    let event = KeyEvent::new(Key::Char('G')).with_modifiers(modifiers);
    assert_eq!(event.printable(), Some('G'));
  }

  #[test]
  fn chord_modifiers_block_printable_chars() {
    for bits in [Modifiers::CTRL, Modifiers::ALT, Modifiers::META] {
      let event = KeyEvent::new(Key::Char('g')).with_modifiers(Modifiers::from_bits(bits));
      assert_eq!(event.printable(), None);
    }
  }

  #[test]
  fn control_chars_and_named_keys_are_not_printable() {
    assert_eq!(KeyEvent::from('\u{7f}').printable(), None);
    assert_eq!(KeyEvent::from(Key::Enter).printable(), None);
    assert_eq!(KeyEvent::from(' ').printable(), Some(' '));
  }
}
