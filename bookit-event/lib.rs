//! Deferred, cancellable events for the interactive core.

mod timer;

pub use timer::{
  CancellableTimer,
  TimerToken,
};
