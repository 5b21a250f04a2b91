//! Side-effectful hosts for the interactive core.
//!
//! The engines in `bookit-default` are pure; this crate owns the timer, the
//! repository calls and URL opening, and belongs in app layers.

mod file_repository;
mod session;

pub use file_repository::{
  FileRepository,
  RepositoryFile,
};
pub use session::{
  MoveOutcome,
  Session,
  SessionSnapshot,
};
