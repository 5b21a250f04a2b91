//! A single-slot timer that delivers an event through a channel once its
//! delay elapses, unless it was cancelled first.

use std::time::Duration;

use tokio::{
  sync::mpsc::{
    self,
    Receiver,
    Sender,
  },
  task::JoinHandle,
};

/// Identifies one scheduled action. Issued by the caller, compared on
/// cancellation so a stale cancel cannot abort a newer action.
pub type TimerToken = u64;

struct Pending {
  token:  TimerToken,
  handle: JoinHandle<()>,
}

/// At most one action is outstanding: scheduling replaces (aborts) the
/// previous one.
pub struct CancellableTimer<T> {
  tx:      Sender<T>,
  pending: Option<Pending>,
}

impl<T: Send + 'static> CancellableTimer<T> {
  pub fn new(tx: Sender<T>) -> Self {
    Self { tx, pending: None }
  }

  pub fn channel(capacity: usize) -> (Self, Receiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Self::new(tx), rx)
  }

  pub fn pending_token(&self) -> Option<TimerToken> {
    self
      .pending
      .as_ref()
      .filter(|pending| !pending.handle.is_finished())
      .map(|pending| pending.token)
  }

  /// Deliver `event` after `delay`. Must be called inside a tokio runtime;
  /// outside of one the action is dropped and `false` is returned.
  pub fn schedule(&mut self, token: TimerToken, delay: Duration, event: T) -> bool {
    self.cancel_all();

    if tokio::runtime::Handle::try_current().is_err() {
      tracing::warn!(token, "no tokio runtime, dropping scheduled action");
      return false;
    }

    let tx = self.tx.clone();
    let handle = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      if tx.send(event).await.is_err() {
        tracing::debug!(token, "timer receiver dropped before delivery");
      }
    });
    self.pending = Some(Pending { token, handle });
    true
  }

  /// Cancel the outstanding action if it carries `token`.
  /// Returns whether something was aborted.
  pub fn cancel(&mut self, token: TimerToken) -> bool {
    match &self.pending {
      Some(pending) if pending.token == token => {
        self.cancel_all();
        true
      },
      _ => false,
    }
  }

  pub fn cancel_all(&mut self) {
    if let Some(pending) = self.pending.take() {
      pending.handle.abort();
    }
  }
}

impl<T> Drop for CancellableTimer<T> {
  fn drop(&mut self) {
    if let Some(pending) = self.pending.take() {
      pending.handle.abort();
    }
  }
}
