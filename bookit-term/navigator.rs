use std::io;

use bookit_default::Navigator;

/// Hands URLs to the platform's default handler, detached from our terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNavigator;

impl Navigator for SystemNavigator {
  fn open(&self, url: &str) {
    match open_link(url) {
      Ok(()) => log::info!("opened {url}"),
      Err(err) => log::warn!("failed to open {url}: {err}"),
    }
  }
}

#[cfg(not(test))]
fn open_link(url: &str) -> io::Result<()> {
  open::that_detached(url)
}

#[cfg(test)]
fn open_link(url: &str) -> io::Result<()> {
  tests::OPENED.with(|opened| opened.borrow_mut().push(url.to_string()));
  Ok(())
}
