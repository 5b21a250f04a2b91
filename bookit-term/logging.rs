//! Log file setup. Library crates log through `tracing`, which forwards to
//! `log` and ends up here.

use std::path::Path;

use eyre::{
  Result,
  WrapErr,
};
use log::LevelFilter;

pub fn init(path: &Path, verbose: bool) -> Result<()> {
  let level = if verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };

  let file = fern::log_file(path)
    .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;

  fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {:<5} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.level(),
        record.target(),
        message
      ))
    })
    .level(level)
    .chain(file)
    .apply()
    .wrap_err("logger already initialised")?;

  log::debug!("logging to {}", path.display());
  Ok(())
}
