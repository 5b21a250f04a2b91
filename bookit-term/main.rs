//! Terminal client for bookit.
//!
//! Shows the bookmark list of a JSON bookmarks file, opens bookmarks by typing
//! their shortcut and reorders them with Ctrl-J/Ctrl-K.

mod app;
mod input;
mod logging;
mod navigator;
mod render;
mod terminal;
mod transfer;

use std::{
  path::PathBuf,
  sync::Arc,
  time::Duration,
};

use bookit_lib::Config;
use bookit_runtime::{
  FileRepository,
  Session,
};
use clap::{
  Parser,
  Subcommand,
};
use crossterm::event::{
  self,
  Event,
};
use eyre::{
  Result,
  WrapErr,
};

use crate::{
  app::App,
  navigator::SystemNavigator,
  render::Chrome,
};

/// Short enough that the activation delay is not noticeably stretched.
const POLL_INTERVAL: Duration = Duration::from_millis(15);

type TermApp = App<FileRepository, SystemNavigator>;

#[derive(Debug, Parser)]
#[command(name = "bookit")]
#[command(about = "Keyboard-driven bookmark manager")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
  /// TOML config file
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Log file (defaults to bookit.log in the temp directory)
  #[arg(long, global = true)]
  log: Option<PathBuf>,

  /// Log at debug level
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,

  /// Bookmarks file to open
  #[arg(default_value = "bookmarks.json")]
  file: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Commands {
  /// Print an export document for a bookmarks file
  Export { file: PathBuf },
  /// Merge an export document into a bookmarks file
  Import { export: PathBuf, file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let log_path = cli
    .log
    .clone()
    .unwrap_or_else(|| std::env::temp_dir().join("bookit.log"));
  logging::init(&log_path, cli.verbose)?;

  match cli.command {
    Some(Commands::Export { file }) => {
      println!("{}", transfer::export_document(&file)?);
      Ok(())
    },
    Some(Commands::Import { export, file }) => {
      let summary = transfer::import_document(&export, &file)?;
      println!(
        "{}: {} bookmarks imported, {} already present; {} categories created",
        file.display(),
        summary.bookmarks_created,
        summary.bookmarks_skipped,
        summary.categories_created
      );
      Ok(())
    },
    None => run_interactive(cli.file, cli.config).await,
  }
}

async fn run_interactive(file: PathBuf, config: Option<PathBuf>) -> Result<()> {
  let config = match config {
    Some(path) => Config::load(&path).wrap_err("failed to load config")?,
    None => Config::default(),
  };

  let repository = Arc::new(FileRepository::new(&file));
  let mut session = Session::new(repository, SystemNavigator, &config);
  session
    .load()
    .await
    .wrap_err_with(|| format!("failed to load {}", file.display()))?;
  log::info!("opened {}", file.display());

  let mut app = App::new(session);
  let mut terminal = terminal::Terminal::new()?;
  terminal.enter_raw_mode()?;
  let result = event_loop(&mut app, &mut terminal).await;
  terminal.leave_raw_mode()?;
  result
}

async fn event_loop(app: &mut TermApp, terminal: &mut terminal::Terminal) -> Result<()> {
  loop {
    if app.needs_render {
      let snapshot = app.session.snapshot();
      let chrome = Chrome {
        cursor: app.cursor,
        focus:  app.focus,
        status: app.status.as_deref(),
      };
      render::render(&snapshot, &chrome, terminal)?;
      app.needs_render = false;
    }

    if app.should_quit {
      return Ok(());
    }

    if event::poll(POLL_INTERVAL)? {
      match event::read()? {
        Event::Key(key) => input::handle_key(app, key).await,
        Event::FocusLost => {
          app.session.cancel_shortcut();
          app.needs_render = true;
        },
        Event::Resize(..) => app.needs_render = true,
        _ => {},
      }
    }

    if app.session.poll_timer() {
      app.needs_render = true;
    }
  }
}
