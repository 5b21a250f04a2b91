//! `bookit export` / `bookit import`.

use std::{
  fs,
  path::Path,
};

use bookit_lib::export::{
  ExportDocument,
  ImportSummary,
};
use bookit_runtime::{
  FileRepository,
  RepositoryFile,
};
use eyre::{
  Result,
  WrapErr,
};

pub fn export_document(file: &Path) -> Result<String> {
  let repository = FileRepository::new(file);
  let RepositoryFile {
    categories,
    bookmarks,
  } = repository
    .read()
    .wrap_err_with(|| format!("failed to read {}", file.display()))?;

  let document = ExportDocument::from_snapshot(&categories, &bookmarks, chrono::Utc::now());
  Ok(document.to_json_pretty()?)
}

/// Merge an export document into `file`, creating it when missing.
pub fn import_document(export: &Path, file: &Path) -> Result<ImportSummary> {
  let json = fs::read_to_string(export)
    .wrap_err_with(|| format!("failed to read {}", export.display()))?;
  let document = ExportDocument::from_json(&json)
    .wrap_err_with(|| format!("invalid export document {}", export.display()))?;

  let repository = FileRepository::new(file);
  let mut store = repository
    .read()
    .wrap_err_with(|| format!("failed to read {}", file.display()))?;
  let summary = document.merge_into(&mut store.categories, &mut store.bookmarks);
  repository
    .write(&store)
    .wrap_err_with(|| format!("failed to write {}", file.display()))?;

  log::info!(
    "imported into {}: {} bookmarks created, {} skipped, {} categories created",
    file.display(),
    summary.bookmarks_created,
    summary.bookmarks_skipped,
    summary.categories_created
  );
  Ok(summary)
}
