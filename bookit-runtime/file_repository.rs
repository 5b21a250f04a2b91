//! A JSON file as the authoritative bookmark store.

use std::{
  fs,
  io::{
    self,
    Write,
  },
  path::{
    Path,
    PathBuf,
  },
};

use async_trait::async_trait;
use bookit_default::{
  BookmarkRepository,
  ReorderRequest,
  RepositoryError,
  apply_order,
};
use bookit_lib::{
  Bookmark,
  Category,
};
use parking_lot::Mutex;
use serde::{
  Deserialize,
  Serialize,
};
use tempfile::NamedTempFile;

/// On-disk layout. Unlike an export document this keeps ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryFile {
  pub categories: Vec<Category>,
  pub bookmarks:  Vec<Bookmark>,
}

/// Reads the file on every list and rewrites it atomically on every
/// persisted reorder. A missing file is an empty store.
#[derive(Debug)]
pub struct FileRepository {
  path:  PathBuf,
  write: Mutex<()>,
}

impl FileRepository {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path:  path.into(),
      write: Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn read(&self) -> Result<RepositoryFile, RepositoryError> {
    match fs::read_to_string(&self.path) {
      Ok(text) => Ok(serde_json::from_str(&text)?),
      Err(err) if err.kind() == io::ErrorKind::NotFound => {
        tracing::debug!(path = %self.path.display(), "bookmark file missing, starting empty");
        Ok(RepositoryFile::default())
      },
      Err(err) => Err(err.into()),
    }
  }

  /// Replace the whole store.
  pub fn write(&self, file: &RepositoryFile) -> Result<(), RepositoryError> {
    let _guard = self.write.lock();
    self.write_locked(file)
  }

  fn write_locked(&self, file: &RepositoryFile) -> Result<(), RepositoryError> {
    let dir = match self.path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut temp, file)?;
    temp.write_all(b"\n")?;
    temp.as_file().sync_all()?;
    temp.persist(&self.path).map_err(|err| err.error)?;
    tracing::debug!(
      path = %self.path.display(),
      bookmarks = file.bookmarks.len(),
      "wrote bookmark file"
    );
    Ok(())
  }
}

#[async_trait]
impl BookmarkRepository for FileRepository {
  async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, RepositoryError> {
    Ok(self.read()?.bookmarks)
  }

  async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
    Ok(self.read()?.categories)
  }

  async fn persist_order(&self, request: &ReorderRequest) -> Result<(), RepositoryError> {
    let _guard = self.write.lock();
    let mut file = self.read()?;
    apply_order(&mut file.bookmarks, request)?;
    self.write_locked(&file)
  }
}
