//! Cache layout for a script.
//!
//! A script at `dir/name.ext` compiles to `dir/.cache/name`, or to
//! `dir/.cache/{os}_{arch}/name` in shared mode.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{CACHE_DIR_NAME, LOCK_FILENAME, OBJECT_STEM};
use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum PathError {
  #[error("script path has no file name: {0}")]
  NoFileName(PathBuf),

  #[error("could not make directory {path}: {source}")]
  CreateCacheDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Where everything belonging to one script lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPaths {
  pub script: PathBuf,
  pub script_dir: PathBuf,
  pub cache_dir: PathBuf,
  pub binary: PathBuf,
}

impl ScriptPaths {
  /// Resolve paths for `script` on the native platform.
  pub fn resolve(script: &Path, shared: bool) -> Result<Self, PathError> {
    let platform = shared.then(Platform::native);
    Self::resolve_for(script, platform.as_ref())
  }

  /// Resolve paths for `script`, namespacing the cache by `platform` if given.
  pub fn resolve_for(script: &Path, platform: Option<&Platform>) -> Result<Self, PathError> {
    let stem = script
      .file_stem()
      .ok_or_else(|| PathError::NoFileName(script.to_path_buf()))?;

    let script_dir = match script.parent() {
      Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
      _ => PathBuf::from("."),
    };

    let mut cache_dir = script_dir.join(CACHE_DIR_NAME);
    if let Some(platform) = platform {
      cache_dir.push(platform.cache_tag());
    }
    let binary = cache_dir.join(stem);

    Ok(Self {
      script: script.to_path_buf(),
      script_dir,
      cache_dir,
      binary,
    })
  }

  /// Intermediate object written by the compiler and read by the linker.
  pub fn object(&self, object_ext: char) -> PathBuf {
    self.cache_dir.join(format!("{}.{}", OBJECT_STEM, object_ext))
  }

  /// Where the linker writes before the result is moved onto `binary`.
  pub fn staged_binary(&self) -> PathBuf {
    self
      .cache_dir
      .join(format!("{}.{}.tmp", self.stem(), std::process::id()))
  }

  pub fn lock_file(&self) -> PathBuf {
    self.cache_dir.join(LOCK_FILENAME)
  }

  /// Name of the script without directory or extension.
  pub fn stem(&self) -> String {
    self
      .binary
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  /// Create the cache directory (and parents) if it does not exist yet.
  pub fn ensure_cache_dir(&self) -> Result<(), PathError> {
    if self.cache_dir.is_dir() {
      return Ok(());
    }

    debug!(path = %self.cache_dir.display(), "creating cache directory");
    create_dir_restricted(&self.cache_dir).map_err(|source| PathError::CreateCacheDir {
      path: self.cache_dir.clone(),
      source,
    })
  }
}

#[cfg(unix)]
fn create_dir_restricted(path: &Path) -> io::Result<()> {
  use std::os::unix::fs::DirBuilderExt;

  std::fs::DirBuilder::new()
    .recursive(true)
    .mode(crate::consts::CACHE_DIR_MODE)
    .create(path)
}

#[cfg(not(unix))]
fn create_dir_restricted(path: &Path) -> io::Result<()> {
  std::fs::create_dir_all(path)
}
