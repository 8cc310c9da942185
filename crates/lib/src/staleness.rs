//! Rebuild decisions from modification times.
//!
//! A successful build pins the binary's mtime to the script's mtime, so the
//! two compare equal until the script is touched again. The comparison never
//! involves the wall clock, which keeps it exact across machines sharing a
//! filesystem.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("could not access {path}: {source}")]
pub struct MtimeError {
  pub path: PathBuf,
  #[source]
  pub source: io::Error,
}

/// Modification time of `path`. Any failure is an error.
pub fn mtime(path: &Path) -> Result<SystemTime, MtimeError> {
  std::fs::metadata(path)
    .and_then(|meta| meta.modified())
    .map_err(|source| MtimeError {
      path: path.to_path_buf(),
      source,
    })
}

/// Modification time of a binary that may not have been built yet.
///
/// A missing file is `Ok(None)`; any other failure is still an error.
pub fn artifact_mtime(path: &Path) -> Result<Option<SystemTime>, MtimeError> {
  match mtime(path) {
    Ok(time) => Ok(Some(time)),
    Err(err) if err.source.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(err) => Err(err),
  }
}

/// A binary is fresh iff the script is not newer than it.
pub fn is_stale(source: SystemTime, artifact: Option<SystemTime>) -> bool {
  match artifact {
    Some(artifact) => source > artifact,
    None => true,
  }
}

/// Outcome of comparing a script against its binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staleness {
  /// Script mtime as read for this decision; stamped onto the new binary.
  pub source_mtime: SystemTime,
  pub stale: bool,
}

/// Read both mtimes and decide.
pub fn check(script: &Path, binary: &Path) -> Result<Staleness, MtimeError> {
  let source_mtime = mtime(script)?;
  let binary_mtime = artifact_mtime(binary)?;
  let stale = is_stale(source_mtime, binary_mtime);

  debug!(
    script = %script.display(),
    binary = %binary.display(),
    built = binary_mtime.is_some(),
    stale,
    "checked binary freshness"
  );

  Ok(Staleness { source_mtime, stale })
}
