//! Advisory locking of a script's cache directory.
//!
//! The staleness check, rebuild and mtime stamp for a script happen while
//! holding an exclusive lock on `<cache>/.lock`. A second invocation on the
//! same script waits, then re-checks and finds the binary already fresh.
//! The lock is released when [`CacheLock`] drops, or by the OS if the
//! process dies.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::paths::ScriptPaths;

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub script: PathBuf,
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error("cache is being rebuilt by another process: {script} (PID {pid}, started Unix timestamp {started_at_unix})")]
  Contention {
    script: PathBuf,
    pid: u32,
    started_at_unix: u64,
    lock_path: PathBuf,
  },

  #[error("cache is locked by another process (could not read lock metadata): {lock_path}")]
  ContentionUnknown { lock_path: PathBuf },

  #[error("failed to open lock file {path}: {source}")]
  OpenFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("failed to acquire lock {path}: {source}")]
  LockFailed {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl LockError {
  pub fn is_contention(&self) -> bool {
    matches!(self, Self::Contention { .. } | Self::ContentionUnknown { .. })
  }
}

/// Exclusive hold on a cache directory.
#[derive(Debug)]
pub struct CacheLock {
  // Closing it releases the lock.
  _file: File,
  lock_path: PathBuf,
}

impl CacheLock {
  /// Take the lock, waiting for any other holder to finish.
  pub fn acquire(paths: &ScriptPaths) -> Result<Self, LockError> {
    match Self::try_acquire(paths) {
      Err(err) if err.is_contention() => {
        info!(reason = %err, "waiting for cache lock");
        let lock_path = paths.lock_file();
        let file = open_lock_file(&lock_path)?;
        lock(&file, true).map_err(|source| LockError::LockFailed {
          path: lock_path.clone(),
          source,
        })?;
        Self::held(file, lock_path, &paths.script)
      }
      other => other,
    }
  }

  /// Take the lock if nobody else holds it.
  pub fn try_acquire(paths: &ScriptPaths) -> Result<Self, LockError> {
    let lock_path = paths.lock_file();
    let file = open_lock_file(&lock_path)?;

    if let Err(err) = lock(&file, false) {
      if is_contended(&err) {
        return Err(read_contention_error(&lock_path));
      }
      return Err(LockError::LockFailed { path: lock_path, source: err });
    }

    Self::held(file, lock_path, &paths.script)
  }

  fn held(file: File, lock_path: PathBuf, script: &Path) -> Result<Self, LockError> {
    write_metadata(&file, script)?;
    debug!(path = %lock_path.display(), "acquired cache lock");
    Ok(Self { _file: file, lock_path })
  }

  /// Reads the lock metadata from the held file handle.
  #[cfg(test)]
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    use std::io::{Seek, SeekFrom};

    let mut file = &self._file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  #[cfg(test)]
  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

impl Drop for CacheLock {
  fn drop(&mut self) {
    debug!(path = %self.lock_path.display(), "released cache lock");
  }
}

fn open_lock_file(lock_path: &Path) -> Result<File, LockError> {
  OpenOptions::new()
    .read(true)
    .write(true)
    .create(true)
    .truncate(false)
    .open(lock_path)
    .map_err(|source| LockError::OpenFile {
      path: lock_path.to_path_buf(),
      source,
    })
}

fn write_metadata(file: &File, script: &Path) -> Result<(), LockError> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    script: script.to_path_buf(),
  };

  file.set_len(0).map_err(LockError::WriteMetadata)?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(|e| LockError::WriteMetadata(io::Error::other(e)))?;
  writer.flush().map_err(LockError::WriteMetadata)?;

  Ok(())
}

fn read_contention_error(lock_path: &Path) -> LockError {
  if let Ok(mut file) = File::open(lock_path) {
    let mut contents = String::new();
    if file.read_to_string(&mut contents).is_ok()
      && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
    {
      return LockError::Contention {
        script: metadata.script,
        pid: metadata.pid,
        started_at_unix: metadata.started_at_unix,
        lock_path: lock_path.to_path_buf(),
      };
    }
  }

  LockError::ContentionUnknown {
    lock_path: lock_path.to_path_buf(),
  }
}

#[cfg(unix)]
fn is_contended(err: &io::Error) -> bool {
  err.kind() == io::ErrorKind::WouldBlock
}

#[cfg(windows)]
fn is_contended(err: &io::Error) -> bool {
  use windows_sys::Win32::Foundation::ERROR_LOCK_VIOLATION;

  err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32)
}

#[cfg(unix)]
fn lock(file: &File, wait: bool) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  let operation = if wait {
    FlockOperation::LockExclusive
  } else {
    FlockOperation::NonBlockingLockExclusive
  };

  flock(file.as_fd(), operation).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn lock(file: &File, wait: bool) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;
  let flags = if wait {
    LOCKFILE_EXCLUSIVE_LOCK
  } else {
    LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK
  };

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(handle, flags, 0, 1, 0, &mut overlapped)
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
