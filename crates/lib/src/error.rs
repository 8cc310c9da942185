use thiserror::Error;

use crate::build::BuildError;
use crate::consts::INTERNAL_ERROR_STATUS;
use crate::lock::LockError;
use crate::paths::PathError;
use crate::runner::RunError;
use crate::staleness::MtimeError;
use crate::toolchain::ConfigError;

/// Broad class of an internal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Bad environment or invocation; nothing was built.
  Configuration,
  /// A file or directory could not be read, written or created.
  Filesystem,
  /// A child process could not be started or waited for.
  Launch,
}

/// Everything that stops goscript before it can hand back a child's status.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Path(#[from] PathError),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Mtime(#[from] MtimeError),

  #[error(transparent)]
  Lock(#[from] LockError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Run(#[from] RunError),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Config(_) | Error::Path(PathError::NoFileName(_)) => ErrorKind::Configuration,
      Error::Path(PathError::CreateCacheDir { .. })
      | Error::Mtime(_)
      | Error::Lock(_)
      | Error::Build(BuildError::Neutralize(_))
      | Error::Build(BuildError::Stamp { .. })
      | Error::Build(BuildError::Install { .. }) => ErrorKind::Filesystem,
      Error::Build(BuildError::Launch { .. }) | Error::Run(_) => ErrorKind::Launch,
    }
  }

  /// Status goscript exits with for this error.
  pub fn exit_code(&self) -> i32 {
    INTERNAL_ERROR_STATUS
  }
}
