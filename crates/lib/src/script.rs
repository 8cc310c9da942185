//! Run a script: bring its binary up to date, then execute it.

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::debug;

use crate::build::{Build, BuildOptions, BuildOutcome, BuildStage};
use crate::env::Environment;
use crate::error::Error;
use crate::lock::CacheLock;
use crate::paths::ScriptPaths;
use crate::runner::{self, ProcessSpec};
use crate::staleness;
use crate::toolchain::Toolchain;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
  pub script: PathBuf,
  /// Arguments for the script, not including the script path.
  pub args: Vec<OsString>,
  /// Namespace the cache by OS and architecture.
  pub shared: bool,
  pub build: BuildOptions,
}

impl RunOptions {
  pub fn new(script: impl Into<PathBuf>) -> Self {
    Self {
      script: script.into(),
      ..Self::default()
    }
  }
}

/// What [`refresh`] did to the cached binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
  UpToDate,
  Rebuilt,
  Failed { stage: BuildStage, code: i32 },
}

/// Run `options.script` and return the status goscript should exit with.
///
/// That is the script's own status, or the compiler's/linker's if the
/// rebuild failed.
pub fn run_script(options: &RunOptions, env: &Environment) -> Result<i32, Error> {
  let paths = ScriptPaths::resolve(&options.script, options.shared)?;
  debug!(
    script = %paths.script.display(),
    binary = %paths.binary.display(),
    shared = options.shared,
    "resolved script paths"
  );

  paths.ensure_cache_dir()?;

  if let Refresh::Failed { code, .. } = refresh(&paths, options.build, env)? {
    return Ok(code);
  }

  execute(&paths, options, env)
}

/// Rebuild the binary if the script is newer than it.
///
/// The check is repeated under the cache lock, so when several invocations
/// find the same script stale only the first one builds.
pub fn refresh(paths: &ScriptPaths, options: BuildOptions, env: &Environment) -> Result<Refresh, Error> {
  if !staleness::check(&paths.script, &paths.binary)?.stale {
    return Ok(Refresh::UpToDate);
  }

  let _lock = CacheLock::acquire(paths)?;

  let staleness = staleness::check(&paths.script, &paths.binary)?;
  if !staleness.stale {
    debug!("binary was rebuilt while waiting for the lock");
    return Ok(Refresh::UpToDate);
  }

  let toolchain = Toolchain::from_env(env)?;
  let outcome = Build::new(paths, &toolchain, env, options).run(staleness.source_mtime)?;

  Ok(match outcome {
    BuildOutcome::Built => Refresh::Rebuilt,
    BuildOutcome::ToolFailed { stage, code } => Refresh::Failed { stage, code },
  })
}

fn execute(paths: &ScriptPaths, options: &RunOptions, env: &Environment) -> Result<i32, Error> {
  let spec = ProcessSpec::new(&paths.binary)
    .arg0(&paths.script)
    .args(&options.args);
  Ok(runner::run(&spec, env)?)
}
