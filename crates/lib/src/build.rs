//! Compile and link a script into its cached binary.
//!
//! The pipeline is linear:
//!
//! ```text
//! Neutralize → Compile → Link → StampMtime → Install → Cleanup → Done
//! ```
//!
//! The linker writes to a staging file in the cache directory. It is stamped
//! and then renamed onto the binary path, so the binary path only ever holds
//! a complete, stamped binary. A failed link or stamp leaves it untouched.
//!
//! A nonzero exit from the compiler or linker stops it and is reported as
//! [`BuildOutcome::ToolFailed`] with the tool's own status. The shadow copy
//! made in `Neutralize` is gone by the time `Compile` returns, whatever the
//! result, and the script itself is never written to.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::env::Environment;
use crate::neutralize::{NeutralizeError, ShadowSource};
use crate::paths::ScriptPaths;
use crate::runner::{self, ProcessSpec, RunError};
use crate::toolchain::Toolchain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
  Neutralize,
  Compile,
  Link,
  StampMtime,
  Install,
  Cleanup,
  Done,
}

impl BuildStage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Neutralize => "neutralize",
      Self::Compile => "compile",
      Self::Link => "link",
      Self::StampMtime => "stamp-mtime",
      Self::Install => "install",
      Self::Cleanup => "cleanup",
      Self::Done => "done",
    }
  }
}

impl fmt::Display for BuildStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Neutralize(#[from] NeutralizeError),

  #[error("{stage} failed to start: {source}")]
  Launch {
    stage: BuildStage,
    #[source]
    source: RunError,
  },

  #[error("could not set modification time of {path}: {source}")]
  Stamp {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("could not move linked binary to {path}: {source}")]
  Install {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// How a build ended, short of an internal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
  Built,
  /// The compiler or linker exited with `code`.
  ToolFailed { stage: BuildStage, code: i32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
  /// Leave the intermediate object in the cache directory after linking.
  pub keep_object: bool,
}

/// One build of one script.
#[derive(Debug)]
pub struct Build<'a> {
  paths: &'a ScriptPaths,
  toolchain: &'a Toolchain,
  env: &'a Environment,
  options: BuildOptions,
}

impl<'a> Build<'a> {
  pub fn new(paths: &'a ScriptPaths, toolchain: &'a Toolchain, env: &'a Environment, options: BuildOptions) -> Self {
    Self {
      paths,
      toolchain,
      env,
      options,
    }
  }

  /// Run the pipeline; `source_mtime` is what the finished binary gets stamped with.
  pub fn run(&self, source_mtime: SystemTime) -> Result<BuildOutcome, BuildError> {
    info!(script = %self.paths.script.display(), "building");
    let object = self.paths.object(self.toolchain.object_ext);

    let code = {
      enter(BuildStage::Neutralize);
      let shadow = ShadowSource::create(self.paths)?;
      enter(BuildStage::Compile);
      self.compile(&shadow, &object)?
    };
    if code != 0 {
      remove_quietly(&object);
      return Ok(failed(BuildStage::Compile, code));
    }

    enter(BuildStage::Link);
    let staged = self.paths.staged_binary();
    let code = match self.link(&object, &staged) {
      Ok(code) => code,
      Err(err) => {
        remove_quietly(&staged);
        return Err(err);
      }
    };
    if code != 0 {
      remove_quietly(&object);
      remove_quietly(&staged);
      return Ok(failed(BuildStage::Link, code));
    }

    enter(BuildStage::StampMtime);
    if let Err(err) = stamp_mtime(&staged, source_mtime) {
      remove_quietly(&object);
      remove_quietly(&staged);
      return Err(err);
    }

    enter(BuildStage::Install);
    if let Err(source) = std::fs::rename(&staged, &self.paths.binary) {
      remove_quietly(&object);
      remove_quietly(&staged);
      return Err(BuildError::Install {
        path: self.paths.binary.clone(),
        source,
      });
    }

    enter(BuildStage::Cleanup);
    if !self.options.keep_object {
      remove_quietly(&object);
    }

    enter(BuildStage::Done);
    Ok(BuildOutcome::Built)
  }

  fn compile(&self, shadow: &ShadowSource, object: &Path) -> Result<i32, BuildError> {
    let spec = tool_spec(&self.toolchain.compiler)
      .arg("-o")
      .arg(object)
      .arg(shadow.path())
      .args(shadow.references());
    self.invoke(BuildStage::Compile, &spec)
  }

  /// Link into `output`; the binary only takes its final name once stamped.
  fn link(&self, object: &Path, output: &Path) -> Result<i32, BuildError> {
    let spec = tool_spec(&self.toolchain.linker)
      .arg("-o")
      .arg(output)
      .arg(object);
    self.invoke(BuildStage::Link, &spec)
  }

  fn invoke(&self, stage: BuildStage, spec: &ProcessSpec) -> Result<i32, BuildError> {
    runner::run(spec, self.env).map_err(|source| BuildError::Launch { stage, source })
  }
}

fn enter(stage: BuildStage) {
  debug!(%stage, "build stage");
}

fn failed(stage: BuildStage, code: i32) -> BuildOutcome {
  warn!(%stage, code, "toolchain failed");
  BuildOutcome::ToolFailed { stage, code }
}

/// Tools see their own file name as `argv[0]`.
fn tool_spec(tool: &Path) -> ProcessSpec {
  let spec = ProcessSpec::new(tool);
  match tool.file_name() {
    Some(name) => spec.arg0(name),
    None => spec,
  }
}

/// Set `binary`'s mtime to `mtime`, so later freshness checks compare equal.
pub fn stamp_mtime(binary: &Path, mtime: SystemTime) -> Result<(), BuildError> {
  let stamp_err = |source| BuildError::Stamp {
    path: binary.to_path_buf(),
    source,
  };
  let file = open_for_stamp(binary).map_err(stamp_err)?;
  file.set_modified(mtime).map_err(stamp_err)
}

// Explicit timestamps only need ownership on Unix, not write access.
#[cfg(unix)]
fn open_for_stamp(path: &Path) -> io::Result<File> {
  File::open(path)
}

#[cfg(not(unix))]
fn open_for_stamp(path: &Path) -> io::Result<File> {
  File::options().write(true).open(path)
}

fn remove_quietly(path: &Path) {
  match std::fs::remove_file(path) {
    Ok(()) => debug!(path = %path.display(), "removed"),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => warn!(path = %path.display(), error = %e, "could not remove"),
  }
}
