//! Child process execution.
//!
//! Children inherit stdin/stdout/stderr, so their output streams live, and
//! receive exactly the environment snapshot they are given. Launch and wait
//! failures are errors. A nonzero exit status is a normal result.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::env::Environment;

#[derive(Debug, Error)]
pub enum RunError {
  #[error("could not execute: \"{command}\": {source}")]
  Launch {
    command: String,
    #[source]
    source: io::Error,
  },

  #[error("could not wait for: \"{command}\": {source}")]
  Wait {
    command: String,
    #[source]
    source: io::Error,
  },
}

/// A command to run: program, argv and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
  program: PathBuf,
  arg0: Option<OsString>,
  args: Vec<OsString>,
  cwd: Option<PathBuf>,
}

impl ProcessSpec {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      arg0: None,
      args: Vec::new(),
      cwd: None,
    }
  }

  /// Override `argv[0]` (Unix only; ignored elsewhere).
  pub fn arg0(mut self, arg0: impl Into<OsString>) -> Self {
    self.arg0 = Some(arg0.into());
    self
  }

  pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Run in `dir` instead of the caller's working directory.
  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Human-readable command line for messages.
  pub fn display(&self) -> String {
    let argv0 = self.arg0.as_deref().unwrap_or(self.program.as_os_str());
    std::iter::once(argv0)
      .chain(self.args.iter().map(OsString::as_os_str))
      .map(OsStr::to_string_lossy)
      .collect::<Vec<_>>()
      .join(" ")
  }

  fn command(&self, env: &Environment) -> Command {
    let mut command = Command::new(&self.program);
    command
      .args(&self.args)
      .env_clear()
      .envs(env.iter())
      .stdin(Stdio::inherit())
      .stdout(Stdio::inherit())
      .stderr(Stdio::inherit());

    if let Some(dir) = &self.cwd {
      command.current_dir(dir);
    }

    #[cfg(unix)]
    if let Some(arg0) = &self.arg0 {
      use std::os::unix::process::CommandExt;
      command.arg0(arg0);
    }

    command
  }
}

/// Run `spec` to completion and return its exit code.
pub fn run(spec: &ProcessSpec, env: &Environment) -> Result<i32, RunError> {
  debug!(command = %spec.display(), cwd = ?spec.cwd, "spawning process");

  let mut child = spec.command(env).spawn().map_err(|source| RunError::Launch {
    command: spec.display(),
    source,
  })?;

  let status = child.wait().map_err(|source| RunError::Wait {
    command: spec.display(),
    source,
  })?;

  let code = exit_code(status);
  debug!(command = %spec.display(), code, "process exited");
  Ok(code)
}

/// Exit code of a finished child; signals map to `128 + signal` like a shell.
pub fn exit_code(status: ExitStatus) -> i32 {
  if let Some(code) = status.code() {
    return code;
  }

  #[cfg(unix)]
  {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = status.signal() {
      return 128 + signal;
    }
  }

  crate::consts::INTERNAL_ERROR_STATUS
}
