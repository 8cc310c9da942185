//! Compiler and linker resolution.
//!
//! The toolchain lives in `$GOBIN` (default `$GOROOT/bin`) and is named after
//! the target architecture: `6g`/`6l` for amd64, `8g`/`8l` for 386 and
//! `5g`/`5l` for arm.

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::env::{Environment, GOARCH, GOBIN, GOROOT, GOROOT_FINAL};
use crate::platform::arch::{Arch, native_arch_name};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("neither GOROOT nor GOROOT_FINAL environment variable has been set")]
  MissingRoot,

  #[error("unknown GOARCH: {0}")]
  UnknownArch(String),
}

/// Resolved toolchain for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  pub compiler: PathBuf,
  pub linker: PathBuf,
  /// Architecture character, used as the object file extension.
  pub object_ext: char,
}

impl Toolchain {
  pub fn from_env(env: &Environment) -> Result<Self, ConfigError> {
    let root = env
      .get(GOROOT)
      .or_else(|| env.get(GOROOT_FINAL))
      .map(PathBuf::from)
      .ok_or(ConfigError::MissingRoot)?;

    let bin_dir = env.get(GOBIN).map(PathBuf::from).unwrap_or_else(|| root.join("bin"));

    let arch_name = env.get(GOARCH).unwrap_or_else(|| native_arch_name());
    let object_ext = Arch::from_name(arch_name)
      .and_then(|arch| arch.toolchain_char())
      .ok_or_else(|| ConfigError::UnknownArch(arch_name.to_string()))?;

    let toolchain = Self {
      compiler: bin_dir.join(format!("{}g", object_ext)),
      linker: bin_dir.join(format!("{}l", object_ext)),
      object_ext,
    };

    debug!(
      compiler = %toolchain.compiler.display(),
      linker = %toolchain.linker.display(),
      arch = arch_name,
      "resolved toolchain"
    );

    Ok(toolchain)
  }
}
