//! Environment snapshot.
//!
//! The process environment is read once, at startup, into an [`Environment`]
//! value. Everything downstream (toolchain resolution, child processes) takes
//! that value explicitly instead of consulting `std::env`.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Install root of the toolchain.
pub const GOROOT: &str = "GOROOT";
/// Fallback for [`GOROOT`].
pub const GOROOT_FINAL: &str = "GOROOT_FINAL";
/// Directory holding the compiler and linker (default `$GOROOT/bin`).
pub const GOBIN: &str = "GOBIN";
/// Target architecture override.
pub const GOARCH: &str = "GOARCH";

/// An immutable snapshot of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
  vars: BTreeMap<OsString, OsString>,
}

impl Environment {
  /// Snapshot the current process environment.
  pub fn capture() -> Self {
    Self {
      vars: std::env::vars_os().collect(),
    }
  }

  /// An environment with no variables at all.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Returns a copy with `key` set to `value`.
  pub fn with(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
    self.vars.insert(key.into(), value.into());
    self
  }

  /// Returns a copy without `key`.
  pub fn without(mut self, key: impl AsRef<OsStr>) -> Self {
    self.vars.remove(key.as_ref());
    self
  }

  /// Raw lookup. Empty values are reported as present.
  pub fn get_os(&self, key: &str) -> Option<&OsStr> {
    self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
  }

  /// Lookup that treats empty and non-UTF-8 values as unset.
  pub fn get(&self, key: &str) -> Option<&str> {
    self.get_os(key).and_then(OsStr::to_str).filter(|v| !v.is_empty())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
    self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
  }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
  K: Into<OsString>,
  V: Into<OsString>,
{
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self {
      vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }
}
