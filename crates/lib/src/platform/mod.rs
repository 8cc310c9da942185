pub mod arch;
pub mod os;

use std::fmt;

/// An `{os}_{arch}` pair, used to namespace binaries on shared filesystems
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
  pub os: String,
  pub arch: String,
}

impl Platform {
  pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
    Self {
      os: os.into(),
      arch: arch.into(),
    }
  }

  /// The platform goscript is running on
  pub fn native() -> Self {
    Self::new(os::native_os_name(), arch::native_arch_name())
  }

  /// Directory name for this platform's binaries (e.g., "linux_amd64")
  pub fn cache_tag(&self) -> String {
    format!("{}_{}", self.os, self.arch)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.cache_tag())
  }
}
