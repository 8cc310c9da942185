use std::fmt;

/// Operating systems with a `GOOS`-style name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
  FreeBsd,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      "freebsd" => Some(Self::FreeBsd),
      _ => None,
    }
  }

  /// Returns the lowercase `GOOS`-style identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
      Self::FreeBsd => "freebsd",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Name of the native OS, falling back to the Rust target name
pub fn native_os_name() -> &'static str {
  Os::current().map(|o| o.as_str()).unwrap_or(std::env::consts::OS)
}
