use std::fmt;

/// CPU architectures known to the toolchain naming scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  Amd64,
  I386,
  Arm,
  Arm64,
}

impl Arch {
  /// Detect the architecture goscript itself was built for
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86_64" => Some(Self::Amd64),
      "x86" => Some(Self::I386),
      "arm" => Some(Self::Arm),
      "aarch64" => Some(Self::Arm64),
      _ => None,
    }
  }

  /// Parse a `GOARCH`-style name
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "amd64" => Some(Self::Amd64),
      "386" => Some(Self::I386),
      "arm" => Some(Self::Arm),
      "arm64" => Some(Self::Arm64),
      _ => None,
    }
  }

  /// Returns the `GOARCH`-style identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Amd64 => "amd64",
      Self::I386 => "386",
      Self::Arm => "arm",
      Self::Arm64 => "arm64",
    }
  }

  /// Single-character toolchain prefix, also used as the object file extension.
  ///
  /// Only the three classic targets have a compiler/linker pair.
  pub fn toolchain_char(&self) -> Option<char> {
    match self {
      Self::Amd64 => Some('6'),
      Self::I386 => Some('8'),
      Self::Arm => Some('5'),
      Self::Arm64 => None,
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Name of the native architecture, falling back to the Rust target name
pub fn native_arch_name() -> &'static str {
  Arch::current().map(|a| a.as_str()).unwrap_or(std::env::consts::ARCH)
}
