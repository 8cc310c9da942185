//! Test utilities for goscript-lib.
//!
//! [`FakeToolchain`] installs `/bin/sh` stand-ins for `6g` and `6l` under a
//! temporary `GOROOT`. They log their arguments, can be told to fail, and the
//! linker emits a runnable shell script as the "binary". Before the real
//! program, the linker writes a partial one that exits 9, so anything that
//! runs a half-linked output shows up as status 9.

use std::path::{Path, PathBuf};

use crate::env::{Environment, GOARCH, GOROOT};

const COMPILER: &str = r#"#!/bin/sh
root='@ROOT@'
echo "$*" >> "$root/compile.log"
if [ -f "$root/compile.status" ]; then
  status=$(cat "$root/compile.status")
  echo "s.go:3: syntax error near unexpected token" >&2
  exit "$status"
fi
n=$(wc -l < "$root/compile.log" | tr -d ' ')
cat "$3" > "$root/compiled.$n"
cat "$3" > "$2"
"#;

const LINKER: &str = r#"#!/bin/sh
root='@ROOT@'
echo "$*" >> "$root/link.log"
if [ -f "$root/link.silent" ]; then
  exit 0
fi
printf '#!/bin/sh\nexit 9\n' > "$2"
chmod 755 "$2"
if [ -f "$root/link.delay" ]; then
  sleep "$(cat "$root/link.delay")"
fi
if [ -f "$root/link.status" ]; then
  status=$(cat "$root/link.status")
  echo "main.main: undefined" >&2
  exit "$status"
fi
cat "$root/program" > "$2"
chmod 755 "$2"
"#;

/// What the linked binary does unless a test says otherwise.
pub const DEFAULT_PROGRAM: &str = "#!/bin/sh\necho \"hi $*\"\n";

/// Write `content` to `path` and make it executable.
pub fn write_executable(path: &Path, content: &str) {
  use std::os::unix::fs::PermissionsExt;

  std::fs::write(path, content).unwrap();
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

pub struct FakeToolchain {
  root: PathBuf,
}

impl FakeToolchain {
  /// Install an amd64 toolchain under `root/bin`.
  pub fn install(root: &Path) -> Self {
    let bin = root.join("bin");
    std::fs::create_dir_all(&bin).unwrap();

    let root_str = root.to_str().unwrap();
    write_executable(&bin.join("6g"), &COMPILER.replace("@ROOT@", root_str));
    write_executable(&bin.join("6l"), &LINKER.replace("@ROOT@", root_str));

    let fake = Self {
      root: root.to_path_buf(),
    };
    fake.set_program(DEFAULT_PROGRAM);
    fake
  }

  /// Environment pointing at this toolchain.
  pub fn env(&self) -> Environment {
    Environment::empty()
      .with(GOROOT, self.root.as_os_str())
      .with(GOARCH, "amd64")
      .with("PATH", "/usr/bin:/bin")
  }

  pub fn compiler(&self) -> PathBuf {
    self.root.join("bin").join("6g")
  }

  pub fn fail_compile(&self, status: i32) {
    std::fs::write(self.root.join("compile.status"), status.to_string()).unwrap();
  }

  pub fn fail_link(&self, status: i32) {
    std::fs::write(self.root.join("link.status"), status.to_string()).unwrap();
  }

  /// Linker exits 0 without writing its output file.
  pub fn link_writes_nothing(&self) {
    std::fs::write(self.root.join("link.silent"), "").unwrap();
  }

  /// Undo `fail_link`, `link_writes_nothing` and `set_link_delay`.
  pub fn reset_link(&self) {
    for knob in ["link.status", "link.silent", "link.delay"] {
      let _ = std::fs::remove_file(self.root.join(knob));
    }
  }

  pub fn set_link_delay(&self, secs: u32) {
    std::fs::write(self.root.join("link.delay"), secs.to_string()).unwrap();
  }

  /// Shell script the linker writes as the binary.
  pub fn set_program(&self, content: &str) {
    std::fs::write(self.root.join("program"), content).unwrap();
  }

  /// One entry per compiler run: its arguments joined by spaces.
  pub fn compile_args(&self) -> Vec<String> {
    read_lines(&self.root.join("compile.log"))
  }

  pub fn link_args(&self) -> Vec<String> {
    read_lines(&self.root.join("link.log"))
  }

  /// The source text each successful compiler run was given.
  pub fn compiled_sources(&self) -> Vec<String> {
    (1..=self.compile_args().len())
      .filter_map(|n| std::fs::read_to_string(self.root.join(format!("compiled.{}", n))).ok())
      .collect()
  }
}

fn read_lines(path: &Path) -> Vec<String> {
  std::fs::read_to_string(path)
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}
