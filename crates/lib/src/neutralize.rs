//! Compiler-safe copies of scripts.
//!
//! A script's first line may be an interpreter line (`#!/usr/bin/goscript`),
//! which the compiler does not understand. Instead of editing the script, the
//! compiler is handed a shadow copy whose `#!` is replaced by `//`. Nothing
//! else changes, so every line number and byte offset in compiler diagnostics
//! still points at the right place in the original.
//!
//! The second line may list auxiliary sources to compile alongside:
//!
//! ```text
//! #!/usr/bin/goscript
//! ///<> helper.go util.go
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::consts::{COMMENT_MARKER, INTERPRETER_MARKER, REFERENCES_MARKER, SOURCE_EXT};
use crate::paths::ScriptPaths;

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  let pattern = format!(r"\b[_A-Za-z][_A-Za-z0-9]*\.{}\b", regex::escape(SOURCE_EXT));
  Regex::new(&pattern).expect("reference pattern is valid")
});

#[derive(Debug, Error)]
pub enum NeutralizeError {
  #[error("can't open {path}: {source}")]
  ReadSource {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("can't write compiler copy of {path}: {source}")]
  WriteShadow {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Source bytes ready for the compiler, plus the auxiliary files they need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neutralized {
  pub content: Vec<u8>,
  pub references: Vec<String>,
}

/// Rewrite the interpreter line and collect references from line 2.
pub fn neutralize(source: &[u8]) -> Neutralized {
  let mut content = source.to_vec();
  if content.starts_with(INTERPRETER_MARKER) {
    content[..COMMENT_MARKER.len()].copy_from_slice(COMMENT_MARKER);
  }

  let references = second_line(source)
    .map(String::from_utf8_lossy)
    .and_then(|line| line.strip_prefix(REFERENCES_MARKER).map(parse_references))
    .unwrap_or_default();

  Neutralized { content, references }
}

/// Source file names on a references line, in order, without duplicates.
pub fn parse_references(line: &str) -> Vec<String> {
  let mut refs: Vec<String> = Vec::new();
  for found in REFERENCE_PATTERN.find_iter(line) {
    if !refs.iter().any(|r| r == found.as_str()) {
      refs.push(found.as_str().to_string());
    }
  }
  refs
}

fn second_line(source: &[u8]) -> Option<&[u8]> {
  let start = source.iter().position(|&b| b == b'\n')? + 1;
  let rest = &source[start..];
  let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
  Some(&rest[..end])
}

/// A neutralized copy of a script on disk.
///
/// The copy is deleted when this value is dropped.
#[derive(Debug)]
pub struct ShadowSource {
  file: NamedTempFile,
  references: Vec<PathBuf>,
}

impl ShadowSource {
  /// Write the compiler's copy of `paths.script` into the cache directory.
  pub fn create(paths: &ScriptPaths) -> Result<Self, NeutralizeError> {
    let source = std::fs::read(&paths.script).map_err(|source| NeutralizeError::ReadSource {
      path: paths.script.clone(),
      source,
    })?;

    let neutralized = neutralize(&source);
    let write_err = |source| NeutralizeError::WriteShadow {
      path: paths.script.clone(),
      source,
    };

    let mut file = tempfile::Builder::new()
      .prefix(&format!("{}.", paths.stem()))
      .suffix(&format!(".{}", SOURCE_EXT))
      .tempfile_in(&paths.cache_dir)
      .map_err(write_err)?;
    file.write_all(&neutralized.content).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    let references: Vec<PathBuf> = neutralized
      .references
      .iter()
      .map(|name| paths.script_dir.join(name))
      .collect();

    debug!(
      shadow = %file.path().display(),
      references = ?references,
      "wrote compiler copy of script"
    );

    Ok(Self { file, references })
  }

  pub fn path(&self) -> &Path {
    self.file.path()
  }

  /// Auxiliary sources, resolved against the script's directory.
  pub fn references(&self) -> &[PathBuf] {
    &self.references
  }
}
