/// Directory created next to a script to hold its compiled binary.
pub const CACHE_DIR_NAME: &str = ".cache";

/// Advisory lock file inside the cache directory.
pub const LOCK_FILENAME: &str = ".lock";

/// Stem of the intermediate object file; the arch character is the extension.
pub const OBJECT_STEM: &str = "_go_";

/// Leading bytes of an interpreter line.
pub const INTERPRETER_MARKER: &[u8] = b"#!";

/// What the interpreter marker is replaced with in the compiler's copy.
pub const COMMENT_MARKER: &[u8] = b"//";

/// Prefix of the optional second line listing auxiliary sources.
pub const REFERENCES_MARKER: &str = "///<>";

/// Extension of sources accepted on the references line.
pub const SOURCE_EXT: &str = "go";

/// Exit status for failures of goscript itself (as opposed to the child's).
pub const INTERNAL_ERROR_STATUS: i32 = 1;

/// Cache directory mode on Unix.
pub const CACHE_DIR_MODE: u32 = 0o750;
