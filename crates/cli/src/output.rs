//! CLI output formatting.
//!
//! goscript's own messages go to stderr so they never mix with a script's
//! stdout.

use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const ERROR: &str = "✗";
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}
