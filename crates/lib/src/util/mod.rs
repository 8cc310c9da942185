//! Shared utilities.

#[cfg(test)]
#[cfg(unix)]
pub mod testutil;
