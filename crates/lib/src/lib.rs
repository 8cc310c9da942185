//! goscript-lib: run compiled-language sources as scripts
//!
//! This crate provides the pieces of the `goscript` pipeline:
//! - `paths`: cache directory and binary artifact locations for a script
//! - `toolchain`: compiler/linker resolution from the environment
//! - `staleness`: mtime comparison between a script and its binary
//! - `neutralize`: compiler-safe shadow copy of a script with a `#!` line
//! - `build`: the compile → link → stamp pipeline
//! - `runner`: blocking child process execution with inherited stdio
//! - `script`: the orchestrator tying it all together

pub mod build;
pub mod consts;
pub mod env;
pub mod error;
pub mod lock;
pub mod neutralize;
pub mod paths;
pub mod platform;
pub mod runner;
pub mod script;
pub mod staleness;
pub mod toolchain;
pub mod util;

pub use error::{Error, ErrorKind};
pub use script::{RunOptions, run_script};
