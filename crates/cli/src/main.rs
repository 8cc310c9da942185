use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use goscript_lib::build::BuildOptions;
use goscript_lib::consts::INTERNAL_ERROR_STATUS;
use goscript_lib::env::Environment;
use goscript_lib::{ErrorKind, RunOptions, run_script};

mod output;

/// Environment variable holding the log filter (e.g. `debug`).
const LOG_ENV: &str = "GOSCRIPT_LOG";

const AFTER_HELP: &str = "\
Insert \"#!/usr/bin/goscript\" in the head of a Go source file to run it directly.
The compiled binary is cached in .cache/ next to the script and rebuilt when the
script changes.

In a shared filesystem:
  $ goscript --shared /path/to/shared-fs/file.go";

/// goscript - run Go source files as scripts
#[derive(Parser, Debug)]
#[command(name = "goscript")]
#[command(author, version, about, long_about = None, after_help = AFTER_HELP)]
struct Cli {
  /// The script lives on a filesystem shared by machines of different OS or architecture
  #[arg(long)]
  shared: bool,

  /// Leave the intermediate object file in the cache directory
  #[arg(long)]
  keep_object: bool,

  /// Log cache and build decisions to stderr
  #[arg(short, long)]
  verbose: bool,

  /// Script to run, followed by its arguments
  #[arg(
    value_name = "SCRIPT [ARGS]",
    required = true,
    trailing_var_arg = true,
    allow_hyphen_values = true
  )]
  command: Vec<OsString>,
}

impl Cli {
  fn run_options(self) -> Result<RunOptions> {
    let mut command = self.command.into_iter();
    let script = command.next().map(PathBuf::from).context("no script given")?;

    Ok(RunOptions {
      script,
      args: command.collect(),
      shared: self.shared,
      build: BuildOptions {
        keep_object: self.keep_object,
      },
    })
  }
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let code = match run(cli) {
    Ok(code) => code,
    Err(err) => {
      output::print_error(&describe(&err));
      exit_status(&err)
    }
  };

  std::process::exit(code);
}

/// Library errors pick their own status; anything else is internal.
fn exit_status(err: &anyhow::Error) -> i32 {
  err
    .downcast_ref::<goscript_lib::Error>()
    .map_or(INTERNAL_ERROR_STATUS, goscript_lib::Error::exit_code)
}

fn run(cli: Cli) -> Result<i32> {
  let options = cli.run_options()?;
  let env = Environment::capture();
  Ok(run_script(&options, &env)?)
}

fn init_logging(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn describe(err: &anyhow::Error) -> String {
  let label = match err.downcast_ref::<goscript_lib::Error>().map(|e| e.kind()) {
    Some(ErrorKind::Configuration) => "configuration error",
    Some(ErrorKind::Filesystem) => "filesystem error",
    Some(ErrorKind::Launch) => "launch error",
    None => "error",
  };
  format!("{}: {}", label, err)
}
