//! Running scripts: caching, argument and status forwarding.

use predicates::prelude::*;
use serial_test::serial;

use crate::common::{HELLO, TestEnv};

#[test]
#[serial]
fn bare_script_name_builds_into_dot_cache() {
  let env = TestEnv::new();
  env.write_script("s.g", HELLO);

  env
    .goscript()
    .arg("s.g")
    .assert()
    .success()
    .stdout(predicate::eq("hi \n"));

  assert!(env.dir().join(".cache").join("s").exists());
  assert_eq!(std::fs::read_to_string(env.dir().join("s.g")).unwrap(), HELLO);
}

#[test]
#[serial]
fn second_run_uses_cache() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", HELLO);

  env.goscript().arg(&script).assert().success();
  env.goscript().arg(&script).assert().success();

  assert_eq!(env.compile_count(), 1);
}

#[test]
#[serial]
fn forwards_arguments_including_flags() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", HELLO);

  env
    .goscript()
    .arg(&script)
    .args(["-v", "--shared", "x y"])
    .assert()
    .success()
    .stdout(predicate::eq("hi -v --shared x y\n"));
}

#[test]
#[serial]
fn exits_with_script_status() {
  let env = TestEnv::new();
  env.set_program("#!/bin/sh\nexit 42\n");
  let script = env.write_script("s.go", HELLO);

  env.goscript().arg(&script).assert().code(42);
}

#[test]
#[serial]
fn script_in_subdirectory() {
  let env = TestEnv::new();
  env.write_script("tools/gen.go", HELLO);

  env.goscript().arg("tools/gen.go").assert().success();

  assert!(env.dir().join("tools/.cache/gen").exists());
  assert!(!env.dir().join(".cache").exists());
}

#[test]
#[serial]
fn shared_mode_namespaces_cache() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", HELLO);

  env.goscript().arg("--shared").arg(&script).assert().success();

  let entries: Vec<String> = std::fs::read_dir(env.dir().join(".cache"))
    .unwrap()
    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
    .filter(|name| !name.starts_with('.'))
    .collect();
  assert_eq!(entries.len(), 1);
  assert!(entries[0].contains('_'), "{entries:?}");
}

#[test]
#[serial]
fn missing_script_is_reported() {
  let env = TestEnv::new();

  env
    .goscript()
    .arg("nope.go")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("filesystem error"))
    .stderr(predicate::str::contains("nope.go"));
}
