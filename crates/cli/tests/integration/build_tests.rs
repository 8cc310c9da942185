//! Build failures and toolchain configuration.

use predicates::prelude::*;
use serial_test::serial;

use crate::common::{HELLO, TestEnv};

#[test]
#[serial]
fn compile_failure_exit_code_is_propagated() {
  let env = TestEnv::new();
  env.fail_compile(2);
  let script = env.write_script("s.go", HELLO);

  env
    .goscript()
    .arg(&script)
    .assert()
    .code(2)
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("undefined: fmt"));

  assert!(!env.dir().join(".cache").join("s").exists());
  assert_eq!(std::fs::read_to_string(&script).unwrap(), HELLO);
}

#[test]
#[serial]
fn link_failure_exit_code_is_propagated() {
  let env = TestEnv::new();
  env.fail_link(3);
  let script = env.write_script("s.go", HELLO);

  env.goscript().arg(&script).assert().code(3);

  assert!(!env.dir().join(".cache").join("s").exists());
}

#[test]
#[serial]
fn references_are_passed_to_compiler() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", "#!/usr/bin/goscript\n///<> helper.go util.go\npackage main\n");

  env.goscript().arg(&script).assert().success();

  let log = env.compile_log();
  let helper = env.dir().join("helper.go");
  let util = env.dir().join("util.go");
  assert!(
    log[0].ends_with(&format!("{} {}", helper.display(), util.display())),
    "{log:?}"
  );
}

#[test]
#[serial]
fn missing_goroot_is_a_configuration_error() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", HELLO);

  env
    .goscript()
    .env_remove("GOROOT")
    .arg(&script)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("configuration error"))
    .stderr(predicate::str::contains("GOROOT"));
}

#[test]
#[serial]
fn goroot_final_is_a_fallback() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", HELLO);

  env
    .goscript()
    .env_remove("GOROOT")
    .env("GOROOT_FINAL", env.goroot())
    .arg(&script)
    .assert()
    .success();
}

#[test]
#[serial]
fn unknown_arch_is_a_configuration_error() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", HELLO);

  env
    .goscript()
    .env("GOARCH", "mips")
    .arg(&script)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("unknown GOARCH: mips"));
}

#[test]
#[serial]
fn keep_object_leaves_intermediate() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", HELLO);

  env.goscript().arg("--keep-object").arg(&script).assert().success();

  assert!(env.dir().join(".cache").join("_go_.6").exists());
}

#[test]
#[serial]
fn intermediate_removed_by_default() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", HELLO);

  env.goscript().arg(&script).assert().success();

  assert!(!env.dir().join(".cache").join("_go_.6").exists());
}

#[test]
#[serial]
fn verbose_logs_to_stderr_only() {
  let env = TestEnv::new();
  let script = env.write_script("s.go", HELLO);

  env
    .goscript()
    .arg("-v")
    .arg(&script)
    .assert()
    .success()
    .stdout(predicate::eq("hi \n"))
    .stderr(predicate::str::contains("building"));
}
