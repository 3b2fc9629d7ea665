use predicates::prelude::*;

use crate::common::{self, BIN};

#[test]
fn missing_repositories_is_an_argument_error() {
  test_support::cmd_bin(BIN)
    .arg("--no-ai")
    .assert()
    .failure()
    .stderr(predicate::str::contains("--repo"));
}

#[test]
fn invalid_config_exits_non_zero() {
  let td = test_support::tempdir();
  let cfg = common::write_file(td.path(), "cfg.toml", "[weights]\nreadability = -1.0\n");

  test_support::cmd_bin(BIN)
    .args(["--no-ai", "--repo", "https://github.com/acme/celo-pay", "--config"])
    .arg(&cfg)
    .assert()
    .failure()
    .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn unsupported_config_extension_is_rejected() {
  let td = test_support::tempdir();
  let cfg = common::write_file(td.path(), "cfg.yaml", "keywords: [celo]\n");

  test_support::cmd_bin(BIN)
    .args(["--no-ai", "--repo", "https://github.com/acme/celo-pay", "--config"])
    .arg(&cfg)
    .assert()
    .failure()
    .stderr(predicate::str::contains("unsupported config extension"));
}

#[test]
fn unreadable_fixture_is_a_configuration_error() {
  let td = test_support::tempdir();
  let fixture = common::write_file(td.path(), "repos.json", "{ nope");

  test_support::cmd_bin(BIN)
    .args(["--no-ai", "--repo", "https://github.com/acme/celo-pay", "--fixture"])
    .arg(&fixture)
    .assert()
    .failure()
    .stderr(predicate::str::contains("parsing fixture"));
}

#[test]
fn failed_repositories_do_not_change_exit_status() {
  let v = common::run_offline(&["--repo", "https://gitlab.com/acme/elsewhere"]);
  assert_eq!(v["failures"], 1);
  assert!(v["projects"][0]["repositories"][0]["error"]
    .as_str()
    .unwrap()
    .contains("unrecognized repository URL"));
}
