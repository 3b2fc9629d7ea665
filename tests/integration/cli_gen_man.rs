use crate::common::BIN;

#[test]
fn cli_generates_man_page() {
  let mut cmd = test_support::cmd_bin(BIN);
  let out = cmd.args(["--gen-man"]).output().unwrap();
  assert!(out.status.success());
  let s = String::from_utf8_lossy(&out.stdout);
  // clap_mangen emits a roff manpage starting with .TH and mentions the binary name
  assert!(s.starts_with(".TH"));
  assert!(s.contains("repo-evidence-report"));
}
