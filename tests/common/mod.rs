use std::path::{Path, PathBuf};

pub const BIN: &str = "repo-evidence-report";

/// Fixture repositories served in place of GitHub.
#[allow(dead_code)]
pub fn repos_fixture() -> PathBuf {
  test_support::fixture_path("repos.json")
}

#[allow(dead_code)]
pub fn projects_fixture() -> PathBuf {
  test_support::fixture_path("projects.json")
}

/// Run the binary offline (fixture source, no generation) and parse stdout as JSON.
#[allow(dead_code)]
pub fn run_offline(args: &[&str]) -> serde_json::Value {
  let fixture = repos_fixture();
  let out = test_support::cmd_bin(BIN)
    .arg("--fixture")
    .arg(&fixture)
    .arg("--no-ai")
    .args(args)
    .output()
    .unwrap();

  assert!(
    out.status.success(),
    "run failed: {}",
    String::from_utf8_lossy(&out.stderr)
  );
  serde_json::from_slice(&out.stdout).expect("stdout is JSON")
}

#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, body).unwrap();
  path
}
