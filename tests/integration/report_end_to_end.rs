use crate::common;

fn repo<'a>(v: &'a serde_json::Value, project: usize, idx: usize) -> &'a serde_json::Value {
  &v["projects"][project]["repositories"][idx]
}

#[test]
fn single_repository_report() {
  let v = common::run_offline(&["--repo", "https://github.com/acme/celo-pay"]);

  assert_eq!(v["total"], 1);
  assert_eq!(v["failures"], 0);
  assert_eq!(v["projects"][0]["project_name"], "acme/celo-pay");

  let r = repo(&v, 0, 0);
  assert_eq!(r["repo"]["url"], "https://github.com/acme/celo-pay");
  assert_eq!(r["metadata"]["stars"], 42);
  assert_eq!(r["integration"]["integrated"], true);

  // targeted files win: nothing from README or samples
  let files: Vec<&str> = r["integration"]["evidence"]
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["file"].as_str().unwrap())
    .collect();
  assert!(files.iter().all(|f| *f == "package.json" || *f == "hardhat.config.ts"));

  assert_eq!(r["addresses"][0]["address"], "0x765DE816845861e75A25fCA122bb6898B8B1282a");
  assert_eq!(r["addresses"][0]["network"], "testnet");
  assert_eq!(r["deployment_urls"][0], "https://celo-pay.vercel.app");
  assert_eq!(r["deployment_urls"].as_array().unwrap().len(), 1);

  let q = &r["quality"];
  assert_eq!(q["metrics"]["total_files"], 8);
  assert_eq!(q["metrics"]["test_files"], 1);
  assert_eq!(q["metrics"]["doc_files"], 2);
  assert!(q["note"].as_str().unwrap().starts_with("Heuristic scores"));
  assert!(r.get("deep_analysis").is_none());
}

#[test]
fn readme_only_repository_reports_one_evidence_item() {
  let v = common::run_offline(&["--repo", "https://github.com/acme/readme-only"]);
  let ev = repo(&v, 0, 0)["integration"]["evidence"].as_array().unwrap().clone();
  assert_eq!(ev.len(), 1);
  assert_eq!(ev[0]["file"], "docs/README.md");
  assert_eq!(ev[0]["keyword"], "celo");
}

#[test]
fn project_input_file_aggregates_repositories() {
  let input = common::projects_fixture();
  let v = common::run_offline(&["--input", input.to_str().unwrap(), "--concurrency", "2"]);

  assert_eq!(v["total"], 3);
  assert_eq!(v["failures"], 1);

  let pay = &v["projects"][0];
  assert_eq!(pay["project_name"], "Celo Pay");
  assert_eq!(pay["repositories"].as_array().unwrap().len(), 2);
  assert_eq!(pay["integration"]["repositories_with_celo"], 2);
  let tagged: Vec<&str> = pay["integration"]["evidence"]
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["repository"].as_str().unwrap())
    .collect();
  assert!(tagged.contains(&"acme/celo-pay"));
  assert!(tagged.contains(&"acme/readme-only"));

  let a = repo(&v, 0, 0)["quality"]["overall_score"].as_f64().unwrap();
  let b = repo(&v, 0, 1)["quality"]["overall_score"].as_f64().unwrap();
  let mean = pay["overall_score"].as_f64().unwrap();
  assert!((mean - (a + b) / 2.0).abs() < 0.01);

  // inaccessible organisation repository: name-only evidence
  let org = repo(&v, 1, 0);
  assert_eq!(org["integration"]["integrated"], true);
  assert_eq!(org["integration"]["evidence"][0]["file"], "Organization name");
  assert_eq!(org["integration"]["evidence"][0]["keyword"], "celo-org");
  assert_eq!(org["quality"]["metrics"]["total_files"], 0);

  assert!(v["projects"][2]["repositories"][0]["error"].is_string());
}

#[test]
fn report_can_be_written_to_a_file() {
  let td = test_support::tempdir();
  let out = td.path().join("reports/summary.json");
  let fixture = common::repos_fixture();

  test_support::cmd_bin(common::BIN)
    .arg("--fixture")
    .arg(&fixture)
    .args(["--no-ai", "--repo", "https://github.com/acme/private", "--out"])
    .arg(&out)
    .assert()
    .success();

  let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
  let r = repo(&v, 0, 0);
  assert_eq!(r["metadata"]["name"], "private");
  assert_eq!(r["integration"]["integrated"], false);
  assert_eq!(r["quality"]["note"], "Heuristic scores: repository content not accessible");
}

#[test]
fn fixture_can_come_from_the_environment() {
  let fixture = common::repos_fixture();
  let out = test_support::cmd_bin(common::BIN)
    .env("REPO_EVAL_FIXTURE", &fixture)
    .args(["--no-ai", "--repo", "https://github.com/acme/readme-only"])
    .output()
    .unwrap();
  assert!(out.status.success());
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(repo(&v, 0, 0)["integration"]["integrated"], true);
}
