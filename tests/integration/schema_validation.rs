use jsonschema::validator_for;

use crate::common;

fn read_schema(name: &str) -> serde_json::Value {
  let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
  let path = manifest_dir.join("tests").join("schemas").join(name);
  let data = std::fs::read(&path).expect("schema file");
  serde_json::from_slice(&data).expect("valid schema JSON")
}

fn compile_schema(name: &str) -> jsonschema::Validator {
  let schema = read_schema(name);
  validator_for(&schema).expect("compile schema")
}

#[test]
fn batch_summary_conforms_to_schema() {
  let input = common::projects_fixture();
  let v = common::run_offline(&["--input", input.to_str().unwrap()]);

  let compiled = compile_schema("repo-evidence-report.summary.schema.json");
  compiled.validate(&v).expect("schema validation failed for batch summary");
}

#[test]
fn single_repository_summary_conforms_to_schema() {
  let v = common::run_offline(&["--repo", "https://github.com/acme/celo-pay"]);

  let compiled = compile_schema("repo-evidence-report.summary.schema.json");
  compiled.validate(&v).expect("schema validation failed for single repository");
}
