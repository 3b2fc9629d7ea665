use std::sync::{Arc, Mutex};
use std::time::Duration;

use repo_evidence_report::analyzer::Analyzer;
use repo_evidence_report::config::AnalyzerConfig;
use repo_evidence_report::error::{AnalyzerError, AnalyzerResult};
use repo_evidence_report::generation::GenerationClient;
use repo_evidence_report::model::RepoDescriptor;
use repo_evidence_report::observer::{Observer, Stage};
use repo_evidence_report::source::{DefaultSourceFactory, FixtureSet};

use crate::common;

/// Replays canned completions; sleeps when the canned text is `"<slow>"`.
struct Canned(Mutex<Vec<String>>);

impl Canned {
  fn new(responses: &[&str]) -> Arc<dyn GenerationClient> {
    let mut v: Vec<String> = responses.iter().map(|s| s.to_string()).collect();
    v.reverse();
    Arc::new(Canned(Mutex::new(v)))
  }
}

impl GenerationClient for Canned {
  fn complete(&self, _prompt: &str, _temperature: f64) -> AnalyzerResult<String> {
    let next = self.0.lock().unwrap().pop();
    match next.as_deref() {
      Some("<slow>") => {
        std::thread::sleep(Duration::from_millis(1500));
        Ok("{}".into())
      }
      Some(text) => Ok(text.to_string()),
      None => Err(AnalyzerError::generation("no more responses")),
    }
  }
}

#[derive(Default)]
struct Degradations(Mutex<Vec<(String, Stage)>>);

impl Observer for Degradations {
  fn degraded(&self, repo: &str, stage: Stage, _reason: &str) {
    self.0.lock().unwrap().push((repo.to_string(), stage));
  }
}

fn factory() -> Arc<DefaultSourceFactory> {
  Arc::new(DefaultSourceFactory {
    fixture: Some(FixtureSet::load(&common::repos_fixture()).unwrap()),
    token: None,
    http_timeout: Duration::from_secs(5),
    max_commit_pages: 1,
  })
}

#[test]
fn prose_wrapped_assessment_is_extracted() {
  test_support::init_tracing();
  let gen = Canned::new(&[
    "Integrates through ContractKit.",
    "Sure! Here is my review:\n```json\n{\"readability\":{\"score\":80,\"reasoning\":\"tidy\"},\"standards\":{\"score\":70},\"complexity\":{\"score\":60},\"testing\":{\"score\":50},\"strengths\":[\"small\"]}\n```\nHope this helps.",
  ]);
  let analyzer = Analyzer::new(AnalyzerConfig::default(), factory(), Arc::new(Degradations::default()))
    .with_generator(Some(gen));

  let r = analyzer.analyze_repository(&RepoDescriptor::new("acme", "celo-pay"), "");
  assert_eq!(r.quality.readability, 80.0);
  assert_eq!(r.quality.testing, 50.0);
  assert_eq!(r.quality.overall_score, 65.0);
  assert_eq!(r.quality.rationales.readability.as_deref(), Some("tidy"));
  assert!(r.quality.note.is_none());
  assert_eq!(r.integration.analysis.as_deref(), Some("Integrates through ContractKit."));
}

#[test]
fn quality_timeout_falls_back_to_heuristics() {
  let mut cfg = AnalyzerConfig::default();
  cfg.timeouts.quality_secs = 1;
  let observer = Arc::new(Degradations::default());
  let gen = Canned::new(&["Integrates through ContractKit.", "<slow>"]);
  let analyzer = Analyzer::new(cfg, factory(), observer.clone()).with_generator(Some(gen));

  let r = analyzer.analyze_repository(&RepoDescriptor::new("acme", "celo-pay"), "");
  let note = r.quality.note.clone().unwrap();
  assert!(note.starts_with("Heuristic scores"));
  assert!(note.contains("timed out"));
  assert_eq!(r.quality.metrics.total_files, 8);
  assert!((0.0..=100.0).contains(&r.quality.overall_score));
  assert!(observer
    .0
    .lock()
    .unwrap()
    .iter()
    .any(|(repo, stage)| repo == "acme/celo-pay" && *stage == Stage::Quality));
}

#[test]
fn confident_estimate_marks_repository_integrated() {
  let gen = Canned::new(&[
    "{'likely_integrated': True, 'confidence': 85, 'reasons': ['mentions Mento stable assets']}",
    "Estimated from metadata.",
  ]);
  let mut cfg = AnalyzerConfig::default();
  cfg.keywords = vec!["minipay".into()];
  let analyzer = Analyzer::new(cfg, factory(), Arc::new(Degradations::default())).with_generator(Some(gen));

  let r = analyzer.analyze_repository(&RepoDescriptor::new("acme", "readme-only"), "");
  assert!(r.integration.integrated);
  assert_eq!(r.integration.evidence[0].file, "AI analysis");
  assert_eq!(r.integration.evidence[0].keyword, "mentions Mento stable assets");
  assert_eq!(r.integration.confidence, Some(85.0));
}
