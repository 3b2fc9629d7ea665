// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Layered integration-evidence search (no-access signals, targeted files, README, sampled corpus, generation estimate) plus the analysis summary
// role: pipeline/evidence
// inputs: EvidenceContext (descriptor, metadata, access flag, source, walker samples), optional GenerationClient, AnalyzerConfig
// outputs: IntegrationResult
// invariants:
// - stages run in fixed order and stop at the first one yielding evidence
// - without access only the name/description stage runs
// - the estimate stage is reached only with zero evidence and a generator; accepted only above 50 confidence
// - analysis is never empty when integrated
// errors: None surfaced; unreadable files are skipped, generation failures fall back to deterministic text
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::ext::serde_json::JsonFetch;
use crate::generation::{complete_bounded, GenerationClient, RetryPolicy};
use crate::json_extract;
use crate::model::{CodeSample, Evidence, IntegrationResult, RepoDescriptor, RepoMetadata};
use crate::source::RepositorySource;

pub const ORGANIZATION_NAME: &str = "Organization name";
pub const REPOSITORY_NAME: &str = "Repository name";
pub const REPOSITORY_DESCRIPTION: &str = "Repository description";
pub const AI_ANALYSIS: &str = "AI analysis";
pub const ESTIMATED_INTEGRATION: &str = "estimated integration";

/// Minimum self-reported confidence (exclusive) for a generated estimate to count.
pub const ESTIMATE_CONFIDENCE_THRESHOLD: f64 = 50.0;

/// Evidence lines included in the analysis prompt.
const ANALYSIS_EVIDENCE_LIMIT: usize = 10;

pub struct EvidenceContext<'a> {
  pub repo: &'a RepoDescriptor,
  pub metadata: &'a RepoMetadata,
  pub has_access: bool,
  pub source: &'a dyn RepositorySource,
  pub samples: &'a [CodeSample],
}

fn matching_keywords<'k>(haystack: &str, keywords: &'k [String]) -> Vec<&'k str> {
  let lower = haystack.to_lowercase();
  keywords.iter().filter(|k| lower.contains(k.as_str())).map(|k| k.as_str()).collect()
}

fn no_access_evidence(ctx: &EvidenceContext<'_>, keywords: &[String], cfg: &AnalyzerConfig) -> Vec<Evidence> {
  let mut out = Vec::new();
  let owner = ctx.repo.owner.to_lowercase();

  for signal in &cfg.evidence.organization_signals {
    let s = signal.trim().to_lowercase();
    if !s.is_empty() && owner.contains(&s) {
      out.push(Evidence::new(ORGANIZATION_NAME, signal.trim()));
    }
  }
  for kw in matching_keywords(&owner, keywords) {
    if !out.iter().any(|e| e.keyword.to_lowercase().contains(kw)) {
      out.push(Evidence::new(ORGANIZATION_NAME, kw));
    }
  }
  for kw in matching_keywords(&ctx.repo.name, keywords) {
    out.push(Evidence::new(REPOSITORY_NAME, kw));
  }
  for kw in matching_keywords(&ctx.metadata.description, keywords) {
    out.push(Evidence::new(REPOSITORY_DESCRIPTION, kw));
  }

  out
}

/// Every keyword found in every readable file of `paths`.
fn scan_files(source: &dyn RepositorySource, paths: &[String], keywords: &[String]) -> Vec<Evidence> {
  let mut out = Vec::new();

  for path in paths {
    let content = match source.get_file_content(path) {
      Ok(c) => c,
      Err(e) => {
        debug!(path = %path, error = %e, "evidence file not readable");
        continue;
      }
    };
    for kw in matching_keywords(&content, keywords) {
      out.push(Evidence::new(path, kw));
    }
  }

  out
}

/// One record per sample: the first keyword (in keyword order) it contains.
fn scan_samples(samples: &[CodeSample], keywords: &[String]) -> Vec<Evidence> {
  samples
    .iter()
    .filter_map(|s| {
      matching_keywords(&s.content, keywords)
        .first()
        .map(|kw| Evidence::new(&s.path, kw))
    })
    .collect()
}

fn estimate_prompt(ctx: &EvidenceContext<'_>, keywords: &[String]) -> String {
  let m = ctx.metadata;
  let languages: Vec<_> = m.languages.iter().map(|l| l.language.as_str()).collect();
  format!(
    "Estimate whether the GitHub repository below integrates with the ecosystem identified by these keywords: {}.\n\
     Repository: {}\nDescription: {}\nPrimary language: {}\nLanguages: {}\nHomepage: {}\n\n\
     Respond with JSON only: {{\"likely_integrated\": true|false, \"confidence\": 0-100, \"reasons\": [\"...\"]}}",
    keywords.join(", "),
    ctx.repo.full_name(),
    m.description,
    m.language,
    languages.join(", "),
    m.homepage,
  )
}

struct Estimate {
  evidence: Vec<Evidence>,
  confidence: f64,
}

fn generated_estimate(
  ctx: &EvidenceContext<'_>,
  client: &Arc<dyn GenerationClient>,
  keywords: &[String],
  cfg: &AnalyzerConfig,
) -> Estimate {
  let prompt = estimate_prompt(ctx, keywords);
  let raw = match complete_bounded(
    client,
    &prompt,
    cfg.generation.temperature,
    cfg.timeouts.integration(),
    RetryPolicy::from(&cfg.generation),
  ) {
    Ok(text) => text,
    Err(e) => {
      warn!(repo = %ctx.repo.full_name(), error = %e, "integration estimate unavailable");
      String::new()
    }
  };

  let v = json_extract::extract_or(
    &raw,
    json!({ "likely_integrated": false, "confidence": 0, "reasons": [] }),
  );

  let likely = v.fetch("likely_integrated").to::<bool>().unwrap_or(false);
  let confidence = v.fetch("confidence").as_lenient_f64().unwrap_or(0.0);
  let reasons = v.fetch("reasons").as_string_list();
  debug!(repo = %ctx.repo.full_name(), likely, confidence, "integration estimate parsed");

  let mut evidence = Vec::new();
  if likely && confidence > ESTIMATE_CONFIDENCE_THRESHOLD {
    evidence = reasons.iter().map(|r| Evidence::new(AI_ANALYSIS, r)).collect();
    if evidence.is_empty() {
      evidence.push(Evidence::new(AI_ANALYSIS, ESTIMATED_INTEGRATION));
    }
  }

  Estimate { evidence, confidence }
}

/// Deterministic summary used whenever a generated one is unavailable.
pub fn fallback_analysis(evidence: &[Evidence]) -> String {
  let files: HashSet<&str> = evidence.iter().map(|e| e.file.as_str()).collect();
  let mut keywords: Vec<&str> = Vec::new();
  for e in evidence {
    if !keywords.contains(&e.keyword.as_str()) {
      keywords.push(&e.keyword);
    }
  }

  format!(
    "Found {} evidence item(s) of integration across {} file(s) matching {} distinct keyword(s): {}.",
    evidence.len(),
    files.len(),
    keywords.len(),
    keywords.join(", ")
  )
}

/// Evidence lines for the analysis prompt: the first ten, then a count of the rest.
pub fn format_evidence_lines(evidence: &[Evidence]) -> String {
  let mut lines: Vec<String> = evidence
    .iter()
    .take(ANALYSIS_EVIDENCE_LIMIT)
    .map(|e| format!("- {}: {}", e.file, e.keyword))
    .collect();
  if evidence.len() > ANALYSIS_EVIDENCE_LIMIT {
    lines.push(format!("... and {} more", evidence.len() - ANALYSIS_EVIDENCE_LIMIT));
  }
  lines.join("\n")
}

fn summarize(
  ctx: &EvidenceContext<'_>,
  evidence: &[Evidence],
  client: Option<&Arc<dyn GenerationClient>>,
  cfg: &AnalyzerConfig,
) -> String {
  let Some(client) = client else {
    return fallback_analysis(evidence);
  };

  let prompt = format!(
    "Summarize in two or three sentences how the repository {} integrates with the ecosystem, based on this evidence:\n{}",
    ctx.repo.full_name(),
    format_evidence_lines(evidence)
  );

  match complete_bounded(
    client,
    &prompt,
    cfg.generation.temperature,
    cfg.timeouts.integration(),
    RetryPolicy::from(&cfg.generation),
  ) {
    Ok(text) => text.trim().to_string(),
    Err(e) => {
      warn!(repo = %ctx.repo.full_name(), error = %e, "integration summary unavailable");
      fallback_analysis(evidence)
    }
  }
}

pub fn find_evidence(
  ctx: &EvidenceContext<'_>,
  client: Option<&Arc<dyn GenerationClient>>,
  cfg: &AnalyzerConfig,
) -> IntegrationResult {
  let keywords = cfg.normalized_keywords();
  let mut confidence = None;

  let mut evidence = if !ctx.has_access {
    no_access_evidence(ctx, &keywords, cfg)
  } else {
    let mut found = scan_files(ctx.source, &cfg.evidence.targeted_files, &keywords);
    if found.is_empty() {
      found = scan_files(ctx.source, &cfg.evidence.readme_paths, &keywords);
    }
    if found.is_empty() {
      found = scan_samples(ctx.samples, &keywords);
    }
    found
  };

  if evidence.is_empty() {
    if let Some(c) = client {
      let est = generated_estimate(ctx, c, &keywords, cfg);
      confidence = Some(est.confidence);
      evidence = est.evidence;
    }
  }

  if evidence.is_empty() {
    return IntegrationResult {
      confidence,
      ..Default::default()
    };
  }

  let analysis = summarize(ctx, &evidence, client, cfg);
  let integrated = !evidence.is_empty();

  IntegrationResult {
    integrated,
    repositories_with_celo: usize::from(integrated),
    evidence,
    analysis: Some(analysis),
    confidence,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::AnalyzerError;
  use crate::generation::ScriptedClient;
  use crate::source::fixture::{FixtureRepo, FixtureSource};
  use crate::error::AnalyzerResult;
  use crate::source::{ContentEntry, NoAccessSource};
  use std::cell::RefCell;
  use std::time::Duration;

  fn cfg() -> AnalyzerConfig {
    let mut c = AnalyzerConfig::default();
    c.generation.retry_backoff_ms = 1;
    c.timeouts.integration_secs = 5;
    c
  }

  fn fixture(files: &[(&str, &str)]) -> FixtureSource {
    let mut repo = FixtureRepo::default();
    for (p, c) in files {
      repo.files.insert(p.to_string(), c.to_string());
    }
    FixtureSource::new(RepoDescriptor::new("acme", "pay"), repo)
  }

  fn client(responses: Vec<Result<String, AnalyzerError>>) -> Arc<dyn GenerationClient> {
    Arc::new(ScriptedClient::new(responses))
  }

  #[test]
  fn organization_signal_without_access() {
    let repo = RepoDescriptor::new("celo-org", "docs");
    let md = RepoMetadata::from_descriptor(&repo);
    let src = NoAccessSource::new(&repo);
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: false,
      source: &src,
      samples: &[],
    };

    let res = find_evidence(&ctx, None, &cfg());
    assert!(res.integrated);
    assert!(res
      .evidence
      .iter()
      .any(|e| e.file == ORGANIZATION_NAME && e.keyword == "celo-org"));
    assert!(res.analysis.is_some());
  }

  #[test]
  fn owner_containing_keyword_without_access() {
    let repo = RepoDescriptor::new("celo-community", "toolkit");
    let md = RepoMetadata::from_descriptor(&repo);
    let src = NoAccessSource::new(&repo);
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: false,
      source: &src,
      samples: &[],
    };

    let res = find_evidence(&ctx, None, &cfg());
    assert!(res.integrated);
    assert_eq!(res.evidence, vec![Evidence::new(ORGANIZATION_NAME, "celo")]);
  }

  #[test]
  fn owner_keyword_covered_by_signal_is_not_repeated() {
    let repo = RepoDescriptor::new("celo-org", "docs");
    let md = RepoMetadata::from_descriptor(&repo);
    let src = NoAccessSource::new(&repo);
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: false,
      source: &src,
      samples: &[],
    };

    let res = find_evidence(&ctx, None, &cfg());
    assert_eq!(res.evidence, vec![Evidence::new(ORGANIZATION_NAME, "celo-org")]);
  }

  #[test]
  fn name_and_description_without_access() {
    let repo = RepoDescriptor::new("someone", "Valora-Plugin");
    let md = RepoMetadata {
      description: "Pays in cUSD".into(),
      ..Default::default()
    };
    let src = NoAccessSource::new(&repo);
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: false,
      source: &src,
      samples: &[],
    };

    let res = find_evidence(&ctx, None, &cfg());
    let files: Vec<_> = res.evidence.iter().map(|e| e.file.as_str()).collect();
    assert_eq!(files, vec![REPOSITORY_NAME, REPOSITORY_DESCRIPTION]);
  }

  #[test]
  fn readme_only_match_yields_single_record() {
    let src = fixture(&[
      ("package.json", r#"{"name":"pay","dependencies":{"react":"18"}}"#),
      ("docs/README.md", "Built on celo."),
      ("src/index.ts", "export const x = 1;"),
    ]);
    let repo = RepoDescriptor::new("acme", "pay");
    let md = RepoMetadata::default();
    let samples = vec![CodeSample {
      path: "src/index.ts".into(),
      content: "export const x = 1;".into(),
    }];
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: true,
      source: &src,
      samples: &samples,
    };

    let res = find_evidence(&ctx, None, &cfg());
    assert_eq!(res.evidence, vec![Evidence::new("docs/README.md", "celo")]);
  }

  /// Records every file fetched through it.
  struct Counting {
    inner: FixtureSource,
    fetched: RefCell<Vec<String>>,
  }

  impl Counting {
    fn new(inner: FixtureSource) -> Self {
      Self { inner, fetched: RefCell::new(Vec::new()) }
    }

    fn fetched(&self) -> Vec<String> {
      self.fetched.borrow().clone()
    }
  }

  impl RepositorySource for Counting {
    fn has_access(&self) -> bool {
      self.inner.has_access()
    }
    fn list_contents(&self, path: &str) -> AnalyzerResult<Vec<ContentEntry>> {
      self.inner.list_contents(path)
    }
    fn get_file_content(&self, path: &str) -> AnalyzerResult<String> {
      self.fetched.borrow_mut().push(path.to_string());
      self.inner.get_file_content(path)
    }
    fn get_metadata(&self) -> AnalyzerResult<RepoMetadata> {
      self.inner.get_metadata()
    }
  }

  #[test]
  fn targeted_files_take_precedence_over_readme() {
    let src = Counting::new(fixture(&[
      ("package.json", r#"{"dependencies":{"@celo/contractkit":"1.0"}}"#),
      ("README.md", "Uses minipay"),
    ]));
    let repo = RepoDescriptor::new("acme", "pay");
    let md = RepoMetadata::default();
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: true,
      source: &src,
      samples: &[],
    };

    let res = find_evidence(&ctx, None, &cfg());
    assert!(res.evidence.iter().all(|e| e.file == "package.json"));
    let fetched = src.fetched();
    assert_eq!(fetched.len(), cfg().evidence.targeted_files.len());
    assert!(fetched.iter().all(|p| !p.to_lowercase().contains("readme")));
    let kws: Vec<_> = res.evidence.iter().map(|e| e.keyword.as_str()).collect();
    assert_eq!(kws, vec!["celo", "contractkit", "@celo"]);
  }

  #[test]
  fn corpus_stage_records_first_keyword_per_file() {
    let src = fixture(&[("src/a.ts", "")]);
    let repo = RepoDescriptor::new("acme", "pay");
    let md = RepoMetadata::default();
    let samples = vec![
      CodeSample {
        path: "src/a.ts".into(),
        content: "import { Valora } from 'x'; // celo".into(),
      },
      CodeSample {
        path: "src/b.ts".into(),
        content: "nothing here".into(),
      },
    ];
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: true,
      source: &src,
      samples: &samples,
    };

    let res = find_evidence(&ctx, None, &cfg());
    assert_eq!(res.evidence, vec![Evidence::new("src/a.ts", "celo")]);
  }

  #[test]
  fn estimate_accepted_above_threshold() {
    let src = fixture(&[("src/a.ts", "")]);
    let repo = RepoDescriptor::new("acme", "pay");
    let md = RepoMetadata::default();
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: true,
      source: &src,
      samples: &[],
    };
    let c = client(vec![
      Ok(r#"{"likely_integrated": true, "confidence": 72, "reasons": ["stablecoin payments"]}"#.into()),
      Ok("Uses stablecoin payments.".into()),
    ]);

    let res = find_evidence(&ctx, Some(&c), &cfg());
    assert!(res.integrated);
    assert_eq!(res.evidence, vec![Evidence::new(AI_ANALYSIS, "stablecoin payments")]);
    assert_eq!(res.confidence, Some(72.0));
    assert_eq!(res.analysis.as_deref(), Some("Uses stablecoin payments."));
  }

  #[test]
  fn estimate_rejected_at_threshold() {
    let src = fixture(&[("src/a.ts", "")]);
    let repo = RepoDescriptor::new("acme", "pay");
    let md = RepoMetadata::default();
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: true,
      source: &src,
      samples: &[],
    };
    let c = client(vec![Ok(
      r#"{"likely_integrated": true, "confidence": 50, "reasons": ["maybe"]}"#.into(),
    )]);

    let res = find_evidence(&ctx, Some(&c), &cfg());
    assert!(!res.integrated);
    assert!(res.evidence.is_empty());
    assert!(res.analysis.is_none());
  }

  #[test]
  fn estimate_without_reasons_records_placeholder() {
    let src = fixture(&[("src/a.ts", "")]);
    let repo = RepoDescriptor::new("acme", "pay");
    let md = RepoMetadata::default();
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: true,
      source: &src,
      samples: &[],
    };
    let c = client(vec![
      Ok("{likely_integrated: True, confidence: '90'}".into()),
      Err(AnalyzerError::generation("HTTP 400")),
    ]);

    let res = find_evidence(&ctx, Some(&c), &cfg());
    assert_eq!(res.evidence, vec![Evidence::new(AI_ANALYSIS, ESTIMATED_INTEGRATION)]);
    assert_eq!(
      res.analysis.as_deref(),
      Some("Found 1 evidence item(s) of integration across 1 file(s) matching 1 distinct keyword(s): estimated integration.")
    );
  }

  #[test]
  fn summary_timeout_falls_back_to_deterministic_sentence() {
    let src = fixture(&[("hardhat.config.ts", "network: alfajores, celo")]);
    let repo = RepoDescriptor::new("acme", "pay");
    let md = RepoMetadata::default();
    let ctx = EvidenceContext {
      repo: &repo,
      metadata: &md,
      has_access: true,
      source: &src,
      samples: &[],
    };
    let slow: Arc<dyn GenerationClient> =
      Arc::new(ScriptedClient::new(vec![Ok("too late".into())]).with_delay(Duration::from_millis(1500)));
    let mut c = cfg();
    c.timeouts.integration_secs = 1;

    let res = find_evidence(&ctx, Some(&slow), &c);
    assert_eq!(
      res.analysis.as_deref(),
      Some("Found 2 evidence item(s) of integration across 1 file(s) matching 2 distinct keyword(s): celo, alfajores.")
    );
  }

  #[test]
  fn evidence_lines_are_capped() {
    let ev: Vec<_> = (0..13).map(|i| Evidence::new(&format!("f{}", i), "celo")).collect();
    let text = format_evidence_lines(&ev);
    assert_eq!(text.lines().count(), 11);
    assert!(text.ends_with("... and 3 more"));
  }
}
