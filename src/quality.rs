// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Quality assessment and deep analysis over a repository digest, with heuristic and fixed fallbacks
// role: pipeline/quality
// inputs: Repository digest, FileMetrics, RepoMetadata, optional GenerationClient, AnalyzerConfig (weights, timeouts, generation)
// outputs: QualityResult (overall score always derived from components) and DeepAnalysis
// invariants:
// - component scores are clamped to 0-100
// - overall_score = weighted_score(components) regardless of what the backend reports
// - generation failure or timeout yields heuristic scores with a note; unparseable output yields 70 per component
// errors: None surfaced; every failure maps to a fallback result
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::ext::serde_json::JsonFetch;
use crate::generation::{complete_bounded, GenerationClient, RetryPolicy};
use crate::json_extract;
use crate::model::{
  ComponentRationales, DeepAnalysis, FileMetrics, QualityResult, RepoDescriptor, RepoMetadata, ANALYSIS_UNAVAILABLE,
};
use crate::score::{clamp_score, heuristic_scores, ComponentScores};

pub const FALLBACK_COMPONENT_SCORE: f64 = 70.0;
pub const NOTE_GENERATION_DISABLED: &str = "Heuristic scores: generation backend not configured";
pub const NOTE_NO_ACCESS: &str = "Heuristic scores: repository content not accessible";

const COMPONENTS: [&str; 4] = ["readability", "standards", "complexity", "testing"];

fn quality_prompt(repo: &RepoDescriptor, digest: &str) -> String {
  format!(
    "You are reviewing the GitHub repository {}. Using the digest below, rate the code on four components \
     from 0 to 100: readability, standards, complexity (higher is simpler), testing. \
     Respond with JSON only:\n\
     {{\"readability\": {{\"score\": 0, \"reasoning\": \"\"}}, \"standards\": {{\"score\": 0, \"reasoning\": \"\"}}, \
     \"complexity\": {{\"score\": 0, \"reasoning\": \"\"}}, \"testing\": {{\"score\": 0, \"reasoning\": \"\"}}, \
     \"strengths\": [\"\"], \"improvements\": [\"\"]}}\n\n{}",
    repo.full_name(),
    digest
  )
}

fn deep_prompt(repo: &RepoDescriptor, digest: &str) -> String {
  format!(
    "Perform an in-depth technical review of the GitHub repository {} from the digest below. \
     Respond with JSON only, with string fields architecture, code_organization, security, \
     error_handling, celo_usage and a recommendations array of strings.\n\n{}",
    repo.full_name(),
    digest
  )
}

fn quality_fallback() -> Value {
  let component = json!({ "score": FALLBACK_COMPONENT_SCORE, "reasoning": ANALYSIS_UNAVAILABLE });
  json!({
    "readability": component,
    "standards": component,
    "complexity": component,
    "testing": component,
    "strengths": [],
    "improvements": [],
  })
}

fn rationale(v: &Value, component: &str) -> Option<String> {
  ["reasoning", "rationale", "explanation"]
    .iter()
    .find_map(|k| v.fetch(&format!("{}.{}", component, k)).to::<String>())
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
}

/// Normalise a parsed assessment into a `QualityResult`; missing components score the fallback value.
pub fn quality_from_json(v: &Value, metrics: FileMetrics, cfg: &AnalyzerConfig) -> QualityResult {
  let score = |c: &str| clamp_score(v.fetch(c).as_lenient_f64().unwrap_or(FALLBACK_COMPONENT_SCORE));
  let scores = ComponentScores {
    readability: score(COMPONENTS[0]),
    standards: score(COMPONENTS[1]),
    complexity: score(COMPONENTS[2]),
    testing: score(COMPONENTS[3]),
  };

  QualityResult {
    overall_score: scores.overall(&cfg.weights),
    readability: scores.readability,
    standards: scores.standards,
    complexity: scores.complexity,
    testing: scores.testing,
    rationales: ComponentRationales {
      readability: rationale(v, COMPONENTS[0]),
      standards: rationale(v, COMPONENTS[1]),
      complexity: rationale(v, COMPONENTS[2]),
      testing: rationale(v, COMPONENTS[3]),
    },
    metrics,
    strengths: v.fetch("strengths").as_string_list(),
    improvements: v.fetch("improvements").as_string_list(),
    note: None,
    error: None,
  }
}

/// Scores from file counts and metadata only, tagged with `note`.
pub fn heuristic_quality(metrics: FileMetrics, metadata: &RepoMetadata, note: &str, cfg: &AnalyzerConfig) -> QualityResult {
  let s = heuristic_scores(&metrics, metadata);
  QualityResult {
    overall_score: s.overall(&cfg.weights),
    readability: s.readability,
    standards: s.standards,
    complexity: s.complexity,
    testing: s.testing,
    metrics,
    note: Some(note.to_string()),
    ..Default::default()
  }
}

pub fn assess_quality(
  repo: &RepoDescriptor,
  digest: &str,
  metrics: FileMetrics,
  metadata: &RepoMetadata,
  client: Option<&Arc<dyn GenerationClient>>,
  cfg: &AnalyzerConfig,
) -> QualityResult {
  let Some(client) = client else {
    return heuristic_quality(metrics, metadata, NOTE_GENERATION_DISABLED, cfg);
  };

  let raw = match complete_bounded(
    client,
    &quality_prompt(repo, digest),
    cfg.generation.temperature,
    cfg.timeouts.quality(),
    RetryPolicy::from(&cfg.generation),
  ) {
    Ok(text) => text,
    Err(e) => {
      warn!(repo = %repo.full_name(), error = %e, "quality assessment unavailable; using heuristics");
      let mut q = heuristic_quality(metrics, metadata, &format!("Heuristic scores: {}", e), cfg);
      q.error = Some(e.to_string());
      return q;
    }
  };

  let v = json_extract::extract_or(&raw, quality_fallback());
  debug!(repo = %repo.full_name(), "quality assessment parsed");
  quality_from_json(&v, metrics, cfg)
}

fn text_field(v: &Value, key: &str) -> String {
  match v.fetch(key).value() {
    Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
    Some(Value::Array(_)) => v.fetch(key).as_string_list().join("; "),
    Some(other @ Value::Object(_)) => other.to_string(),
    _ => ANALYSIS_UNAVAILABLE.to_string(),
  }
}

pub fn deep_from_json(v: &Value) -> DeepAnalysis {
  DeepAnalysis {
    architecture: text_field(v, "architecture"),
    code_organization: text_field(v, "code_organization"),
    security: text_field(v, "security"),
    error_handling: text_field(v, "error_handling"),
    celo_usage: text_field(v, "celo_usage"),
    recommendations: v.fetch("recommendations").as_string_list(),
    available: true,
  }
}

pub fn deep_analysis(
  repo: &RepoDescriptor,
  digest: &str,
  client: &Arc<dyn GenerationClient>,
  cfg: &AnalyzerConfig,
) -> DeepAnalysis {
  let raw = match complete_bounded(
    client,
    &deep_prompt(repo, digest),
    cfg.generation.temperature,
    cfg.timeouts.deep(),
    RetryPolicy::from(&cfg.generation),
  ) {
    Ok(text) => text,
    Err(e) => {
      warn!(repo = %repo.full_name(), error = %e, "deep analysis unavailable");
      return DeepAnalysis::default();
    }
  };

  match json_extract::extract(&raw) {
    Some(v) => deep_from_json(&v),
    None => DeepAnalysis::default(),
  }
}
