// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Per-repository pipeline (metadata, walk, evidence, mining, digest, quality, deep analysis), per-project aggregation and the bounded batch runner
// role: pipeline/orchestration
// inputs: AnalyzerConfig, SourceFactory, optional GenerationClient, Observer, ProjectInput list
// outputs: AnalysisResult per repository, ProjectResult per project, BatchSummary per run
// invariants:
// - an AnalysisResult is always structurally complete, even when every stage degraded
// - without access the walker is skipped and only name/description evidence plus heuristic quality is produced
// - project overall_score is the mean over repositories without errors (0 when none)
// - the stop flag is checked between repository analyses; skipped projects are reported, never dropped
// errors: Stage failures become fallbacks; only pool construction surfaces an error
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::digest::{build_digest, DigestInput};
use crate::evidence::{fallback_analysis, find_evidence, EvidenceContext};
use crate::generation::GenerationClient;
use crate::miner;
use crate::model::{
  AnalysisResult, BatchSummary, FileMetrics, IntegrationResult, ProjectInput, ProjectResult, RepoDescriptor,
  RepoMetadata,
};
use crate::observer::{Observer, Stage};
use crate::quality::{assess_quality, deep_analysis, heuristic_quality, NOTE_NO_ACCESS};
use crate::source::{parse_repo_url, RepositorySource, SourceFactory};
use crate::walker::{walk, WalkOutput};

pub const CANCELLED: &str = "cancelled before analysis";

pub struct Analyzer {
  cfg: AnalyzerConfig,
  sources: Arc<dyn SourceFactory>,
  generator: Option<Arc<dyn GenerationClient>>,
  observer: Arc<dyn Observer>,
  deep: bool,
  stop: Arc<AtomicBool>,
}

impl Analyzer {
  pub fn new(cfg: AnalyzerConfig, sources: Arc<dyn SourceFactory>, observer: Arc<dyn Observer>) -> Self {
    Self {
      cfg,
      sources,
      generator: None,
      observer,
      deep: false,
      stop: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn with_generator(mut self, generator: Option<Arc<dyn GenerationClient>>) -> Self {
    self.generator = generator;
    self
  }

  pub fn with_deep_analysis(mut self, deep: bool) -> Self {
    self.deep = deep;
    self
  }

  /// Setting the returned flag stops the batch before its next repository analysis.
  pub fn stop_handle(&self) -> Arc<AtomicBool> {
    self.stop.clone()
  }

  pub fn config(&self) -> &AnalyzerConfig {
    &self.cfg
  }

  fn stopped(&self) -> bool {
    self.stop.load(Ordering::Relaxed)
  }

  fn first_readme(&self, source: &dyn RepositorySource) -> Option<String> {
    self
      .cfg
      .evidence
      .readme_paths
      .iter()
      .find_map(|p| source.get_file_content(p).ok())
  }

  /// Analyse one repository. `description_hint` fills in an empty metadata description.
  pub fn analyze_repository(&self, repo: &RepoDescriptor, description_hint: &str) -> AnalysisResult {
    let label = repo.full_name();
    let obs = self.observer.as_ref();
    let generator = self.generator.as_ref();

    obs.stage_started(&label, Stage::Metadata);
    let source = self.sources.open(repo);
    let mut has_access = source.has_access();

    let mut metadata = source.get_metadata().unwrap_or_else(|e| {
      obs.degraded(&label, Stage::Metadata, &e.to_string());
      RepoMetadata::from_descriptor(repo)
    });
    if metadata.name.is_empty() {
      metadata.name = repo.name.clone();
    }
    if metadata.description.trim().is_empty() && !description_hint.trim().is_empty() {
      metadata.description = description_hint.trim().to_string();
    }

    let mut error = None;
    let mut walked = WalkOutput::default();
    if has_access {
      obs.stage_started(&label, Stage::Walk);
      match walk(source.as_ref(), &self.cfg.caps, &label, obs) {
        Ok(w) => walked = w,
        Err(e) => {
          obs.degraded(&label, Stage::Walk, &e.to_string());
          error = Some(e.to_string());
          has_access = false;
        }
      }
    } else {
      debug!(repo = %label, "no repository access; skipping walk");
    }

    obs.stage_started(&label, Stage::Evidence);
    let integration = find_evidence(
      &EvidenceContext {
        repo,
        metadata: &metadata,
        has_access,
        source: source.as_ref(),
        samples: &walked.samples,
      },
      generator,
      &self.cfg,
    );

    obs.stage_started(&label, Stage::Mining);
    let readme = if has_access { self.first_readme(source.as_ref()) } else { None };
    let mined = miner::mine(readme.as_deref(), &walked.samples, &metadata.homepage);

    obs.stage_started(&label, Stage::Quality);
    let digest = build_digest(&DigestInput {
      repo,
      metadata: &metadata,
      metrics: &walked.metrics,
      classifications: &walked.classifications,
      evidence: &integration.evidence,
      addresses: &mined.addresses,
      deployment_urls: &mined.urls,
      samples: &walked.samples,
      max_chars: self.cfg.caps.max_digest_chars,
    });

    let quality = if has_access {
      assess_quality(repo, &digest, walked.metrics, &metadata, generator, &self.cfg)
    } else {
      heuristic_quality(FileMetrics::default(), &metadata, NOTE_NO_ACCESS, &self.cfg)
    };
    if let Some(note) = &quality.note {
      obs.degraded(&label, Stage::Quality, note);
    }

    let deep = match (self.deep && has_access, generator) {
      (true, Some(g)) => {
        obs.stage_started(&label, Stage::DeepAnalysis);
        let d = deep_analysis(repo, &digest, g, &self.cfg);
        if !d.available {
          obs.degraded(&label, Stage::DeepAnalysis, "deep analysis unavailable");
        }
        Some(d)
      }
      _ => None,
    };

    obs.repository_finished(&label, error.is_none());

    AnalysisResult {
      repo: repo.clone(),
      metadata,
      quality,
      integration,
      addresses: mined.addresses,
      deployment_urls: mined.urls,
      deep_analysis: deep,
      error,
    }
  }

  pub fn analyze_project(&self, input: &ProjectInput) -> ProjectResult {
    let mut repositories = Vec::new();

    for url in &input.urls {
      if self.stopped() {
        info!(project = %input.name, "stop requested; skipping remaining repositories");
        break;
      }
      match parse_repo_url(url) {
        Some(repo) => repositories.push(self.analyze_repository(&repo, &input.description)),
        None => {
          warn!(project = %input.name, url = %url, "not a GitHub repository URL");
          repositories.push(AnalysisResult {
            repo: RepoDescriptor {
              url: url.clone(),
              ..Default::default()
            },
            error: Some(format!("unrecognized repository URL: {}", url)),
            ..Default::default()
          });
        }
      }
    }

    let error = if input.urls.is_empty() {
      Some("no repository URLs".to_string())
    } else if repositories.len() < input.urls.len() {
      Some(CANCELLED.to_string())
    } else {
      None
    };

    aggregate_project(input, repositories, error)
  }

  pub fn run_batch(&self, projects: &[ProjectInput]) -> BatchSummary {
    let analyze = |p: &ProjectInput| {
      if self.stopped() {
        cancelled_project(p)
      } else {
        self.analyze_project(p)
      }
    };

    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(self.cfg.batch.concurrency.max(1))
      .build();

    let results: Vec<ProjectResult> = match pool {
      Ok(pool) => pool.install(|| projects.par_iter().map(analyze).collect()),
      Err(e) => {
        warn!(error = %e, "thread pool unavailable; analysing sequentially");
        projects.iter().map(analyze).collect()
      }
    };

    let failures = results.iter().filter(|p| project_failed(p)).count();
    info!(total = results.len(), failures, "batch finished");

    BatchSummary {
      total: results.len(),
      failures,
      projects: results,
    }
  }
}

fn project_failed(p: &ProjectResult) -> bool {
  p.error.is_some() || p.repositories.iter().any(|r| r.error.is_some())
}

fn cancelled_project(input: &ProjectInput) -> ProjectResult {
  ProjectResult {
    project_name: input.name.clone(),
    project_description: input.description.clone(),
    error: Some(CANCELLED.to_string()),
    ..Default::default()
  }
}

/// Combine per-repository results: mean score over clean analyses, OR of integration, tagged evidence.
pub fn aggregate_project(input: &ProjectInput, repositories: Vec<AnalysisResult>, error: Option<String>) -> ProjectResult {
  let scores: Vec<f64> = repositories
    .iter()
    .filter(|r| r.error.is_none())
    .map(|r| r.quality.overall_score)
    .collect();
  let overall_score = if scores.is_empty() {
    0.0
  } else {
    (scores.iter().sum::<f64>() / scores.len() as f64 * 100.0).round() / 100.0
  };

  let mut integration = IntegrationResult::default();
  let mut analyses = Vec::new();
  for r in repositories.iter().filter(|r| r.integration.integrated) {
    let name = r.repo.full_name();
    integration.integrated = true;
    integration.repositories_with_celo += 1;
    integration.evidence.extend(r.integration.evidence.iter().cloned().map(|mut e| {
      e.repository = Some(name.clone());
      e
    }));
    if let Some(a) = &r.integration.analysis {
      analyses.push(format!("{}: {}", name, a));
    }
  }
  if integration.integrated {
    integration.analysis = Some(if analyses.is_empty() {
      fallback_analysis(&integration.evidence)
    } else {
      analyses.join("\n")
    });
  }

  ProjectResult {
    project_name: input.name.clone(),
    project_description: input.description.clone(),
    repositories,
    overall_score,
    integration,
    error,
  }
}
