// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Injected progress/event callbacks passed explicitly through each pipeline stage
// role: observability/observer
// outputs: Observer trait, TracingObserver (tracing events), NullObserver
// invariants: Observers must be Send + Sync so batch workers can share one instance
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use tracing::{info, warn};

/// Pipeline stages reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Metadata,
  Walk,
  Evidence,
  Mining,
  Quality,
  DeepAnalysis,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Metadata => "metadata",
      Stage::Walk => "walk",
      Stage::Evidence => "evidence",
      Stage::Mining => "mining",
      Stage::Quality => "quality",
      Stage::DeepAnalysis => "deep-analysis",
    }
  }
}

pub trait Observer: Send + Sync {
  fn stage_started(&self, _repo: &str, _stage: Stage) {}

  /// Walk progress; invoked at a bounded rate, not per file.
  fn walk_progress(&self, _repo: &str, _files_processed: usize, _samples: usize) {}

  /// A stage fell back to a degraded result.
  fn degraded(&self, _repo: &str, _stage: Stage, _reason: &str) {}

  fn repository_finished(&self, _repo: &str, _ok: bool) {}
}

pub struct NullObserver;

impl Observer for NullObserver {}

/// Routes pipeline events to `tracing`.
pub struct TracingObserver;

impl Observer for TracingObserver {
  fn stage_started(&self, repo: &str, stage: Stage) {
    info!(repo, stage = stage.as_str(), "stage started");
  }

  fn walk_progress(&self, repo: &str, files_processed: usize, samples: usize) {
    info!(repo, files_processed, samples, "walking repository");
  }

  fn degraded(&self, repo: &str, stage: Stage, reason: &str) {
    warn!(repo, stage = stage.as_str(), reason, "stage degraded to fallback");
  }

  fn repository_finished(&self, repo: &str, ok: bool) {
    info!(repo, ok, "repository analysis finished");
  }
}
