// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Weighted overall quality score and metadata-driven heuristic component scores
// role: scoring/aggregate
// inputs: Four component scores (0-100), ScoreWeights; FileMetrics and RepoMetadata for heuristics
// outputs: Overall score rounded to 2 decimals; ComponentScores clamped to 0-100
// invariants: weighted_score is linear in every component; heuristics never leave 0-100
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::config::ScoreWeights;
use crate::model::{FileMetrics, RepoMetadata};

/// Repositories above this size (KB) start losing complexity points.
const LARGE_REPO_KB: u64 = 20_000;
const SIZE_PENALTY_STEP_KB: u64 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentScores {
  pub readability: f64,
  pub standards: f64,
  pub complexity: f64,
  pub testing: f64,
}

pub fn clamp_score(v: f64) -> f64 {
  if v.is_nan() {
    0.0
  } else {
    v.clamp(0.0, 100.0)
  }
}

fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}

/// `(r/100*wr + s/100*ws + c/100*wc + t/100*wt) * 100`, rounded to two decimals.
pub fn weighted_score(readability: f64, standards: f64, complexity: f64, testing: f64, w: &ScoreWeights) -> f64 {
  let sum = readability / 100.0 * w.readability
    + standards / 100.0 * w.standards
    + complexity / 100.0 * w.complexity
    + testing / 100.0 * w.testing;
  round2(sum * 100.0)
}

impl ComponentScores {
  pub fn overall(&self, w: &ScoreWeights) -> f64 {
    weighted_score(self.readability, self.standards, self.complexity, self.testing, w)
  }
}

/// Component scores derived from file counts and metadata alone.
pub fn heuristic_scores(metrics: &FileMetrics, metadata: &RepoMetadata) -> ComponentScores {
  let total = metrics.total_files as f64;
  let ratio = |n: usize| if total > 0.0 { n as f64 / total } else { 0.0 };
  let has_description = !metadata.description.trim().is_empty();

  let doc_bonus = (ratio(metrics.doc_files) * 100.0).min(20.0);
  let readme_bonus = if metrics.doc_files > 0 || has_description { 5.0 } else { 0.0 };
  let readability = 60.0 + doc_bonus + readme_bonus;

  let mut standards = 60.0;
  if !metadata.license.trim().is_empty() {
    standards += 10.0;
  }
  if has_description {
    standards += 5.0;
  }
  if metrics.code_files_analyzed > 0 {
    standards += 5.0;
  }

  let size_penalty = if metadata.size_kb > LARGE_REPO_KB {
    ((metadata.size_kb - LARGE_REPO_KB) / SIZE_PENALTY_STEP_KB).min(20) as f64
  } else {
    0.0
  };
  let complexity = 70.0 - size_penalty;

  let testing = if metrics.test_files == 0 {
    10.0
  } else {
    (20.0 + ratio(metrics.test_files) * 200.0).min(100.0)
  };

  ComponentScores {
    readability: clamp_score(readability),
    standards: clamp_score(standards),
    complexity: clamp_score(complexity),
    testing: clamp_score(testing),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn equal_weights_average() {
    let w = ScoreWeights::default();
    assert_eq!(weighted_score(80.0, 60.0, 70.0, 50.0, &w), 65.0);
    assert_eq!(weighted_score(100.0, 100.0, 100.0, 100.0, &w), 100.0);
    assert_eq!(weighted_score(0.0, 0.0, 0.0, 0.0, &w), 0.0);
  }

  #[test]
  fn rounds_to_two_decimals() {
    let w = ScoreWeights {
      readability: 0.3,
      standards: 0.3,
      complexity: 0.3,
      testing: 0.1,
    };
    assert_eq!(weighted_score(33.333, 66.667, 12.5, 1.0, &w), 33.85);
  }

  #[test]
  fn heuristics_for_bare_repository() {
    let s = heuristic_scores(&FileMetrics::default(), &RepoMetadata::default());
    assert_eq!(s.readability, 60.0);
    assert_eq!(s.standards, 60.0);
    assert_eq!(s.complexity, 70.0);
    assert_eq!(s.testing, 10.0);
  }

  #[test]
  fn heuristics_reward_docs_license_and_tests() {
    let metrics = FileMetrics {
      total_files: 20,
      test_files: 4,
      doc_files: 5,
      code_files_analyzed: 8,
    };
    let metadata = RepoMetadata {
      description: "A dApp".into(),
      license: "MIT".into(),
      ..Default::default()
    };
    let s = heuristic_scores(&metrics, &metadata);
    assert_eq!(s.readability, 85.0);
    assert_eq!(s.standards, 80.0);
    assert_eq!(s.testing, 60.0);
  }

  #[test]
  fn huge_repository_loses_complexity_points() {
    let metadata = RepoMetadata {
      size_kb: 1_000_000,
      ..Default::default()
    };
    let s = heuristic_scores(&FileMetrics::default(), &metadata);
    assert_eq!(s.complexity, 50.0);
  }

  proptest! {
    #[test]
    fn weighted_score_is_linear(
      r in 0.0f64..100.0, s in 0.0f64..100.0, c in 0.0f64..100.0, t in 0.0f64..100.0,
      wr in 0.0f64..1.0, ws in 0.0f64..1.0, wc in 0.0f64..1.0, wt in 0.0f64..1.0,
    ) {
      let w = ScoreWeights { readability: wr, standards: ws, complexity: wc, testing: wt };
      let expected = r * wr + s * ws + c * wc + t * wt;
      prop_assert!((weighted_score(r, s, c, t, &w) - expected).abs() <= 0.005 + 1e-9);
    }

    #[test]
    fn heuristics_stay_in_range(
      total in 0usize..5000, tests in 0usize..5000, docs in 0usize..5000, size in 0u64..10_000_000,
    ) {
      let metrics = FileMetrics { total_files: total, test_files: tests, doc_files: docs, code_files_analyzed: 0 };
      let metadata = RepoMetadata { size_kb: size, ..Default::default() };
      let s = heuristic_scores(&metrics, &metadata);
      for v in [s.readability, s.standards, s.complexity, s.testing] {
        prop_assert!((0.0..=100.0).contains(&v));
      }
    }
  }
}
