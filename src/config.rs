// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Analyzer configuration (keywords, targeted files, score weights, caps, timeouts, generation backend, batch concurrency)
// role: config/types
// inputs: Optional TOML or JSON file chosen by extension
// outputs: AnalyzerConfig with defaults for every section
// invariants: validate() rejects empty keyword lists, negative weights and zero caps with AnalyzerError::Configuration
// errors: Configuration errors are the only kind allowed to abort a run
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{AnalyzerError, AnalyzerResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
  pub keywords: Vec<String>,
  pub evidence: EvidenceConfig,
  pub weights: ScoreWeights,
  pub caps: Caps,
  pub timeouts: Timeouts,
  pub generation: GenerationConfig,
  pub batch: BatchConfig,
}

impl Default for AnalyzerConfig {
  fn default() -> Self {
    Self {
      keywords: [
        "celo",
        "contractkit",
        "@celo",
        "celo-sdk",
        "alfajores",
        "baklava",
        "cusd",
        "celo dollar",
        "valora",
        "minipay",
        "composer-kit",
      ]
      .iter()
      .map(|s| s.to_string())
      .collect(),
      evidence: EvidenceConfig::default(),
      weights: ScoreWeights::default(),
      caps: Caps::default(),
      timeouts: Timeouts::default(),
      generation: GenerationConfig::default(),
      batch: BatchConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EvidenceConfig {
  /// Owner names that count as integration evidence on their own.
  pub organization_signals: Vec<String>,
  pub targeted_files: Vec<String>,
  pub readme_paths: Vec<String>,
}

impl Default for EvidenceConfig {
  fn default() -> Self {
    let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    Self {
      organization_signals: owned(&["celo-org"]),
      targeted_files: owned(&[
        "package.json",
        "hardhat.config.js",
        "hardhat.config.ts",
        "truffle-config.js",
        "foundry.toml",
        ".env.example",
        "requirements.txt",
        "Cargo.toml",
        "go.mod",
      ]),
      readme_paths: owned(&["README.md", "readme.md", "README", "README.txt", "docs/README.md"]),
    }
  }
}

/// Multipliers for the four quality components; not required to sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
  pub readability: f64,
  pub standards: f64,
  pub complexity: f64,
  pub testing: f64,
}

impl Default for ScoreWeights {
  fn default() -> Self {
    Self {
      readability: 0.25,
      standards: 0.25,
      complexity: 0.25,
      testing: 0.25,
    }
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Caps {
  pub max_files: usize,
  pub max_code_samples: usize,
  pub max_sample_chars: usize,
  pub max_digest_chars: usize,
  /// Pages of 100 commits fetched for history statistics.
  pub max_commit_pages: usize,
}

impl Default for Caps {
  fn default() -> Self {
    Self {
      max_files: 100,
      max_code_samples: 15,
      max_sample_chars: 1500,
      max_digest_chars: 20_000,
      max_commit_pages: 10,
    }
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timeouts {
  pub metadata_secs: u64,
  pub quality_secs: u64,
  pub integration_secs: u64,
  pub deep_secs: u64,
}

impl Default for Timeouts {
  fn default() -> Self {
    Self {
      metadata_secs: 30,
      quality_secs: 60,
      integration_secs: 60,
      deep_secs: 180,
    }
  }
}

impl Timeouts {
  pub fn metadata(&self) -> Duration {
    Duration::from_secs(self.metadata_secs)
  }
  pub fn quality(&self) -> Duration {
    Duration::from_secs(self.quality_secs)
  }
  pub fn integration(&self) -> Duration {
    Duration::from_secs(self.integration_secs)
  }
  pub fn deep(&self) -> Duration {
    Duration::from_secs(self.deep_secs)
  }
  /// Request deadline for the generation HTTP agent; no single call may outlive it.
  pub fn longest_generation(&self) -> Duration {
    self.quality().max(self.integration()).max(self.deep())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
  /// OpenAI-compatible base URL; `/chat/completions` is appended.
  pub api_base: String,
  pub model: String,
  /// Name of the environment variable holding the API key.
  pub api_key_env: String,
  pub temperature: f64,
  pub max_retries: u32,
  pub retry_backoff_ms: u64,
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self {
      api_base: "https://api.openai.com/v1".into(),
      model: "gpt-4o-mini".into(),
      api_key_env: "OPENAI_API_KEY".into(),
      temperature: 0.2,
      max_retries: 2,
      retry_backoff_ms: 1000,
    }
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BatchConfig {
  pub concurrency: usize,
}

impl Default for BatchConfig {
  fn default() -> Self {
    Self { concurrency: 4 }
  }
}

impl AnalyzerConfig {
  /// Load from a `.toml` or `.json` file and validate.
  pub fn load(path: &Path) -> AnalyzerResult<Self> {
    let text = std::fs::read_to_string(path)
      .map_err(|e| AnalyzerError::Configuration(format!("reading {}: {}", path.display(), e)))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let cfg: AnalyzerConfig = match ext.as_str() {
      "toml" => toml::from_str(&text)
        .map_err(|e| AnalyzerError::Configuration(format!("{}: {}", path.display(), e)))?,
      "json" => serde_json::from_str(&text)
        .map_err(|e| AnalyzerError::Configuration(format!("{}: {}", path.display(), e)))?,
      other => {
        return Err(AnalyzerError::Configuration(format!(
          "unsupported config extension '{}' (use .toml or .json)",
          other
        )))
      }
    };

    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> AnalyzerResult<()> {
    let bad = |msg: &str| Err(AnalyzerError::Configuration(msg.to_string()));

    if self.keywords.iter().all(|k| k.trim().is_empty()) {
      return bad("keywords must contain at least one non-empty entry");
    }

    let w = &self.weights;
    for (name, v) in [
      ("readability", w.readability),
      ("standards", w.standards),
      ("complexity", w.complexity),
      ("testing", w.testing),
    ] {
      if !v.is_finite() || v < 0.0 {
        return Err(AnalyzerError::Configuration(format!(
          "weight '{}' must be a non-negative number",
          name
        )));
      }
    }

    let c = &self.caps;
    if c.max_files == 0 || c.max_code_samples == 0 || c.max_sample_chars == 0 || c.max_digest_chars == 0 {
      return bad("caps must all be greater than zero");
    }

    if self.batch.concurrency == 0 {
      return bad("batch.concurrency must be at least 1");
    }

    Ok(())
  }

  /// Keywords lower-cased and trimmed, empties removed.
  pub fn normalized_keywords(&self) -> Vec<String> {
    self
      .keywords
      .iter()
      .map(|k| k.trim().to_lowercase())
      .filter(|k| !k.is_empty())
      .collect()
  }
}
