// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the JSON model (repository metadata, file metrics, evidence, addresses, quality, analysis results) shared by every stage
// role: model/types
// outputs: Serializable structs with stable field names and defaulted fields
// invariants: Every field has a default so a result is never partially populated; overall scores are derived, never stored independently
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of a GitHub repository parsed from an input URL.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct RepoDescriptor {
  pub owner: String,
  pub name: String,
  pub url: String,
}

impl RepoDescriptor {
  pub fn new(owner: &str, name: &str) -> Self {
    Self {
      owner: owner.to_string(),
      name: name.to_string(),
      url: format!("https://github.com/{}/{}", owner, name),
    }
  }

  /// `owner/name` label used when tagging evidence in multi-repository projects.
  pub fn full_name(&self) -> String {
    format!("{}/{}", self.owner, self.name)
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LanguageShare {
  pub language: String,
  pub percent: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Contributor {
  pub login: String,
  pub contributions: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CommitStats {
  pub total: u64,
  pub first_date: String,
  pub last_date: String,
  /// Commits per `YYYY-MM`.
  pub monthly: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PullRequestCounts {
  pub open: u64,
  pub closed: u64,
  pub merged: u64,
  pub total: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RepoMetadata {
  pub name: String,
  pub description: String,
  pub stars: u64,
  pub forks: u64,
  pub open_issues: u64,
  pub language: String,
  pub created_at: String,
  pub updated_at: String,
  pub size_kb: u64,
  pub license: String,
  pub homepage: String,
  pub default_branch: String,
  /// Sorted by descending share.
  pub languages: Vec<LanguageShare>,
  pub contributors: Vec<Contributor>,
  pub commits: CommitStats,
  pub pull_requests: PullRequestCounts,
}

impl RepoMetadata {
  /// Metadata for a repository whose source is inaccessible: name only, everything else zeroed.
  pub fn from_descriptor(repo: &RepoDescriptor) -> Self {
    Self {
      name: repo.name.clone(),
      ..Default::default()
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
  Directory,
  Code,
  Test,
  Doc,
  Binary,
  Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileClassification {
  pub path: String,
  pub kind: FileKind,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FileMetrics {
  pub total_files: usize,
  pub test_files: usize,
  pub doc_files: usize,
  pub code_files_analyzed: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CodeSample {
  pub path: String,
  pub content: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Evidence {
  pub file: String,
  pub keyword: String,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub repository: Option<String>,
}

impl Evidence {
  pub fn new(file: &str, keyword: &str) -> Self {
    Self {
      file: file.to_string(),
      keyword: keyword.to_string(),
      repository: None,
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
  Mainnet,
  Testnet,
  #[default]
  Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AddressRecord {
  pub address: String,
  pub network: Network,
  pub context: String,
  pub is_likely_deployed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct IntegrationResult {
  pub integrated: bool,
  pub evidence: Vec<Evidence>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub analysis: Option<String>,
  pub repositories_with_celo: usize,
  /// Self-reported confidence when the result came from a generation estimate.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub confidence: Option<f64>,
}

/// Free-text rationale per quality component.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ComponentRationales {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub readability: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub standards: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub complexity: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub testing: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QualityResult {
  pub overall_score: f64,
  pub readability: f64,
  pub standards: f64,
  pub complexity: f64,
  pub testing: f64,
  pub rationales: ComponentRationales,
  pub metrics: FileMetrics,
  pub strengths: Vec<String>,
  pub improvements: Vec<String>,
  /// Set when heuristic scores stand in for a generated assessment.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub note: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

pub const ANALYSIS_UNAVAILABLE: &str = "Analysis unavailable";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DeepAnalysis {
  pub architecture: String,
  pub code_organization: String,
  pub security: String,
  pub error_handling: String,
  pub celo_usage: String,
  pub recommendations: Vec<String>,
  pub available: bool,
}

impl Default for DeepAnalysis {
  fn default() -> Self {
    Self {
      architecture: ANALYSIS_UNAVAILABLE.into(),
      code_organization: ANALYSIS_UNAVAILABLE.into(),
      security: ANALYSIS_UNAVAILABLE.into(),
      error_handling: ANALYSIS_UNAVAILABLE.into(),
      celo_usage: ANALYSIS_UNAVAILABLE.into(),
      recommendations: Vec::new(),
      available: false,
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AnalysisResult {
  pub repo: RepoDescriptor,
  pub metadata: RepoMetadata,
  pub quality: QualityResult,
  pub integration: IntegrationResult,
  pub addresses: Vec<AddressRecord>,
  pub deployment_urls: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub deep_analysis: Option<DeepAnalysis>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// One project as listed in an input file: a name plus one or more repository URLs.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectInput {
  pub name: String,
  pub description: String,
  #[serde(alias = "github_urls")]
  pub urls: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ProjectResult {
  pub project_name: String,
  pub project_description: String,
  pub repositories: Vec<AnalysisResult>,
  pub overall_score: f64,
  pub integration: IntegrationResult,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BatchSummary {
  pub projects: Vec<ProjectResult>,
  pub total: usize,
  pub failures: usize,
}
