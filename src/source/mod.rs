// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: RepositorySource seam (metadata, directory listings, file content, access flag) plus URL parsing, token discovery and backend selection
// role: source/namespace
// inputs: Repository URLs; env GITHUB_TOKEN / GH_TOKEN; optional `gh` CLI; env REPO_EVAL_FIXTURE
// outputs: RepoDescriptor values and boxed RepositorySource handles (one per analysis)
// side_effects: Spawns `gh auth token` during token discovery
// invariants:
// - URL parser only recognizes GitHub repositories (https, http, www, ssh)
// - Backend preference: fixture file, then authenticated HTTP, then no-access
// - Each analysis receives its own handle; handles are never shared across workers
// errors: Sources return AnalyzerError::Access/Timeout; callers convert to fallbacks
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod cached;
pub mod fixture;
pub mod github;

use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::model::{RepoDescriptor, RepoMetadata};

pub use cached::CachedSource;
pub use fixture::{FixtureSet, FixtureSource};
pub use github::GithubHttpSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  File,
  Dir,
}

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
  pub path: String,
  pub kind: EntryKind,
}

impl ContentEntry {
  pub fn file(path: &str) -> Self {
    Self { path: path.to_string(), kind: EntryKind::File }
  }

  pub fn dir(path: &str) -> Self {
    Self { path: path.to_string(), kind: EntryKind::Dir }
  }
}

/// Access to one remote repository.
///
/// Paths are repository-relative with `/` separators; the root is `""`.
pub trait RepositorySource {
  /// False when the repository cannot be read at all (no token, not found, private).
  fn has_access(&self) -> bool;
  fn list_contents(&self, path: &str) -> AnalyzerResult<Vec<ContentEntry>>;
  fn get_file_content(&self, path: &str) -> AnalyzerResult<String>;
  fn get_metadata(&self) -> AnalyzerResult<RepoMetadata>;
}

/// Stand-in used when no backend can reach the repository.
pub struct NoAccessSource {
  repo: RepoDescriptor,
}

impl NoAccessSource {
  pub fn new(repo: &RepoDescriptor) -> Self {
    Self { repo: repo.clone() }
  }
}

impl RepositorySource for NoAccessSource {
  fn has_access(&self) -> bool {
    false
  }

  fn list_contents(&self, path: &str) -> AnalyzerResult<Vec<ContentEntry>> {
    Err(AnalyzerError::Access(format!("{}: no access to '{}'", self.repo.full_name(), path)))
  }

  fn get_file_content(&self, path: &str) -> AnalyzerResult<String> {
    Err(AnalyzerError::Access(format!("{}: no access to '{}'", self.repo.full_name(), path)))
  }

  fn get_metadata(&self) -> AnalyzerResult<RepoMetadata> {
    Ok(RepoMetadata::from_descriptor(&self.repo))
  }
}

/// Builds one independent source handle per repository analysis.
pub trait SourceFactory: Send + Sync {
  fn open(&self, repo: &RepoDescriptor) -> Box<dyn RepositorySource>;
}

/// Default backend selection: fixture file, then authenticated GitHub HTTP, then no access.
pub struct DefaultSourceFactory {
  pub fixture: Option<FixtureSet>,
  pub token: Option<String>,
  pub http_timeout: Duration,
  pub max_commit_pages: usize,
}

impl SourceFactory for DefaultSourceFactory {
  fn open(&self, repo: &RepoDescriptor) -> Box<dyn RepositorySource> {
    let inner: Box<dyn RepositorySource> = if let Some(set) = &self.fixture {
      Box::new(set.source_for(repo))
    } else if let Some(t) = &self.token {
      Box::new(GithubHttpSource::new(repo.clone(), t.clone(), self.http_timeout, self.max_commit_pages))
    } else {
      Box::new(NoAccessSource::new(repo))
    };

    Box::new(CachedSource::new(inner))
  }
}

/// Parse a GitHub repository URL into its owner and name.
///
/// Accepts https/http, `www.`, ssh (`git@github.com:o/r.git`), a trailing `.git` or `/`,
/// and extra path segments such as `/tree/main/src`.
pub fn parse_repo_url(input: &str) -> Option<RepoDescriptor> {
  static RE_REPO: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^(?:git@github\.com:|(?:https?://)?(?:www\.)?github\.com/)([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?(?:[/?#].*)?$")
      .expect("repository URL pattern")
  });

  let trimmed = input.trim();
  let caps = RE_REPO.captures(trimmed)?;
  let owner = caps.get(1)?.as_str();
  let name = caps.get(2)?.as_str();

  if owner.is_empty() || name.is_empty() || name == "." || name == ".." {
    return None;
  }

  Some(RepoDescriptor::new(owner, name))
}

/// Discover a GitHub token: env vars first, then `gh auth token` if available.
pub fn get_github_token() -> Option<String> {
  for key in ["GITHUB_TOKEN", "GH_TOKEN"] {
    if let Ok(t) = std::env::var(key) {
      if !t.trim().is_empty() {
        return Some(t.trim().to_string());
      }
    }
  }

  if let Ok(output) = std::process::Command::new("gh").args(["auth", "token"]).output() {
    if output.status.success() {
      let t = String::from_utf8_lossy(&output.stdout).trim().to_string();

      if !t.is_empty() {
        return Some(t);
      }
    }
  }

  None
}

/// Fixture path from `REPO_EVAL_FIXTURE` when set and non-empty.
pub fn fixture_path_from_env() -> Option<PathBuf> {
  std::env::var("REPO_EVAL_FIXTURE")
    .ok()
    .filter(|s| !s.trim().is_empty())
    .map(PathBuf::from)
}
