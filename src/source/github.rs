// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: GitHub REST v3 RepositorySource (repository metadata, languages, contributors, commit history, pull requests, contents)
// role: source/github-http
// inputs: RepoDescriptor, bearer token, per-call timeout, commit page cap
// outputs: RepoMetadata, directory listings, raw file content
// side_effects: Network calls to api.github.com
// invariants:
// - Never panic; secondary metadata calls (languages, contributors, commits, pulls) are best-effort and default to empty
// - Only the primary /repos call decides has_access
// - File content is fetched raw and must be valid UTF-8 (binaries fail with Access)
// errors: HTTP status and transport failures map to AnalyzerError::Access; elapsed budgets map to AnalyzerError::Timeout
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::{ContentEntry, EntryKind, RepositorySource};
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::ext::serde_json::JsonFetch;
use crate::model::{CommitStats, Contributor, LanguageShare, PullRequestCounts, RepoDescriptor, RepoMetadata};

const API_ROOT: &str = "https://api.github.com";
const USER_AGENT: &str = "repo-evidence-report";
const MAX_CONTRIBUTORS: usize = 10;

pub struct GithubHttpSource {
  repo: RepoDescriptor,
  token: String,
  agent: ureq::Agent,
  api_root: String,
  max_commit_pages: usize,
  repo_json: OnceCell<AnalyzerResult<Value>>,
}

impl GithubHttpSource {
  pub fn new(repo: RepoDescriptor, token: String, timeout: Duration, max_commit_pages: usize) -> Self {
    let agent: ureq::Agent = ureq::Agent::config_builder()
      .timeout_global(Some(timeout))
      .build()
      .into();

    Self {
      repo,
      token,
      agent,
      api_root: API_ROOT.to_string(),
      max_commit_pages,
      repo_json: OnceCell::new(),
    }
  }

  /// Point the client at another API root (GitHub Enterprise, local test servers).
  pub fn with_api_root(mut self, root: &str) -> Self {
    self.api_root = root.trim_end_matches('/').to_string();
    self
  }

  fn repo_url(&self, suffix: &str) -> String {
    format!("{}/repos/{}/{}{}", self.api_root, self.repo.owner, self.repo.name, suffix)
  }

  fn get(&self, url: &str, accept: &str) -> AnalyzerResult<ureq::http::Response<ureq::Body>> {
    self
      .agent
      .get(url)
      .header("Accept", accept)
      .header("User-Agent", USER_AGENT)
      .header("Authorization", &format!("Bearer {}", self.token))
      .call()
      .map_err(|e| map_http_error(url, e))
  }

  fn get_json(&self, url: &str) -> AnalyzerResult<Value> {
    let mut resp = self.get(url, "application/vnd.github+json")?;
    resp
      .body_mut()
      .read_json::<Value>()
      .map_err(|e| AnalyzerError::Access(format!("{}: invalid JSON: {}", url, e)))
  }

  fn repo_json(&self) -> AnalyzerResult<Value> {
    self.repo_json.get_or_init(|| self.get_json(&self.repo_url(""))).clone()
  }

  fn languages(&self) -> Vec<LanguageShare> {
    match self.get_json(&self.repo_url("/languages")) {
      Ok(v) => language_shares(&v),
      Err(e) => {
        debug!(repo = %self.repo.full_name(), error = %e, "languages unavailable");
        Vec::new()
      }
    }
  }

  fn contributors(&self) -> Vec<Contributor> {
    let url = self.repo_url(&format!("/contributors?per_page={}", MAX_CONTRIBUTORS));
    let Ok(v) = self.get_json(&url) else { return Vec::new() };
    let Some(arr) = v.as_array() else { return Vec::new() };

    arr
      .iter()
      .take(MAX_CONTRIBUTORS)
      .filter_map(|c| {
        let login = c.fetch("login").to::<String>()?;
        Some(Contributor {
          login,
          contributions: c.fetch("contributions").to_or_default::<u64>(),
        })
      })
      .collect()
  }

  fn commit_dates(&self) -> Vec<String> {
    let mut dates = Vec::new();

    for page in 1..=self.max_commit_pages.max(1) {
      let url = self.repo_url(&format!("/commits?per_page=100&page={}", page));
      let Ok(v) = self.get_json(&url) else { break };
      let Some(arr) = v.as_array() else { break };

      dates.extend(arr.iter().filter_map(|c| c.fetch("commit.author.date").to::<String>()));

      if arr.len() < 100 {
        break;
      }
    }

    dates
  }

  fn pull_requests(&self) -> PullRequestCounts {
    let mut counts = PullRequestCounts::default();

    for page in 1..=self.max_commit_pages.max(1) {
      let url = self.repo_url(&format!("/pulls?state=all&per_page=100&page={}", page));
      let Ok(v) = self.get_json(&url) else { break };
      let Some(arr) = v.as_array() else { break };

      for pr in arr {
        counts.total += 1;
        match pr.fetch("state").to_or_default::<String>().as_str() {
          "open" => counts.open += 1,
          _ => {
            counts.closed += 1;
            if pr.fetch("merged_at").to::<String>().is_some() {
              counts.merged += 1;
            }
          }
        }
      }

      if arr.len() < 100 {
        break;
      }
    }

    counts
  }
}

impl RepositorySource for GithubHttpSource {
  fn has_access(&self) -> bool {
    self.repo_json().is_ok()
  }

  fn list_contents(&self, path: &str) -> AnalyzerResult<Vec<ContentEntry>> {
    let url = self.repo_url(&format!("/contents/{}", encode_path(path)));
    let v = self.get_json(&url)?;

    // A file path returns an object rather than an array.
    let Some(arr) = v.as_array() else {
      return Err(AnalyzerError::Access(format!("'{}' is not a directory", path)));
    };

    Ok(
      arr
        .iter()
        .filter_map(|item| {
          let p = item.fetch("path").to::<String>()?;
          let kind = match item.fetch("type").to_or_default::<String>().as_str() {
            "dir" => EntryKind::Dir,
            "file" => EntryKind::File,
            _ => return None,
          };
          Some(ContentEntry { path: p, kind })
        })
        .collect(),
    )
  }

  fn get_file_content(&self, path: &str) -> AnalyzerResult<String> {
    let url = self.repo_url(&format!("/contents/{}", encode_path(path)));
    let mut resp = self.get(&url, "application/vnd.github.raw+json")?;
    let bytes = resp
      .body_mut()
      .read_to_vec()
      .map_err(|e| AnalyzerError::Access(format!("{}: {}", path, e)))?;

    String::from_utf8(bytes).map_err(|_| AnalyzerError::Access(format!("{}: not valid UTF-8", path)))
  }

  fn get_metadata(&self) -> AnalyzerResult<RepoMetadata> {
    let v = self.repo_json()?;
    let mut m = metadata_from_repo_json(&v);
    if m.name.is_empty() {
      m.name = self.repo.name.clone();
    }

    m.languages = self.languages();
    m.contributors = self.contributors();
    m.commits = commit_stats(&self.commit_dates());
    m.pull_requests = self.pull_requests();

    Ok(m)
  }
}

fn map_http_error(url: &str, e: ureq::Error) -> AnalyzerError {
  match e {
    ureq::Error::Timeout(_) => AnalyzerError::Timeout(url.to_string()),
    ureq::Error::StatusCode(code) => AnalyzerError::Access(format!("{}: HTTP {}", url, code)),
    other => AnalyzerError::Access(format!("{}: {}", url, other)),
  }
}

fn encode_path(path: &str) -> String {
  path.trim_matches('/').replace(' ', "%20").replace('#', "%23")
}

/// Map the `/repos/{owner}/{repo}` document onto `RepoMetadata` (secondary fields left empty).
pub fn metadata_from_repo_json(v: &Value) -> RepoMetadata {
  RepoMetadata {
    name: v.fetch("name").to_or_default(),
    description: v.fetch("description").to_or_default(),
    stars: v.fetch("stargazers_count").to_or_default(),
    forks: v.fetch("forks_count").to_or_default(),
    open_issues: v.fetch("open_issues_count").to_or_default(),
    language: v.fetch("language").to_or_default(),
    created_at: v.fetch("created_at").to_or_default(),
    updated_at: v.fetch("updated_at").to_or_default(),
    size_kb: v.fetch("size").to_or_default(),
    license: v
      .fetch("license.spdx_id")
      .to::<String>()
      .or_else(|| v.fetch("license.name").to::<String>())
      .unwrap_or_default(),
    homepage: v.fetch("homepage").to_or_default(),
    default_branch: v.fetch("default_branch").to_or_default(),
    ..Default::default()
  }
}

/// Convert a `/languages` byte map into percentage shares, largest first.
pub fn language_shares(v: &Value) -> Vec<LanguageShare> {
  let Some(obj) = v.as_object() else { return Vec::new() };
  let total: f64 = obj.values().filter_map(|b| b.as_f64()).sum();
  if total <= 0.0 {
    return Vec::new();
  }

  let mut shares: Vec<LanguageShare> = obj
    .iter()
    .filter_map(|(lang, bytes)| {
      let b = bytes.as_f64()?;
      Some(LanguageShare {
        language: lang.clone(),
        percent: (b / total * 1000.0).round() / 10.0,
      })
    })
    .collect();

  shares.sort_by(|a, b| {
    b.percent
      .partial_cmp(&a.percent)
      .unwrap_or(std::cmp::Ordering::Equal)
      .then_with(|| a.language.cmp(&b.language))
  });
  shares
}

/// Summarize RFC3339 commit dates: total, first/last day and a per-month histogram.
pub fn commit_stats(dates: &[String]) -> CommitStats {
  let mut parsed: Vec<chrono::DateTime<chrono::FixedOffset>> = dates
    .iter()
    .filter_map(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
    .collect();
  parsed.sort();

  let mut monthly: BTreeMap<String, u64> = BTreeMap::new();
  for d in &parsed {
    *monthly.entry(d.format("%Y-%m").to_string()).or_insert(0) += 1;
  }

  CommitStats {
    total: parsed.len() as u64,
    first_date: parsed.first().map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
    last_date: parsed.last().map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
    monthly,
  }
}
