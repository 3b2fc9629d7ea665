// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Per-analysis memoization of listings, file contents and metadata to avoid duplicate remote calls
// role: source/cache
// inputs: Any boxed RepositorySource
// outputs: Same results as the inner source, fetched at most once per key
// invariants: Failures are cached too (a path that failed once is not retried within the same analysis)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::cell::RefCell;
use std::collections::HashMap;

use super::{ContentEntry, RepositorySource};
use crate::error::AnalyzerResult;
use crate::model::RepoMetadata;

/// Caches remote responses for the lifetime of one repository analysis.
///
/// Targeted-file and README stages often ask for paths the walker already fetched; this
/// keeps those stages from spending extra API budget.
pub struct CachedSource {
  inner: Box<dyn RepositorySource>,
  listings: RefCell<HashMap<String, AnalyzerResult<Vec<ContentEntry>>>>,
  contents: RefCell<HashMap<String, AnalyzerResult<String>>>,
  metadata: RefCell<Option<AnalyzerResult<RepoMetadata>>>,
}

impl CachedSource {
  pub fn new(inner: Box<dyn RepositorySource>) -> Self {
    Self {
      inner,
      listings: RefCell::new(HashMap::new()),
      contents: RefCell::new(HashMap::new()),
      metadata: RefCell::new(None),
    }
  }

  #[inline]
  fn key(path: &str) -> String {
    path.trim_matches('/').to_string()
  }
}

impl RepositorySource for CachedSource {
  fn has_access(&self) -> bool {
    self.inner.has_access()
  }

  fn list_contents(&self, path: &str) -> AnalyzerResult<Vec<ContentEntry>> {
    let key = Self::key(path);

    if let Some(v) = self.listings.borrow().get(&key).cloned() {
      return v;
    }
    let v = self.inner.list_contents(&key);
    self.listings.borrow_mut().insert(key, v.clone());

    v
  }

  fn get_file_content(&self, path: &str) -> AnalyzerResult<String> {
    let key = Self::key(path);

    if let Some(v) = self.contents.borrow().get(&key).cloned() {
      return v;
    }
    let v = self.inner.get_file_content(&key);
    self.contents.borrow_mut().insert(key, v.clone());

    v
  }

  fn get_metadata(&self) -> AnalyzerResult<RepoMetadata> {
    if let Some(v) = self.metadata.borrow().clone() {
      return v;
    }
    let v = self.inner.get_metadata();
    *self.metadata.borrow_mut() = Some(v.clone());

    v
  }
}
