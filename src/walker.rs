// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Bounded breadth-first walk over a repository tree: classify files, count metrics, sample code content
// role: pipeline/walker
// inputs: RepositorySource, Caps (max_files, max_code_samples, max_sample_chars), Observer
// outputs: WalkOutput {metrics, samples, classifications}
// invariants:
// - files processed <= caps.max_files; code_files_analyzed <= min(caps.max_code_samples, total_files)
// - each path is processed at most once
// - binaries are counted but never sampled
// - directories are classified as visited but never count toward max_files
// - progress is reported every PROGRESS_EVERY files, not per file
// errors: Only a failing root listing is returned; subdirectory and file failures are skipped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::config::Caps;
use crate::error::AnalyzerResult;
use crate::model::{CodeSample, FileClassification, FileKind, FileMetrics};
use crate::observer::Observer;
use crate::source::{EntryKind, RepositorySource};

pub const PROGRESS_EVERY: usize = 25;

const DOC_EXTENSIONS: &[&str] = &["md", "rst", "txt", "adoc", "org"];

const CODE_EXTENSIONS: &[&str] = &[
  "rs", "py", "js", "ts", "jsx", "tsx", "sol", "go", "java", "kt", "swift", "rb", "c", "cpp", "h", "hpp", "cs",
  "php", "scala", "dart", "vue", "svelte", "move", "cairo", "vy",
];

const BINARY_EXTENSIONS: &[&str] = &[
  "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "zip", "gz", "tar", "tgz", "rar", "7z", "jar", "exe",
  "dll", "so", "dylib", "bin", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "mov", "avi", "wav", "pdf",
  "wasm",
];

#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
  pub metrics: FileMetrics,
  pub samples: Vec<CodeSample>,
  pub classifications: Vec<FileClassification>,
}

impl WalkOutput {
  /// Number of visited entries (files and directories) of `kind`.
  pub fn count(&self, kind: FileKind) -> usize {
    self.classifications.iter().filter(|c| c.kind == kind).count()
  }
}

/// Classify a file path by name and extension.
pub fn classify(path: &str) -> FileKind {
  let base = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();

  if base.contains("test") || base.contains("spec") {
    return FileKind::Test;
  }

  let ext = match base.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() => ext,
    _ => "",
  };

  if DOC_EXTENSIONS.contains(&ext) {
    FileKind::Doc
  } else if BINARY_EXTENSIONS.contains(&ext) {
    FileKind::Binary
  } else if CODE_EXTENSIONS.contains(&ext) {
    FileKind::Code
  } else {
    FileKind::Other
  }
}

/// Truncate to `max_chars` characters, appending `...` when anything was cut.
pub fn truncate_sample(content: &str, max_chars: usize) -> String {
  match content.char_indices().nth(max_chars) {
    Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
    None => content.to_string(),
  }
}

pub fn walk(
  source: &dyn RepositorySource,
  caps: &Caps,
  repo_label: &str,
  observer: &dyn Observer,
) -> AnalyzerResult<WalkOutput> {
  let root = source.list_contents("")?;

  let mut queue: VecDeque<_> = root.into_iter().collect();
  let mut visited: HashSet<String> = HashSet::new();
  let mut out = WalkOutput::default();
  let mut files_processed = 0usize;

  while files_processed < caps.max_files {
    let Some(entry) = queue.pop_front() else { break };

    if !visited.insert(entry.path.clone()) {
      continue;
    }

    if entry.kind == EntryKind::Dir {
      match source.list_contents(&entry.path) {
        Ok(children) => queue.extend(children),
        Err(e) => debug!(repo = repo_label, path = %entry.path, error = %e, "skipping unreadable directory"),
      }
      out.classifications.push(FileClassification {
        path: entry.path,
        kind: FileKind::Directory,
      });
      continue;
    }

    files_processed += 1;
    out.metrics.total_files += 1;

    let kind = classify(&entry.path);
    match kind {
      FileKind::Test => out.metrics.test_files += 1,
      FileKind::Doc => out.metrics.doc_files += 1,
      FileKind::Code if out.samples.len() < caps.max_code_samples => match source.get_file_content(&entry.path) {
        Ok(content) => {
          out.samples.push(CodeSample {
            path: entry.path.clone(),
            content: truncate_sample(&content, caps.max_sample_chars),
          });
          out.metrics.code_files_analyzed += 1;
        }
        Err(e) => debug!(repo = repo_label, path = %entry.path, error = %e, "skipping unreadable file"),
      },
      _ => {}
    }

    out.classifications.push(FileClassification {
      path: entry.path,
      kind,
    });

    if files_processed % PROGRESS_EVERY == 0 {
      observer.walk_progress(repo_label, files_processed, out.samples.len());
    }
  }

  debug!(
    repo = repo_label,
    files = out.metrics.total_files,
    samples = out.samples.len(),
    truncated = !queue.is_empty(),
    "walk finished"
  );

  Ok(out)
}
