// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Build the bounded, deterministic text digest of a repository that is handed to the generation backend
// role: pipeline/digest
// inputs: Descriptor, metadata, file metrics, evidence, addresses, deployment URLs, code samples, character budget
// outputs: Plain-text digest
// invariants:
// - identical inputs produce byte-identical output
// - fixed section order: repository, deployment, languages, metrics, evidence, addresses, samples
// - every empty section prints an explicit negative line
// - output never exceeds the budget plus the truncation marker
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt::Write as _;

use crate::model::{
  AddressRecord, CodeSample, Evidence, FileClassification, FileKind, FileMetrics, Network, RepoDescriptor, RepoMetadata,
};

pub const NO_DEPLOYMENT_URLS: &str = "No deployment URLs found.";
pub const NO_LANGUAGE_DATA: &str = "No language data available.";
pub const NO_EVIDENCE: &str = "No integration evidence found.";
pub const NO_ADDRESSES: &str = "No contract addresses found.";
pub const NO_SAMPLES: &str = "No code samples available.";

pub struct DigestInput<'a> {
  pub repo: &'a RepoDescriptor,
  pub metadata: &'a RepoMetadata,
  pub metrics: &'a FileMetrics,
  pub classifications: &'a [FileClassification],
  pub evidence: &'a [Evidence],
  pub addresses: &'a [AddressRecord],
  pub deployment_urls: &'a [String],
  pub samples: &'a [CodeSample],
  pub max_chars: usize,
}

fn or_unknown(s: &str) -> &str {
  if s.trim().is_empty() {
    "unknown"
  } else {
    s
  }
}

fn network_label(n: Network) -> &'static str {
  match n {
    Network::Mainnet => "mainnet",
    Network::Testnet => "testnet",
    Network::Unknown => "unknown network",
  }
}

pub fn build_digest(input: &DigestInput<'_>) -> String {
  let mut out = String::new();
  let m = input.metadata;

  // writes into a String are infallible
  let _ = writeln!(out, "## Repository");
  let _ = writeln!(out, "Name: {}", input.repo.full_name());
  let _ = writeln!(out, "URL: {}", input.repo.url);
  let _ = writeln!(out, "Description: {}", or_unknown(&m.description));
  let _ = writeln!(out, "Primary language: {}", or_unknown(&m.language));
  let _ = writeln!(out, "Stars: {} | Forks: {} | Open issues: {}", m.stars, m.forks, m.open_issues);
  let _ = writeln!(out, "License: {}", or_unknown(&m.license));
  let _ = writeln!(out, "Created: {} | Updated: {}", or_unknown(&m.created_at), or_unknown(&m.updated_at));
  out.push('\n');

  let _ = writeln!(out, "## Deployment");
  if input.deployment_urls.is_empty() {
    let _ = writeln!(out, "{}", NO_DEPLOYMENT_URLS);
  } else {
    for url in input.deployment_urls {
      let _ = writeln!(out, "- {}", url);
    }
  }
  out.push('\n');

  let _ = writeln!(out, "## Languages");
  if m.languages.is_empty() {
    let _ = writeln!(out, "{}", NO_LANGUAGE_DATA);
  } else {
    for l in &m.languages {
      let _ = writeln!(out, "- {}: {:.1}%", l.language, l.percent);
    }
  }
  out.push('\n');

  let fm = input.metrics;
  let _ = writeln!(out, "## File metrics");
  let _ = writeln!(out, "Total files: {}", fm.total_files);
  let _ = writeln!(out, "Test files: {}", fm.test_files);
  let _ = writeln!(out, "Documentation files: {}", fm.doc_files);
  let _ = writeln!(out, "Code files analyzed: {}", fm.code_files_analyzed);
  let kind_count = |k: FileKind| input.classifications.iter().filter(|c| c.kind == k).count();
  let _ = writeln!(
    out,
    "Directories: {} | Binary files: {} | Other files: {}",
    kind_count(FileKind::Directory),
    kind_count(FileKind::Binary),
    kind_count(FileKind::Other)
  );
  out.push('\n');

  let _ = writeln!(out, "## Integration evidence");
  if input.evidence.is_empty() {
    let _ = writeln!(out, "{}", NO_EVIDENCE);
  } else {
    for e in input.evidence {
      let _ = writeln!(out, "- {}: {}", e.file, e.keyword);
    }
  }
  out.push('\n');

  let _ = writeln!(out, "## Contract addresses");
  if input.addresses.is_empty() {
    let _ = writeln!(out, "{}", NO_ADDRESSES);
  } else {
    for a in input.addresses {
      let status = if a.is_likely_deployed { "deployed" } else { "mentioned" };
      let _ = writeln!(out, "- {} ({}, {})", a.address, network_label(a.network), status);
    }
  }
  out.push('\n');

  let _ = writeln!(out, "## Code samples");
  if input.samples.is_empty() {
    let _ = writeln!(out, "{}", NO_SAMPLES);
  } else {
    for s in input.samples {
      let _ = writeln!(out, "### {}\n```\n{}\n```", s.path, s.content);
    }
  }

  truncate_digest(out, input.max_chars)
}

fn truncate_digest(text: String, max_chars: usize) -> String {
  match text.char_indices().nth(max_chars) {
    Some((byte_idx, _)) => {
      let mut cut = text[..byte_idx].to_string();
      let _ = write!(cut, "\n[... digest truncated at {} characters]", max_chars);
      cut
    }
    None => text,
  }
}
