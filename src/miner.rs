// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Mine contract addresses and deployment URLs from mixed prose/code with positive and negative context heuristics
// role: pipeline/miner
// inputs: Free text (README, code samples, metadata homepage)
// outputs: Vec<AddressRecord> (deduplicated, confidence-ranked) and Vec<String> deployment URLs (first-seen order)
// invariants:
// - every address is exactly 0x + 40 hex digits
// - the fallback pass only runs when the contextual pass found nothing
// - negative indicators veto positive context
// - a deployed record wins over an uncertain record for the same address
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::model::{AddressRecord, CodeSample, Network};

const CONTEXT_MAX_CHARS: usize = 200;
const FALLBACK_WINDOW: usize = 20;

const FALLBACK_POSITIVE: &[&str] = &["deploy", "contract", "address", "celo", "mainnet", "alfajores"];

// Whole words only, so "testnet" or "users" in prose do not veto.
static RE_NEGATIVE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)\b(?:wallet|sender|recipient|example|test|sample|dummy|placeholder|owner|user)s?\b")
    .expect("negative indicator pattern")
});

static RE_CONTEXTUAL: Lazy<Vec<Regex>> = Lazy::new(|| {
  [
    r"(?i)deployed\s*(?:to|at|on)?\s*:?\s*`?(0x[0-9a-f]+)",
    r"(?i)contract\s+address\s*(?:is)?\s*:?\s*`?(0x[0-9a-f]+)",
    r"(?i)contract\b[^\n]{0,40}?\baddress\s*:?\s*`?(0x[0-9a-f]+)",
    r"(?i)published\s*(?:to|at|on)?\s*:?\s*`?(0x[0-9a-f]+)",
  ]
  .iter()
  .map(|p| Regex::new(p).expect("contextual address pattern"))
  .collect()
});

static RE_HEX_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"0x[0-9a-fA-F]+").expect("hex token pattern"));

static RE_EXACT_ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address pattern"));

static RE_URLS: Lazy<Vec<Regex>> = Lazy::new(|| {
  [
    r"(?i)deployed\s+(?:at|to|on)\s*:?\s*(https?://[^\s)\]>]+)",
    r"(?i)demo\s*(?:at|:)?\s*:?\s*(https?://[^\s)\]>]+)",
    r"(?i)live\s*(?:at|:)\s*:?\s*(https?://[^\s)\]>]+)",
    r"(?i)(?:app|website|site)\s+url\s*:?\s*(https?://[^\s)\]>]+)",
    r"(https?://[A-Za-z0-9.-]+\.(?:vercel\.app|netlify\.app|github\.io|web\.app|firebaseapp\.com)(?:/[^\s)\]>]*)?)",
  ]
  .iter()
  .map(|p| Regex::new(p).expect("deployment url pattern"))
  .collect()
});

pub fn is_valid_address(candidate: &str) -> bool {
  RE_EXACT_ADDRESS.is_match(candidate)
}

/// Infer the network from network names on the same line.
pub fn infer_network(line: &str) -> Network {
  let l = line.to_ascii_lowercase();
  if l.contains("alfajores") || l.contains("baklava") || l.contains("testnet") {
    Network::Testnet
  } else if l.contains("celo") || l.contains("mainnet") {
    Network::Mainnet
  } else {
    Network::Unknown
  }
}

fn has_negative_indicator(context: &str) -> bool {
  RE_NEGATIVE.is_match(context)
}

fn line_around(text: &str, start: usize, end: usize) -> &str {
  let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
  let line_end = text[end..].find('\n').map(|i| end + i).unwrap_or(text.len());
  &text[line_start..line_end]
}

fn clip_context(s: &str) -> String {
  s.trim().chars().take(CONTEXT_MAX_CHARS).collect()
}

/// Byte window of roughly `FALLBACK_WINDOW` characters on each side, kept on char boundaries.
fn window_around(text: &str, start: usize, end: usize) -> &str {
  let mut lo = start.saturating_sub(FALLBACK_WINDOW);
  while !text.is_char_boundary(lo) {
    lo -= 1;
  }
  let mut hi = (end + FALLBACK_WINDOW).min(text.len());
  while !text.is_char_boundary(hi) {
    hi += 1;
  }
  &text[lo..hi]
}

fn contextual_pass(text: &str) -> Vec<AddressRecord> {
  let mut out = Vec::new();

  for re in RE_CONTEXTUAL.iter() {
    for caps in re.captures_iter(text) {
      let Some(tok) = caps.get(1) else { continue };
      if !is_valid_address(tok.as_str()) {
        continue;
      }

      let line = line_around(text, tok.start(), tok.end());
      if has_negative_indicator(line) {
        continue;
      }

      out.push(AddressRecord {
        address: tok.as_str().to_string(),
        network: infer_network(line),
        context: clip_context(line),
        is_likely_deployed: true,
      });
    }
  }

  out
}

fn fallback_pass(text: &str) -> Vec<AddressRecord> {
  let mut out = Vec::new();

  for tok in RE_HEX_TOKEN.find_iter(text) {
    if !is_valid_address(tok.as_str()) {
      continue;
    }

    let window = window_around(text, tok.start(), tok.end());
    let lower = window.to_ascii_lowercase();
    if !FALLBACK_POSITIVE.iter().any(|k| lower.contains(k)) || has_negative_indicator(window) {
      continue;
    }

    out.push(AddressRecord {
      address: tok.as_str().to_string(),
      network: infer_network(line_around(text, tok.start(), tok.end())),
      context: clip_context(window),
      is_likely_deployed: false,
    });
  }

  out
}

/// Deduplicate by address (case-insensitive), keeping first-seen order and preferring deployed records.
pub fn dedupe_addresses(records: Vec<AddressRecord>) -> Vec<AddressRecord> {
  let mut out: Vec<AddressRecord> = Vec::new();

  for rec in records {
    match out.iter_mut().find(|r| r.address.eq_ignore_ascii_case(&rec.address)) {
      Some(existing) => {
        if rec.is_likely_deployed && !existing.is_likely_deployed {
          *existing = rec;
        }
      }
      None => out.push(rec),
    }
  }

  out
}

pub fn extract_addresses(text: &str) -> Vec<AddressRecord> {
  let contextual = contextual_pass(text);
  let found = if contextual.is_empty() { fallback_pass(text) } else { contextual };
  dedupe_addresses(found)
}

pub fn extract_deployment_urls(text: &str) -> Vec<String> {
  let mut seen: HashSet<String> = HashSet::new();
  let mut out = Vec::new();

  for re in RE_URLS.iter() {
    for caps in re.captures_iter(text) {
      let Some(m) = caps.get(1) else { continue };
      let url = m.as_str().trim_end_matches(|c: char| ").,;:'\"`>]".contains(c)).to_string();
      if url.len() > "https://".len() && seen.insert(url.clone()) {
        out.push(url);
      }
    }
  }

  out
}

/// Addresses and URLs mined across README text, walker samples and the metadata homepage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinedDeployments {
  pub addresses: Vec<AddressRecord>,
  pub urls: Vec<String>,
}

pub fn mine(readme: Option<&str>, samples: &[CodeSample], homepage: &str) -> MinedDeployments {
  let mut addresses = Vec::new();
  let mut urls = Vec::new();

  if !homepage.trim().is_empty() {
    urls.push(homepage.trim().to_string());
  }

  let texts = readme.into_iter().chain(samples.iter().map(|s| s.content.as_str()));
  for text in texts {
    addresses.extend(extract_addresses(text));
    for u in extract_deployment_urls(text) {
      if !urls.contains(&u) {
        urls.push(u);
      }
    }
  }

  MinedDeployments {
    addresses: dedupe_addresses(addresses),
    urls,
  }
}
