// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Recover a JSON object from generated text that is only nominally JSON (fences, tags, prose, single quotes, trailing commas)
// role: parsing/json-recovery
// inputs: Raw generated text
// outputs: serde_json::Value objects; extract_or always returns an object (the call-site fallback on total failure)
// invariants:
// - never panics, never returns null or a non-object
// - extraction patterns are tried in a fixed order; the first match supplies the candidate
// - repairs escalate: direct parse, textual repairs, brace slice plus key quoting
// errors: None surfaced; failure yields None (extract) or the fallback (extract_or)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static RE_CANDIDATES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
  [
    ("fenced-json", r"(?s)```[ \t]*(?i:json)[ \t]*\r?\n?(.*?)```"),
    ("fenced-any", r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(\{.*?\})\s*```"),
    ("json-tag", r"(?s)<json>\s*(.*?)\s*</json>"),
    ("whole-object", r"(?s)^\s*(\{.*\})\s*$"),
    ("first-object", r"(?s)(\{.*\})"),
  ]
  .into_iter()
  .map(|(name, p)| (name, Regex::new(p).expect("candidate pattern")))
  .collect()
});

static RE_TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern"));

static RE_UNQUOTED_KEY: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_\-]*)\s*:"#).expect("unquoted key pattern"));

static RE_PY_LITERAL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(:\s*|\[\s*|,\s*)(True|False|None)(\s*[,}\]])").expect("python literal pattern"));

/// Pick the candidate substring using the first pattern that matches; the raw text otherwise.
fn candidate(raw: &str) -> &str {
  for (name, re) in RE_CANDIDATES.iter() {
    if let Some(m) = re.captures(raw).and_then(|c| c.get(1)) {
      debug!(pattern = *name, "json candidate located");
      return m.as_str().trim();
    }
  }
  raw.trim()
}

fn parse_object(s: &str) -> Option<Value> {
  match serde_json::from_str::<Value>(s) {
    Ok(v) if v.is_object() => Some(v),
    _ => None,
  }
}

/// `{{ ... }}` template escapes, only when the whole candidate is wrapped that way.
fn collapse_double_braces(s: &str) -> String {
  let t = s.trim();
  if t.starts_with("{{") && t.ends_with("}}") {
    t.replace("{{", "{").replace("}}", "}")
  } else {
    t.to_string()
  }
}

/// Rewrite single-quoted string literals as double-quoted ones.
///
/// Text inside double-quoted strings is copied untouched, so apostrophes there survive.
/// Apostrophes inside single-quoted strings cannot be told apart from the closing quote;
/// that input stays broken.
pub fn single_to_double_quotes(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + 8);
  let mut in_double = false;
  let mut in_single = false;
  let mut escaped = false;

  for c in s.chars() {
    if in_double {
      out.push(c);
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == '"' {
        in_double = false;
      }
      continue;
    }

    if in_single {
      if escaped {
        escaped = false;
        if c != '\'' {
          out.push('\\');
        }
        out.push(c);
        continue;
      }
      match c {
        '\\' => escaped = true,
        '\'' => {
          out.push('"');
          in_single = false;
        }
        '"' => out.push_str("\\\""),
        _ => out.push(c),
      }
      continue;
    }

    match c {
      '"' => {
        in_double = true;
        out.push(c);
      }
      '\'' => {
        in_single = true;
        out.push('"');
      }
      _ => out.push(c),
    }
  }

  out
}

fn strip_trailing_commas(s: &str) -> String {
  RE_TRAILING_COMMA.replace_all(s, "$1").into_owned()
}

fn quote_keys(s: &str) -> String {
  RE_UNQUOTED_KEY.replace_all(s, "$1\"$2\":").into_owned()
}

fn python_literals(s: &str) -> String {
  RE_PY_LITERAL
    .replace_all(s, |caps: &regex::Captures| {
      let lit = match &caps[2] {
        "True" => "true",
        "False" => "false",
        _ => "null",
      };
      format!("{}{}{}", &caps[1], lit, &caps[3])
    })
    .into_owned()
}

fn basic_repairs(s: &str) -> String {
  strip_trailing_commas(&single_to_double_quotes(&collapse_double_braces(s)))
}

/// Best attempt at a JSON object; `None` when every recovery step fails.
pub fn extract(raw: &str) -> Option<Value> {
  let cand = candidate(raw);

  if let Some(v) = parse_object(cand) {
    return Some(v);
  }

  let repaired = basic_repairs(cand);
  if let Some(v) = parse_object(&repaired) {
    debug!("json recovered after textual repairs");
    return Some(v);
  }

  let (Some(start), Some(end)) = (cand.find('{'), cand.rfind('}')) else {
    return None;
  };
  if end <= start {
    return None;
  }

  let sliced = &cand[start..=end];
  let aggressive = python_literals(&quote_keys(&basic_repairs(sliced)));
  let v = parse_object(&aggressive);
  if v.is_some() {
    debug!("json recovered after brace slicing and key quoting");
  }
  v
}

/// Like [`extract`], but total: returns `fallback` (coerced to an object) when nothing parses.
pub fn extract_or(raw: &str, fallback: Value) -> Value {
  match extract(raw) {
    Some(v) => v,
    None => {
      debug!(len = raw.len(), "json extraction failed; using fallback");
      if fallback.is_object() {
        fallback
      } else {
        serde_json::json!({ "value": fallback })
      }
    }
  }
}
