// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Dotted-path access into GitHub and generated JSON, with typed and lenient numeric extraction
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper (to, to_or_default, as_lenient_f64, as_string_list)
// invariants: No panics; missing paths yield None; numeric segments index arrays; lenient numbers accept "80", "80/100", "80%"
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A located JSON value (or nothing) awaiting typed extraction.
pub struct JsonFetched<'a> {
  inner: Option<&'a Value>,
}

impl<'a> JsonFetched<'a> {
  pub fn value(&self) -> Option<&'a Value> {
    self.inner
  }

  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self.inner.and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  pub fn to_or_default<T>(&self) -> T
  where
    T: DeserializeOwned + Default,
  {
    self.to::<T>().unwrap_or_default()
  }

  /// Read a number the way generated text tends to write one.
  ///
  /// Accepts JSON numbers and strings such as `"85"`, `"85/100"`, `"85%"` or `"7.5"`;
  /// for a `{ "score": .. }` object the nested score is used.
  pub fn as_lenient_f64(&self) -> Option<f64> {
    let v = self.inner?;
    match v {
      Value::Number(n) => n.as_f64(),
      Value::String(s) => {
        let head = s.trim().split('/').next().unwrap_or("").trim().trim_end_matches('%').trim();
        head.parse::<f64>().ok()
      }
      Value::Object(map) => map.get("score").and_then(|s| JsonFetched { inner: Some(s) }.as_lenient_f64()),
      _ => None,
    }
  }

  /// Collect strings from an array value; a lone string becomes a one-item list.
  pub fn as_string_list(&self) -> Vec<String> {
    match self.inner {
      Some(Value::Array(items)) => items
        .iter()
        .filter_map(|i| match i {
          Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
          Value::Number(n) => Some(n.to_string()),
          _ => None,
        })
        .collect(),
      Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
      _ => Vec::new(),
    }
  }
}

/// Fetch nested values via dotted paths like `"license.spdx_id"` or `"commits.0.sha"`.
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      let next = match cur {
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => cur.get(key),
      };
      match next {
        Some(n) => cur = n,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
