// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Text-generation seam (complete(prompt) -> text) with an OpenAI-compatible HTTP client, per-call deadlines and bounded retries
// role: generation/client
// inputs: GenerationConfig (api_base, model, api_key_env, temperature, retries); prompts built by the quality and evidence stages
// outputs: Generated text or an AnalyzerError the caller converts to a fallback
// side_effects: Network calls to the configured completion endpoint; one worker thread per bounded call
// invariants:
// - complete_with_timeout never blocks the caller longer than the deadline
// - the HTTP agent carries its own global timeout, so abandoned workers still terminate
// - only transient errors (HTTP 429/5xx, transport) are retried; timeouts are not
// errors: Timeout on elapsed deadline; Generation for backend failures and empty completions
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::ext::serde_json::JsonFetch;

/// Black-box text completion.
pub trait GenerationClient: Send + Sync {
  fn complete(&self, prompt: &str, temperature: f64) -> AnalyzerResult<String>;
}

/// Run one completion on a worker thread and stop waiting after `timeout`.
///
/// On timeout the worker is left to finish on its own; its result is discarded.
pub fn complete_with_timeout(
  client: Arc<dyn GenerationClient>,
  prompt: String,
  temperature: f64,
  timeout: Duration,
) -> AnalyzerResult<String> {
  let (tx, rx) = mpsc::channel();

  std::thread::spawn(move || {
    let _ = tx.send(client.complete(&prompt, temperature));
  });

  match rx.recv_timeout(timeout) {
    Ok(res) => res,
    Err(mpsc::RecvTimeoutError::Timeout) => Err(AnalyzerError::Timeout(format!(
      "generation exceeded {}s",
      timeout.as_secs_f64()
    ))),
    Err(mpsc::RecvTimeoutError::Disconnected) => Err(AnalyzerError::generation("generation worker panicked")),
  }
}

/// Retry policy applied around [`complete_with_timeout`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub backoff: Duration,
}

impl From<&GenerationConfig> for RetryPolicy {
  fn from(cfg: &GenerationConfig) -> Self {
    Self {
      max_retries: cfg.max_retries,
      backoff: Duration::from_millis(cfg.retry_backoff_ms),
    }
  }
}

/// Bounded call with linear backoff on transient failures; empty completions count as failures.
pub fn complete_bounded(
  client: &Arc<dyn GenerationClient>,
  prompt: &str,
  temperature: f64,
  timeout: Duration,
  retry: RetryPolicy,
) -> AnalyzerResult<String> {
  let mut attempt = 0u32;

  loop {
    let res = complete_with_timeout(client.clone(), prompt.to_string(), temperature, timeout).and_then(|text| {
      if text.trim().is_empty() {
        Err(AnalyzerError::generation("empty completion"))
      } else {
        Ok(text)
      }
    });

    match res {
      Err(e) if e.is_transient() && attempt < retry.max_retries => {
        attempt += 1;
        warn!(attempt, error = %e, "transient generation failure; retrying");
        std::thread::sleep(retry.backoff * attempt);
      }
      other => return other,
    }
  }
}

/// OpenAI-compatible `/chat/completions` client.
pub struct HttpGenerationClient {
  agent: ureq::Agent,
  endpoint: String,
  model: String,
  api_key: String,
}

impl HttpGenerationClient {
  /// `request_timeout` bounds each HTTP exchange, so a worker abandoned by
  /// [`complete_with_timeout`] still exits once the upstream stops answering.
  pub fn new(api_base: &str, model: &str, api_key: &str, request_timeout: Duration) -> Self {
    let agent: ureq::Agent = ureq::Agent::config_builder()
      .timeout_global(Some(request_timeout))
      .build()
      .into();
    Self {
      agent,
      endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
      model: model.to_string(),
      api_key: api_key.to_string(),
    }
  }

  /// Build from config when the API key environment variable is set.
  pub fn from_config(cfg: &GenerationConfig, request_timeout: Duration) -> Option<Self> {
    let key = std::env::var(&cfg.api_key_env).ok().filter(|k| !k.trim().is_empty())?;
    Some(Self::new(&cfg.api_base, &cfg.model, key.trim(), request_timeout))
  }
}

impl GenerationClient for HttpGenerationClient {
  fn complete(&self, prompt: &str, temperature: f64) -> AnalyzerResult<String> {
    let body = json!({
      "model": self.model,
      "temperature": temperature,
      "messages": [{ "role": "user", "content": prompt }],
    });

    let resp = self
      .agent
      .post(&self.endpoint)
      .header("Content-Type", "application/json")
      .header("Authorization", &format!("Bearer {}", self.api_key))
      .send_json(&body);

    let mut resp = match resp {
      Ok(r) => r,
      Err(ureq::Error::StatusCode(code)) if code == 429 || code >= 500 => {
        return Err(AnalyzerError::transient(format!("HTTP {}", code)))
      }
      Err(ureq::Error::StatusCode(code)) => return Err(AnalyzerError::generation(format!("HTTP {}", code))),
      Err(ureq::Error::Timeout(_)) => return Err(AnalyzerError::Timeout("generation request".into())),
      Err(e) => return Err(AnalyzerError::transient(e.to_string())),
    };

    let v: serde_json::Value = resp
      .body_mut()
      .read_json()
      .map_err(|e| AnalyzerError::generation(format!("invalid completion body: {}", e)))?;

    let text = v.fetch("choices.0.message.content").to_or_default::<String>();
    debug!(chars = text.len(), "completion received");
    Ok(text)
  }
}

/// Test double: replays scripted responses in order, optionally after a delay.
#[cfg(any(test, feature = "testutil"))]
pub struct ScriptedClient {
  responses: std::sync::Mutex<std::collections::VecDeque<AnalyzerResult<String>>>,
  delay: Duration,
  pub prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "testutil"))]
impl ScriptedClient {
  pub fn new(responses: Vec<AnalyzerResult<String>>) -> Self {
    Self {
      responses: std::sync::Mutex::new(responses.into_iter().collect()),
      delay: Duration::ZERO,
      prompts: std::sync::Mutex::new(Vec::new()),
    }
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  pub fn prompt_count(&self) -> usize {
    self.prompts.lock().map(|p| p.len()).unwrap_or(0)
  }
}

#[cfg(any(test, feature = "testutil"))]
impl GenerationClient for ScriptedClient {
  fn complete(&self, prompt: &str, _temperature: f64) -> AnalyzerResult<String> {
    if let Ok(mut p) = self.prompts.lock() {
      p.push(prompt.to_string());
    }
    if !self.delay.is_zero() {
      std::thread::sleep(self.delay);
    }
    self
      .responses
      .lock()
      .ok()
      .and_then(|mut r| r.pop_front())
      .unwrap_or_else(|| Err(AnalyzerError::generation("script exhausted")))
  }
}
