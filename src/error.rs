// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Error taxonomy shared by every pipeline stage (access, timeout, generation, parse, configuration)
// role: errors/types
// outputs: AnalyzerError enum and AnalyzerResult alias
// invariants: Only Configuration is allowed to abort a run; all other kinds are converted to fallbacks at stage boundaries
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

/// Errors raised by repository sources, generation backends and configuration loading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyzerError {
  /// Repository or sub-path unreachable or unauthorized.
  #[error("access error: {0}")]
  Access(String),

  /// A bounded call exceeded its budget.
  #[error("timed out: {0}")]
  Timeout(String),

  /// The generation backend failed or returned unusable output.
  /// `transient` marks failures worth retrying (rate limits, server errors, dropped connections).
  #[error("generation error: {message}")]
  Generation { message: String, transient: bool },

  #[error("parse error: {0}")]
  Parse(String),

  /// Malformed or missing configuration; the only kind allowed to abort a run.
  #[error("configuration error: {0}")]
  Configuration(String),
}

impl AnalyzerError {
  pub fn generation(message: impl Into<String>) -> Self {
    AnalyzerError::Generation { message: message.into(), transient: false }
  }

  pub fn transient(message: impl Into<String>) -> Self {
    AnalyzerError::Generation { message: message.into(), transient: true }
  }

  /// A timeout has already spent its budget and is not retried.
  pub fn is_transient(&self) -> bool {
    matches!(self, AnalyzerError::Generation { transient: true, .. })
  }
}

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
