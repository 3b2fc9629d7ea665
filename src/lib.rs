//! Repository evaluation: bounded repository walking, layered integration-evidence
//! extraction, deployment mining, digest building and resilient parsing of generated
//! quality assessments into JSON reports.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod evidence;
pub mod ext;
pub mod generation;
pub mod json_extract;
pub mod miner;
pub mod model;
pub mod observer;
pub mod quality;
pub mod score;
pub mod source;
pub mod util;
pub mod walker;

pub use analyzer::Analyzer;
pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, AnalyzerResult};
