use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::AnalyzerConfig;
use crate::model::ProjectInput;
use crate::source::{fixture_path_from_env, parse_repo_url};
use crate::util;

#[derive(Parser, Debug)]
#[command(
    name = "repo-evidence-report",
    version,
    about = "Evaluate GitHub repositories for code quality and ecosystem integration evidence (JSON)",
    long_about = None
)]
pub struct Cli {
  /// GitHub repository URL to analyse; repeat for several (each becomes its own project)
  #[arg(long = "repo", value_name = "URL")]
  pub repos: Vec<String>,

  /// JSON file of projects: `[{"name", "description", "urls": [...]}]`
  #[arg(long)]
  pub input: Option<PathBuf>,

  /// Analyzer configuration (.toml or .json)
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Output file path, or "-" for stdout
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Read repositories from a JSON fixture instead of GitHub (also REPO_EVAL_FIXTURE)
  #[arg(long)]
  pub fixture: Option<PathBuf>,

  /// Skip the generation backend; quality falls back to heuristic scores
  #[arg(long)]
  pub no_ai: bool,

  /// Also run the deep technical analysis (one extra generation call per repository)
  #[arg(long)]
  pub deep: bool,

  /// Projects analysed in parallel (overrides batch.concurrency)
  #[arg(long)]
  pub concurrency: Option<usize>,

  /// Increase log verbosity (-v info, -vv debug); logs go to stderr
  #[arg(short, long, action = ArgAction::Count)]
  pub verbose: u8,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub projects: Vec<ProjectInput>,
  pub analyzer: AnalyzerConfig,
  pub out: String,
  pub fixture: Option<String>, // absolute path for stability
  pub no_ai: bool,
  pub deep: bool,
}

/// One project per `--repo`, named `owner/name` when the URL parses.
fn projects_from_repos(repos: &[String]) -> Vec<ProjectInput> {
  repos
    .iter()
    .map(|url| ProjectInput {
      name: parse_repo_url(url).map(|r| r.full_name()).unwrap_or_else(|| url.clone()),
      description: String::new(),
      urls: vec![url.clone()],
    })
    .collect()
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let mut analyzer = match &cli.config {
    Some(path) => AnalyzerConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
    None => AnalyzerConfig::default(),
  };

  if let Some(n) = cli.concurrency {
    if n == 0 {
      bail!("--concurrency must be at least 1");
    }
    analyzer.batch.concurrency = n;
  }
  analyzer.validate()?;

  let mut projects = match &cli.input {
    Some(path) => util::load_projects(path)?,
    None => Vec::new(),
  };
  projects.extend(projects_from_repos(&cli.repos));

  if projects.is_empty() {
    bail!("Provide at least one --repo URL or an --input file");
  }

  let fixture = cli
    .fixture
    .clone()
    .or_else(fixture_path_from_env)
    .map(util::canonicalize_lossy);

  Ok(EffectiveConfig {
    projects,
    analyzer,
    out: cli.out,
    fixture,
    no_ai: cli.no_ai,
    deep: cli.deep,
  })
}
