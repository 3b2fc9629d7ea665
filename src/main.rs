use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use repo_evidence_report::analyzer::Analyzer;
use repo_evidence_report::cli::{normalize, Cli};
use repo_evidence_report::generation::{GenerationClient, HttpGenerationClient};
use repo_evidence_report::observer::TracingObserver;
use repo_evidence_report::source::{get_github_token, DefaultSourceFactory, FixtureSet};
use repo_evidence_report::util;

fn init_tracing(verbose: u8) {
  let default_level = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  init_tracing(cli.verbose);

  // Phase 1: normalize CLI and configuration
  let cfg = normalize(cli)?;

  // Phase 2: choose backends
  let fixture = match cfg.fixture.as_deref() {
    Some(p) => Some(FixtureSet::load(Path::new(p))?),
    None => None,
  };
  let token = if fixture.is_some() { None } else { get_github_token() };
  if fixture.is_none() && token.is_none() {
    info!("no GitHub token found; repositories are analysed from their names only");
  }

  let generator: Option<Arc<dyn GenerationClient>> = if cfg.no_ai {
    None
  } else {
    match HttpGenerationClient::from_config(&cfg.analyzer.generation, cfg.analyzer.timeouts.longest_generation()) {
      Some(c) => Some(Arc::new(c)),
      None => {
        info!(env = %cfg.analyzer.generation.api_key_env, "generation API key not set; using heuristic scores");
        None
      }
    }
  };

  let sources = DefaultSourceFactory {
    fixture,
    token,
    http_timeout: cfg.analyzer.timeouts.metadata(),
    max_commit_pages: cfg.analyzer.caps.max_commit_pages,
  };

  // Phase 3: analyse and report
  let analyzer = Analyzer::new(cfg.analyzer.clone(), Arc::new(sources), Arc::new(TracingObserver))
    .with_generator(generator)
    .with_deep_analysis(cfg.deep);

  let summary = analyzer.run_batch(&cfg.projects);
  debug!(total = summary.total, failures = summary.failures, "writing report");

  util::write_report(&cfg.out, &summary)
}
