// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, project input loading, report output and man page rendering
// role: utilities/helpers
// inputs: Paths; project input JSON; serializable reports; clap CommandFactory
// outputs: Canonicalized paths, ProjectInput lists, JSON written to stdout or a file, man page text
// side_effects: write_report creates parent directories and writes files (or prints to stdout for "-")
// invariants:
// - project input accepts a bare array or an object with a `projects` array
// - write_report always emits pretty JSON terminated by a newline
// errors: IO and parse errors bubble with the offending path as context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::CommandFactory;
use serde::{Deserialize, Serialize};

use crate::model::ProjectInput;

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let p = p.as_ref();
  let pb: PathBuf = match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  };
  pb.to_string_lossy().to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectFile {
  List(Vec<ProjectInput>),
  Wrapped { projects: Vec<ProjectInput> },
}

/// Read projects from a JSON file: `[{...}, ...]` or `{"projects": [...]}`.
pub fn load_projects(path: &Path) -> Result<Vec<ProjectInput>> {
  let text = std::fs::read_to_string(path).with_context(|| format!("reading project input {}", path.display()))?;
  let parsed: ProjectFile =
    serde_json::from_str(&text).with_context(|| format!("parsing project input {}", path.display()))?;

  Ok(match parsed {
    ProjectFile::List(p) => p,
    ProjectFile::Wrapped { projects } => projects,
  })
}

/// Write `value` as pretty JSON to stdout (`"-"`) or to the given file path.
pub fn write_report<T: Serialize>(out: &str, value: &T) -> Result<()> {
  let mut body = serde_json::to_vec_pretty(value)?;
  body.push(b'\n');

  if out == "-" {
    use std::io::Write;
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    lock.write_all(&body)?;
    lock.flush()?;
    return Ok(());
  }

  let path = Path::new(out);
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }
  std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;

  Ok(())
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
