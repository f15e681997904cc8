//! Locating entry files on disk.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::asset_paths::is_declaration_file;
use crate::pattern::{GlobPattern, PatternError, normalise_path};

/// Directory names never descended into.
const IGNORED_DIRS: &[&str] = &["node_modules", "target"];

/// Compiled discovery patterns, relative to the project directory.
#[derive(Debug, Clone)]
pub struct InputPatterns {
  patterns: Vec<GlobPattern>,
}

impl InputPatterns {
  /// Compile project-relative discovery patterns.
  pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
    let patterns = patterns
      .iter()
      .map(|pattern| GlobPattern::new(pattern.as_ref()))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self { patterns })
  }

  /// Whether a project-relative path is an entry.
  pub fn is_input(&self, relative: &str) -> bool {
    !is_declaration_file(relative) && self.patterns.iter().any(|pattern| pattern.is_match(relative))
  }
}

/// Walk `project_dir` and return every entry file, project-relative and sorted.
///
/// Hidden directories, dependency folders and every directory in `skip` (typically the
/// bundler output and the document output) are not descended into. Declaration artifacts
/// are filtered out. Unreadable directory entries are skipped.
pub fn discover_inputs(project_dir: &Path, patterns: &InputPatterns, skip: &[PathBuf]) -> Vec<PathBuf> {
  let mut inputs: Vec<PathBuf> = WalkDir::new(project_dir)
    .follow_links(false)
    .into_iter()
    .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry, skip))
    .filter_map(Result::ok)
    .filter(|entry| entry.file_type().is_file())
    .filter_map(|entry| {
      let relative = entry.path().strip_prefix(project_dir).ok()?.to_path_buf();
      let key = normalise_path(&relative.to_string_lossy());
      patterns.is_input(&key).then_some(relative)
    })
    .collect();

  inputs.sort();
  inputs
}

fn is_skipped_dir(entry: &DirEntry, skip: &[PathBuf]) -> bool {
  if !entry.file_type().is_dir() {
    return false;
  }

  let name = entry.file_name().to_string_lossy();
  name.starts_with('.')
    || IGNORED_DIRS.contains(&name.as_ref())
    || skip.iter().any(|dir| entry.path() == dir.as_path())
}
