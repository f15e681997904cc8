//! Output path derivation and writing of generated documents.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::OutputDocument;
use crate::pattern::normalise_path;

/// Extension given to every generated document.
pub const DOCUMENT_EXTENSION: &str = "html";

/// Problems deriving or writing an output document.
#[derive(Debug, Error)]
pub enum OutputError {
  /// The input does not live under the source root.
  #[error("input `{input}` is not inside the source root `{source_root}`")]
  OutsideSourceRoot {
    /// Offending input.
    input: String,
    /// Configured source root.
    source_root: String,
  },
  /// The input path has no file name to derive a document from.
  #[error("input `{input}` has no file name")]
  NoFileName {
    /// Offending input.
    input: String,
  },
  /// Writing a document failed.
  #[error("failed to write {path}: {source}")]
  Write {
    /// Destination path.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
}

/// Derive the document path for `input_path` relative to the output root.
///
/// The directory structure below `source_root` is preserved and the source extension is
/// replaced with `.html`, so `src/graphics/clock/main.ts` becomes `graphics/clock/main.html`.
pub fn derive_output_path(input_path: &str, source_root: &str) -> Result<PathBuf, OutputError> {
  let input = normalise_path(input_path);
  let root = normalise_path(source_root);
  let root = root.trim_matches('/');

  let relative = if root.is_empty() || root == "." {
    Some(input.as_str())
  } else {
    input.strip_prefix(root).and_then(|rest| rest.strip_prefix('/'))
  };
  let relative = relative.ok_or_else(|| OutputError::OutsideSourceRoot {
    input: input_path.to_string(),
    source_root: source_root.to_string(),
  })?;

  let mut path: PathBuf = relative.split('/').filter(|part| !part.is_empty()).collect();
  if path.file_stem().is_none() {
    return Err(OutputError::NoFileName {
      input: input_path.to_string(),
    });
  }
  path.set_extension(DOCUMENT_EXTENSION);
  Ok(path)
}

/// Tracks which input claimed each output path during one pass.
#[derive(Debug, Default)]
pub struct OutputClaims {
  claims: BTreeMap<PathBuf, String>,
}

impl OutputClaims {
  /// Claim `path` for `input`.
  ///
  /// Returns the input that already holds the path when it is taken.
  pub fn claim(&mut self, path: &Path, input: &str) -> Result<(), String> {
    match self.claims.get(path) {
      Some(owner) => Err(owner.clone()),
      None => {
        self.claims.insert(path.to_path_buf(), input.to_string());
        Ok(())
      }
    }
  }
}

/// Write every document below `output_dir`, creating directories as needed.
///
/// A failure affects only its own document; the remaining documents are still written and
/// every failure is returned.
pub fn write_documents(output_dir: &Path, documents: &[OutputDocument]) -> Vec<OutputError> {
  documents
    .iter()
    .filter_map(|document| write_document(output_dir, document).err())
    .collect()
}

fn write_document(output_dir: &Path, document: &OutputDocument) -> Result<(), OutputError> {
  let destination = output_dir.join(&document.relative_path);
  if let Some(parent) = destination.parent() {
    fs::create_dir_all(parent).map_err(|source| OutputError::Write {
      path: destination.clone(),
      source,
    })?;
  }

  fs::write(&destination, &document.html).map_err(|source| OutputError::Write {
    path: destination,
    source,
  })
}

/// Remove generated documents under `output_dir/<dir>` that are not in `keep`.
///
/// Only `.html` files are removed; other files are left alone. Directories emptied by the
/// pruning are removed as well. `keep` holds paths relative to `output_dir`.
pub fn prune_stale_documents(
  output_dir: &Path,
  dirs: &[&str],
  keep: &BTreeSet<PathBuf>,
) -> std::io::Result<Vec<PathBuf>> {
  let mut removed = Vec::new();
  for dir in dirs {
    let relative = PathBuf::from(dir);
    if output_dir.join(&relative).is_dir() {
      prune_subtree(output_dir, &relative, keep, &mut removed)?;
    }
  }
  Ok(removed)
}

/// Returns true when the directory at `relative` ended up empty and was removed.
fn prune_subtree(
  root: &Path,
  relative: &Path,
  keep: &BTreeSet<PathBuf>,
  removed: &mut Vec<PathBuf>,
) -> std::io::Result<bool> {
  let current_path = root.join(relative);
  let entries = match fs::read_dir(&current_path) {
    Ok(entries) => entries,
    Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
    Err(err) => return Err(err),
  };

  let mut remaining = 0usize;
  for entry in entries {
    let entry = entry?;
    let child_relative = relative.join(entry.file_name());
    let file_type = entry.file_type()?;

    if file_type.is_dir() {
      if !prune_subtree(root, &child_relative, keep, removed)? {
        remaining += 1;
      }
    } else if keep.contains(&child_relative) || !is_document(&child_relative) {
      remaining += 1;
    } else {
      fs::remove_file(entry.path())?;
      removed.push(child_relative);
    }
  }

  if remaining == 0 {
    fs::remove_dir(&current_path)?;
    return Ok(true);
  }
  Ok(false)
}

fn is_document(path: &Path) -> bool {
  path
    .extension()
    .is_some_and(|extension| extension.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}
