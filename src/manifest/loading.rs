//! Loading the bundler's production manifest from disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::ManifestGraph;

/// Reasons the production manifest could not be used.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// No manifest exists at the expected location.
  #[error("manifest not found at {path}")]
  Missing {
    /// Expected manifest location.
    path: PathBuf,
  },
  /// The manifest exists but could not be read.
  #[error("failed to read manifest at {path}: {source}")]
  Unreadable {
    /// Manifest location.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
  /// The manifest is not a `{ key: { file, css?, imports? } }` document.
  #[error("failed to parse manifest at {path}: {source}")]
  Malformed {
    /// Manifest location.
    path: PathBuf,
    /// Source parse error.
    #[source]
    source: serde_json::Error,
  },
}

/// Load and parse the manifest graph written by a production build.
pub fn load_manifest(path: &Path) -> Result<ManifestGraph, ManifestError> {
  let content = fs::read_to_string(path).map_err(|source| {
    if source.kind() == ErrorKind::NotFound {
      ManifestError::Missing {
        path: path.to_path_buf(),
      }
    } else {
      ManifestError::Unreadable {
        path: path.to_path_buf(),
        source,
      }
    }
  })?;

  serde_json::from_str(&content).map_err(|source| ManifestError::Malformed {
    path: path.to_path_buf(),
    source,
  })
}
