//! Template markup, read once per build.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::TemplateId;

/// A template could not be read.
#[derive(Debug, Error)]
#[error("failed to read template `{id}` at {path}: {source}")]
pub struct TemplateError {
  /// Template identifier from the configuration.
  pub id: TemplateId,
  /// Resolved file path.
  pub path: PathBuf,
  /// Source I/O error.
  #[source]
  pub source: std::io::Error,
}

/// Loaded template markup keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
  templates: BTreeMap<TemplateId, String>,
}

impl TemplateStore {
  /// Read every referenced template relative to `project_dir`.
  ///
  /// Identifiers shared by several rules are read only once.
  pub fn load<'a, I>(project_dir: &Path, ids: I) -> Result<Self, TemplateError>
  where
    I: IntoIterator<Item = &'a TemplateId>,
  {
    let mut templates = BTreeMap::new();
    for id in ids {
      if templates.contains_key(id) {
        continue;
      }

      let path = project_dir.join(id.as_str());
      let content = fs::read_to_string(&path).map_err(|source| TemplateError {
        id: id.clone(),
        path: path.clone(),
        source,
      })?;
      templates.insert(id.clone(), content);
    }

    Ok(Self { templates })
  }

  /// Markup for `id`, if it was loaded.
  pub fn get(&self, id: &TemplateId) -> Option<&str> {
    self.templates.get(id).map(String::as_str)
  }

  /// Number of distinct templates held.
  pub fn len(&self) -> usize {
    self.templates.len()
  }

  /// Returns true when no templates were loaded.
  pub fn is_empty(&self) -> bool {
    self.templates.is_empty()
  }

  /// Project-relative template paths, for build-script rerun tracking.
  pub fn paths(&self, project_dir: &Path) -> Vec<PathBuf> {
    self
      .templates
      .keys()
      .map(|id| project_dir.join(id.as_str()))
      .collect()
  }
}
