//! Resolved project description handed to the builder.

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, ProjectConfig};
use crate::resolve::{AssetContext, DevServer};

/// Everything a resolution pass needs to know about the project, resolved once at startup.
#[derive(Debug, Clone)]
pub struct BuildContext {
  /// Project (bundle) directory. Every configured path is relative to it.
  pub project_dir: PathBuf,
  /// Loaded configuration.
  pub config: ProjectConfig,
  /// Namespacing path segment for URLs.
  pub bundle_name: String,
}

impl BuildContext {
  /// Resolve a context from an already loaded configuration.
  pub fn new(project_dir: impl Into<PathBuf>, config: ProjectConfig) -> Self {
    let project_dir = project_dir.into();
    let bundle_name = config.resolved_bundle_name(&project_dir);
    Self {
      project_dir,
      config,
      bundle_name,
    }
  }

  /// Discover `panels.config.json` in `project_dir` and resolve a context from it.
  pub fn discover(project_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
    let project_dir = project_dir.into();
    let config = ProjectConfig::discover(&project_dir)?;
    Ok(Self::new(project_dir, config))
  }

  /// Dev server address derived from the configuration.
  pub fn dev_server(&self) -> DevServer {
    DevServer::from(&self.config.server)
  }

  /// Asset context for a development pass.
  pub fn development_assets(&self) -> AssetContext {
    AssetContext::development(
      self.config.development_base(&self.bundle_name),
      self.dev_server(),
      self.config.client_path.clone(),
      self.config.refresh_preamble.clone(),
    )
  }

  /// Directory generated documents are written under.
  pub fn output_dir(&self) -> PathBuf {
    self.config.output_dir(&self.project_dir)
  }

  /// Location of the production manifest.
  pub fn manifest_path(&self) -> PathBuf {
    self.config.manifest_path(&self.project_dir)
  }

  /// Resolve a configured project-relative path.
  pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
    self.project_dir.join(relative)
  }
}
