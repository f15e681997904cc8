//! Project configuration loader describing panel sources, templates and bundler output.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File name searched for in the project directory.
pub const DEFAULT_CONFIG_FILE: &str = "panels.config.json";

/// Errors that can occur while loading the project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Failed to read the configuration file from disk.
  #[error("failed to read {path}: {source}")]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
  /// Failed to parse the JSON configuration file.
  #[error("failed to parse {path}: {source}")]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    #[source]
    source: serde_json::Error,
  },
}

/// Development server address the live documents point at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  /// Serve over TLS.
  pub https: bool,
  /// Host name the dev server listens on.
  pub host: String,
  /// Port the dev server listens on.
  pub port: u16,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      https: false,
      host: "localhost".into(),
      port: 3000,
    }
  }
}

/// Discoverable project configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
  /// Root that template patterns match against and output paths are derived from.
  pub source_root: String,
  /// Project-relative patterns used to discover entry files.
  pub inputs: Vec<String>,
  /// Ordered `pattern -> template path` rules. The first matching rule wins.
  pub templates: serde_json::Map<String, serde_json::Value>,
  /// Namespacing path segment; defaults to the project directory's name.
  pub bundle_name: Option<String>,
  /// Bundler output directory, relative to the project.
  pub out_dir: String,
  /// Manifest file name inside `out_dir`.
  pub manifest_file: String,
  /// Directory the generated documents are written under, relative to the project.
  pub output_root: String,
  /// Development server address.
  pub server: ServerConfig,
  /// Live-reload client endpoint served by the dev server.
  pub client_path: String,
  /// Optional fast-refresh preamble emitted ahead of the development scripts.
  ///
  /// Occurrences of `%BASE_URL%` are replaced with the development base URL.
  pub refresh_preamble: Option<String>,
  /// Remove documents left over from earlier passes.
  pub prune_stale: bool,
}

impl Default for ProjectConfig {
  fn default() -> Self {
    let mut templates = serde_json::Map::new();
    templates.insert(
      "graphics/**/*".into(),
      serde_json::Value::String("src/graphics/template.html".into()),
    );
    templates.insert(
      "dashboard/**/*".into(),
      serde_json::Value::String("src/dashboard/template.html".into()),
    );

    Self {
      source_root: "src".into(),
      inputs: vec![
        "src/graphics/**/*.{js,jsx,ts,tsx}".into(),
        "src/dashboard/**/*.{js,jsx,ts,tsx}".into(),
      ],
      templates,
      bundle_name: None,
      out_dir: "shared/dist".into(),
      manifest_file: "manifest.json".into(),
      output_root: ".".into(),
      server: ServerConfig::default(),
      client_path: "@vite/client".into(),
      refresh_preamble: None,
      prune_stale: true,
    }
  }
}

impl ProjectConfig {
  /// Load configuration from the project directory.
  ///
  /// A missing configuration file yields the defaults; an unreadable or malformed one is an
  /// error, since silently building with defaults would write documents to the wrong place.
  pub fn discover(project_dir: &Path) -> Result<Self, ConfigError> {
    let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
    match Self::from_path(&candidate) {
      Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
        Ok(Self::default())
      }
      other => other,
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Bundle name, falling back to the project directory's base name.
  pub fn resolved_bundle_name(&self, project_dir: &Path) -> String {
    if let Some(name) = self
      .bundle_name
      .as_deref()
      .map(str::trim)
      .filter(|name| !name.is_empty())
    {
      return name.to_string();
    }

    project_dir
      .canonicalize()
      .unwrap_or_else(|_| project_dir.to_path_buf())
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| "bundle".to_string())
  }

  /// URL path prefix the dev server serves this bundle under.
  pub fn development_base(&self, bundle_name: &str) -> String {
    format!("/bundles/{bundle_name}/")
  }

  /// URL path prefix the production output is served under.
  pub fn production_base(&self, bundle_name: &str) -> String {
    let out_dir = self.out_dir.trim_matches('/');
    if out_dir.is_empty() {
      self.development_base(bundle_name)
    } else {
      format!("/bundles/{bundle_name}/{out_dir}/")
    }
  }

  /// Absolute location of the build manifest.
  pub fn manifest_path(&self, project_dir: &Path) -> PathBuf {
    project_dir.join(&self.out_dir).join(&self.manifest_file)
  }

  /// Absolute directory the documents are written under.
  pub fn output_dir(&self, project_dir: &Path) -> PathBuf {
    project_dir.join(&self.output_root)
  }

  /// Template rules as ordered `(pattern, template)` pairs.
  ///
  /// Non-string values are skipped; they cannot name a template file.
  pub fn template_rules(&self) -> Vec<(String, String)> {
    self
      .templates
      .iter()
      .filter_map(|(pattern, template)| {
        template
          .as_str()
          .map(|template| (pattern.clone(), template.to_string()))
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn missing_file_yields_defaults() {
    let temp = tempdir().unwrap();
    let config = ProjectConfig::discover(temp.path()).unwrap();

    assert_eq!(config.source_root, "src");
    assert_eq!(config.server, ServerConfig::default());
    assert_eq!(config.template_rules(), vec![
      ("graphics/**/*".to_string(), "src/graphics/template.html".to_string()),
      ("dashboard/**/*".to_string(), "src/dashboard/template.html".to_string()),
    ]);
  }

  #[test]
  fn template_rules_keep_declaration_order() {
    let temp = tempdir().unwrap();
    fs::write(
      temp.path().join(DEFAULT_CONFIG_FILE),
      r#"{
        "templates": {
          "graphics/special_graphic.js": "templates/special_template.html",
          "graphics/*/main.js": "templates/graphics.html",
          "dashboard/*/main.js": "templates/dashboard.html"
        },
        "server": { "port": 5173 }
      }"#,
    )
    .unwrap();

    let config = ProjectConfig::discover(temp.path()).unwrap();
    let patterns: Vec<String> = config
      .template_rules()
      .into_iter()
      .map(|(pattern, _)| pattern)
      .collect();

    assert_eq!(patterns, vec![
      "graphics/special_graphic.js",
      "graphics/*/main.js",
      "dashboard/*/main.js"
    ]);
    assert_eq!(config.server.port, 5173);
    assert_eq!(config.server.host, "localhost");
    assert_eq!(config.out_dir, "shared/dist");
  }

  #[test]
  fn malformed_file_is_an_error() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join(DEFAULT_CONFIG_FILE), "{ not json").unwrap();

    assert!(matches!(
      ProjectConfig::discover(temp.path()),
      Err(ConfigError::Parse { .. })
    ));
  }

  #[test]
  fn bundle_name_defaults_to_directory_name() {
    let temp = tempdir().unwrap();
    let project = temp.path().join("mybundle");
    fs::create_dir_all(&project).unwrap();

    let mut config = ProjectConfig::default();
    assert_eq!(config.resolved_bundle_name(&project), "mybundle");

    config.bundle_name = Some("override".into());
    assert_eq!(config.resolved_bundle_name(&project), "override");
  }

  #[test]
  fn base_paths_follow_bundle_layout() {
    let config = ProjectConfig::default();
    assert_eq!(config.development_base("mybundle"), "/bundles/mybundle/");
    assert_eq!(
      config.production_base("mybundle"),
      "/bundles/mybundle/shared/dist/"
    );
    assert_eq!(
      config.manifest_path(Path::new("/work")),
      PathBuf::from("/work/shared/dist/manifest.json")
    );
  }
}
