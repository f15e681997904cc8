//! Data structures shared by the resolution passes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pattern::normalise_path;

/// The two families of panels a bundle can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
  /// Overlay graphics rendered by the broadcast client.
  Graphics,
  /// Operator panels shown in the dashboard.
  Dashboard,
}

impl PanelKind {
  /// Every panel kind, in output order.
  pub const ALL: [PanelKind; 2] = [PanelKind::Graphics, PanelKind::Dashboard];

  /// Directory name used for the kind both under the source root and in the output.
  pub fn dir_name(self) -> &'static str {
    match self {
      PanelKind::Graphics => "graphics",
      PanelKind::Dashboard => "dashboard",
    }
  }

  /// Parse a directory name into a panel kind.
  pub fn from_dir_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|kind| kind.dir_name() == name)
  }
}

impl fmt::Display for PanelKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.dir_name())
  }
}

/// One declared entry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputFile {
  /// Project-relative path with forward slashes; doubles as the manifest key.
  pub key: String,
  /// Path relative to the source root, used for template matching.
  pub relative: String,
  /// Panel family, derived from the first directory under the source root.
  ///
  /// Informational: reported by the build plan, never used to place documents.
  pub kind: Option<PanelKind>,
  /// File name with the extension stripped, reported by the build plan.
  pub name: String,
}

impl InputFile {
  /// Describe `path` (relative to the project, or absolute inside it) against the source root.
  ///
  /// Returns `None` when the file does not live under `source_root`.
  pub fn new(project_dir: &Path, source_root: &str, path: &Path) -> Option<Self> {
    let relative_to_project = path.strip_prefix(project_dir).unwrap_or(path);
    let key = normalise_path(&relative_to_project.to_string_lossy());
    let root = normalise_path(source_root);
    let root = root.trim_matches('/');

    let relative = if root.is_empty() || root == "." {
      key.clone()
    } else {
      key.strip_prefix(root)?.strip_prefix('/')?.to_string()
    };

    let kind = relative
      .split('/')
      .next()
      .filter(|_| relative.contains('/'))
      .and_then(PanelKind::from_dir_name);
    let name = Path::new(&relative)
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_default();

    Some(Self {
      key,
      relative,
      kind,
      name,
    })
  }
}

/// Identifier of a template: its project-relative path as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TemplateId(pub String);

impl TemplateId {
  /// Borrow the identifier text.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for TemplateId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TemplateId {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

/// One chunk record of a production build manifest.
///
/// Only `file`, `css` and `imports` drive resolution; the other fields written by the
/// bundler are accepted so a real manifest deserialises unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestChunk {
  /// Output file emitted for the chunk, relative to the build output directory.
  pub file: String,
  /// Stylesheets extracted for the chunk, in emission order.
  #[serde(default)]
  pub css: Vec<String>,
  /// Keys of statically imported chunks, in declaration order.
  #[serde(default)]
  pub imports: Vec<String>,
  /// Source path the chunk was built from.
  #[serde(default)]
  pub src: Option<String>,
  /// Chunk name chosen by the bundler.
  #[serde(default)]
  pub name: Option<String>,
  /// Whether the chunk is a declared entry.
  #[serde(default)]
  pub is_entry: bool,
  /// Keys of dynamically imported chunks. These load on demand and are never traversed.
  #[serde(default)]
  pub dynamic_imports: Vec<String>,
  /// Non-stylesheet assets referenced by the chunk.
  #[serde(default)]
  pub assets: Vec<String>,
}

/// Full chunk graph of a production build keyed by entry/chunk key.
pub type ManifestGraph = BTreeMap<String, ManifestChunk>;

/// A finished HTML document ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
  /// Entry the document was generated for.
  pub input: InputFile,
  /// Template the document was rendered from.
  pub template: TemplateId,
  /// Output path relative to the output root.
  pub relative_path: PathBuf,
  /// Final markup.
  pub html: String,
}
