//! Compute the script and stylesheet references an entry's document must declare.

use std::fmt;
use std::str::FromStr;

use crate::asset_paths::{join_url, module_script_tag, stylesheet_tag};
use crate::config::ServerConfig;
use crate::manifest::{ResolveError, collect_stylesheets};
use crate::models::ManifestGraph;

/// Placeholder inside a refresh preamble replaced by the development base URL.
pub const BASE_URL_PLACEHOLDER: &str = "%BASE_URL%";

/// Which kind of documents a pass produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
  /// Documents load modules straight from the live dev server.
  Development,
  /// Documents reference hashed files from the production manifest.
  Production,
}

impl fmt::Display for BuildMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildMode::Development => f.write_str("development"),
      BuildMode::Production => f.write_str("production"),
    }
  }
}

impl FromStr for BuildMode {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.trim().to_ascii_lowercase().as_str() {
      "development" | "dev" => Ok(BuildMode::Development),
      "production" | "prod" => Ok(BuildMode::Production),
      other => Err(format!("unknown build mode `{other}`")),
    }
  }
}

/// Address of the running development server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevServer {
  /// Serve over TLS.
  pub https: bool,
  /// Host name.
  pub host: String,
  /// Port number.
  pub port: u16,
}

impl DevServer {
  /// `protocol://host:port`, without a trailing slash.
  pub fn origin(&self) -> String {
    let protocol = if self.https { "https" } else { "http" };
    format!("{protocol}://{}:{}", self.host, self.port)
  }
}

impl From<&ServerConfig> for DevServer {
  fn from(config: &ServerConfig) -> Self {
    Self {
      https: config.https,
      host: config.host.clone(),
      port: config.port,
    }
  }
}

/// Mode-specific inputs of the resolver.
#[derive(Debug, Clone)]
pub enum AssetTarget {
  /// Live development server.
  Development {
    /// Server the documents load from.
    server: DevServer,
    /// Live-reload client endpoint, relative to the base path.
    client_path: String,
    /// Optional fast-refresh preamble emitted first.
    refresh_preamble: Option<String>,
  },
  /// Finished production build.
  Production {
    /// Chunk graph written by the bundler.
    manifest: ManifestGraph,
  },
}

/// Everything the resolver consults, passed explicitly to every call.
#[derive(Debug, Clone)]
pub struct AssetContext {
  /// URL path prefix every emitted path is joined onto.
  pub base: String,
  /// Mode-specific inputs.
  pub target: AssetTarget,
}

/// Tags resolved for one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAssets {
  /// Markup fragments in injection order.
  pub tags: Vec<String>,
  /// Import keys referenced by the entry's closure that the manifest does not define.
  pub missing_imports: Vec<String>,
}

impl AssetContext {
  /// Context for a development pass.
  pub fn development(
    base: impl Into<String>,
    server: DevServer,
    client_path: impl Into<String>,
    refresh_preamble: Option<String>,
  ) -> Self {
    Self {
      base: base.into(),
      target: AssetTarget::Development {
        server,
        client_path: client_path.into(),
        refresh_preamble,
      },
    }
  }

  /// Context for a production pass over a loaded manifest.
  pub fn production(base: impl Into<String>, manifest: ManifestGraph) -> Self {
    Self {
      base: base.into(),
      target: AssetTarget::Production { manifest },
    }
  }

  /// Mode this context resolves for.
  pub fn mode(&self) -> BuildMode {
    match self.target {
      AssetTarget::Development { .. } => BuildMode::Development,
      AssetTarget::Production { .. } => BuildMode::Production,
    }
  }

  /// Resolve the ordered tag list for `entry_key`.
  pub fn resolve(&self, entry_key: &str) -> Result<ResolvedAssets, ResolveError> {
    resolve_asset_tags(entry_key, self)
  }
}

/// Resolve the ordered tag list an entry's document must declare.
///
/// Development documents reference the dev server directly: the optional refresh preamble,
/// the live-reload client, then the entry module. Production documents reference every
/// stylesheet reachable from the entry chunk, de-duplicated, followed by one script tag for
/// the entry chunk's own file.
pub fn resolve_asset_tags(
  entry_key: &str,
  context: &AssetContext,
) -> Result<ResolvedAssets, ResolveError> {
  match &context.target {
    AssetTarget::Development {
      server,
      client_path,
      refresh_preamble,
    } => {
      let served_base = join_url(&server.origin(), &context.base);
      let mut tags = Vec::with_capacity(3);
      if let Some(preamble) = refresh_preamble {
        tags.push(preamble.replace(BASE_URL_PLACEHOLDER, &served_base));
      }
      tags.push(module_script_tag(&join_url(&served_base, client_path)));
      tags.push(module_script_tag(&join_url(&served_base, entry_key)));

      Ok(ResolvedAssets {
        tags,
        missing_imports: Vec::new(),
      })
    }
    AssetTarget::Production { manifest } => {
      let closure = collect_stylesheets(manifest, entry_key)?;
      let Some(entry) = closure.entry else {
        return Err(ResolveError::MissingEntry {
          entry: entry_key.to_string(),
        });
      };

      let mut tags: Vec<String> = closure
        .stylesheets
        .iter()
        .map(|stylesheet| stylesheet_tag(&join_url(&context.base, stylesheet)))
        .collect();
      tags.push(module_script_tag(&join_url(&context.base, &entry.file)));

      Ok(ResolvedAssets {
        tags,
        missing_imports: closure
          .missing_imports
          .iter()
          .map(|key| key.to_string())
          .collect(),
      })
    }
  }
}
