//! Panel build orchestrator: selects templates, resolves assets and writes documents.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::asset_paths::is_declaration_file;
use crate::config::{ConfigError, DEFAULT_CONFIG_FILE};
use crate::diagnostics::Diagnostic;
use crate::discovery::{InputPatterns, discover_inputs};
use crate::html::inject_tags;
use crate::manifest::{ManifestError, ResolveError, load_manifest};
use crate::models::{InputFile, OutputDocument, PanelKind, TemplateId};
use crate::output::{
  OutputClaims, OutputError, derive_output_path, prune_stale_documents, write_documents,
};
use crate::pattern::PatternError;
use crate::project::BuildContext;
use crate::resolve::{AssetContext, BuildMode};
use crate::selection::{TemplateRules, TemplateSelector};
use crate::templates::{TemplateError, TemplateStore};

/// Fatal problems that stop a build before any document is produced.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The configuration could not be loaded.
  #[error(transparent)]
  Config(#[from] ConfigError),
  /// A template or discovery pattern is invalid.
  #[error(transparent)]
  Pattern(#[from] PatternError),
  /// A referenced template could not be read.
  #[error(transparent)]
  Template(#[from] TemplateError),
  /// No template rules are configured.
  #[error("no template rules are configured")]
  NoTemplateRules,
  /// Discovery found no entry files at all.
  #[error("no input files found (searched {})", .patterns.join(", "))]
  NoInputs {
    /// Patterns that were searched.
    patterns: Vec<String>,
  },
}

/// Entries taking part in a pass.
#[derive(Debug, Default)]
pub struct InputSet {
  /// Entries under the source root, in discovery order.
  pub files: Vec<InputFile>,
  /// Entries excluded before resolution.
  pub diagnostics: Vec<Diagnostic>,
}

/// Documents produced by one resolution pass, before writing.
#[derive(Debug)]
pub struct PassReport {
  /// Mode the pass resolved for.
  pub mode: BuildMode,
  /// Documents in input order.
  pub documents: Vec<OutputDocument>,
  /// Recoverable problems, attributed to their input.
  pub diagnostics: Vec<Diagnostic>,
}

/// Result of a pass that was written to disk.
#[derive(Debug)]
pub struct PassSummary {
  /// Mode the pass resolved for.
  pub mode: BuildMode,
  /// Paths written, relative to the output directory.
  pub written: Vec<PathBuf>,
  /// Stale documents removed, relative to the output directory.
  pub removed: Vec<PathBuf>,
  /// Recoverable problems, attributed to their input or path.
  pub diagnostics: Vec<Diagnostic>,
}

/// Where one entry's document comes from and where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
  /// The entry.
  #[serde(flatten)]
  pub input: InputFile,
  /// Template selected for it, if any rule matches.
  pub template: Option<TemplateId>,
  /// Document path relative to the output directory, when a template matched.
  pub output: Option<PathBuf>,
}

/// How a production pass ended.
#[derive(Debug)]
pub enum PassOutcome {
  /// The pass ran and its documents were written.
  Completed(PassSummary),
  /// The manifest could not be used; nothing was written.
  Skipped(ManifestError),
}

/// High-level helper running development and production passes for one project.
pub struct PanelBuilder {
  context: BuildContext,
  rules: TemplateRules,
  templates: TemplateStore,
}

impl PanelBuilder {
  /// Compile the template rules and read every template once.
  pub fn new(context: BuildContext) -> Result<Self, BuildError> {
    let rules = TemplateRules::compile(context.config.template_rules())?;
    if rules.is_empty() {
      return Err(BuildError::NoTemplateRules);
    }
    let templates = TemplateStore::load(&context.project_dir, rules.template_ids())?;
    crate::debug!("templates"; "loaded {} template(s) for {} rule(s)", templates.len(), rules.rules().len());

    Ok(Self {
      context,
      rules,
      templates,
    })
  }

  /// Project context the builder was created with.
  pub fn context(&self) -> &BuildContext {
    &self.context
  }

  /// Compiled template rules.
  pub fn rules(&self) -> &TemplateRules {
    &self.rules
  }

  /// Collect the entries for a pass.
  ///
  /// Explicit paths are used as given, minus ones that do not exist or are declaration
  /// files; otherwise the configured input patterns are discovered on disk. Finding no
  /// entry at all is fatal.
  pub fn collect_inputs(&self, explicit: &[PathBuf]) -> Result<InputSet, BuildError> {
    let config = &self.context.config;
    let paths = if explicit.is_empty() {
      let patterns = InputPatterns::compile(config.inputs.as_slice())?;
      let source_dir = self.context.path(&config.source_root);
      let output_dir = self.context.output_dir();
      let skip = std::iter::once(self.context.path(&config.out_dir))
        .chain(PanelKind::ALL.iter().map(|kind| output_dir.join(kind.dir_name())))
        .filter(|dir| !dir.starts_with(&source_dir))
        .collect::<Vec<_>>();
      discover_inputs(&self.context.project_dir, &patterns, &skip)
    } else {
      explicit.to_vec()
    };

    if paths.is_empty() {
      return Err(BuildError::NoInputs {
        patterns: if explicit.is_empty() {
          config.inputs.clone()
        } else {
          Vec::new()
        },
      });
    }

    let mut inputs = InputSet::default();
    for path in paths {
      if !explicit.is_empty() {
        let input = path.display().to_string();
        if is_declaration_file(&input) {
          inputs.diagnostics.push(Diagnostic::DeclarationInput { input });
          continue;
        }
        if !self.context.project_dir.join(&path).is_file() {
          inputs.diagnostics.push(Diagnostic::MissingInput { input });
          continue;
        }
      }

      match InputFile::new(&self.context.project_dir, &config.source_root, &path) {
        Some(file) => inputs.files.push(file),
        None => inputs.diagnostics.push(Diagnostic::OutsideSourceRoot {
          input: path.display().to_string(),
          source_root: config.source_root.clone(),
        }),
      }
    }

    Ok(inputs)
  }

  /// Template and output path each input maps to, without resolving any assets.
  pub fn plan(&self, inputs: &[InputFile]) -> Vec<PlanEntry> {
    inputs
      .iter()
      .map(|input| {
        let template = self.rules.template_for(&input.relative).cloned();
        let output = template
          .as_ref()
          .and_then(|_| derive_output_path(&input.key, &self.context.config.source_root).ok());
        PlanEntry {
          input: input.clone(),
          template,
          output,
        }
      })
      .collect()
  }

  /// Resolve every input into a document without touching the disk.
  pub fn generate(&self, inputs: &[InputFile], assets: &AssetContext) -> PassReport {
    render_documents(
      &self.rules,
      &self.templates,
      &self.context.config.source_root,
      inputs,
      assets,
    )
  }

  /// Regenerate every development document.
  ///
  /// Each call is a complete, idempotent regeneration and may be repeated whenever the dev
  /// server restarts.
  pub fn run_development(&self, inputs: &[InputFile]) -> PassSummary {
    let assets = self.context.development_assets();
    let report = self.generate(inputs, &assets);
    self.write(report)
  }

  /// Generate production documents from the bundler's manifest.
  ///
  /// When the manifest is missing or malformed the whole pass is skipped and nothing is
  /// written or pruned.
  pub fn run_production(&self, inputs: &[InputFile]) -> PassOutcome {
    let manifest_path = self.context.manifest_path();
    let manifest = match load_manifest(&manifest_path) {
      Ok(manifest) => manifest,
      Err(err) => return PassOutcome::Skipped(err),
    };
    crate::debug!("build"; "loaded {} manifest chunk(s) from {}", manifest.len(), manifest_path.display());

    let base = self.context.config.production_base(&self.context.bundle_name);
    let assets = AssetContext::production(base, manifest);
    let report = self.generate(inputs, &assets);
    PassOutcome::Completed(self.write(report))
  }

  /// Run the pass matching `mode`.
  pub fn run(&self, mode: BuildMode, inputs: &[InputFile]) -> PassOutcome {
    match mode {
      BuildMode::Development => PassOutcome::Completed(self.run_development(inputs)),
      BuildMode::Production => self.run_production(inputs),
    }
  }

  /// Write a report's documents and prune stale ones.
  pub fn write(&self, report: PassReport) -> PassSummary {
    let PassReport {
      mode,
      documents,
      mut diagnostics,
    } = report;
    let output_dir = self.context.output_dir();

    let failures = write_documents(&output_dir, &documents);
    let failed: BTreeSet<PathBuf> = failures
      .iter()
      .filter_map(|failure| match failure {
        OutputError::Write { path, .. } => path.strip_prefix(&output_dir).ok(),
        _ => None,
      })
      .map(Path::to_path_buf)
      .collect();
    diagnostics.extend(failures.into_iter().map(Diagnostic::from));

    let written: Vec<PathBuf> = documents
      .iter()
      .map(|document| document.relative_path.clone())
      .filter(|path| !failed.contains(path))
      .collect();

    let removed = if self.context.config.prune_stale {
      let mut keep: BTreeSet<PathBuf> = documents
        .iter()
        .map(|document| document.relative_path.clone())
        .collect();
      keep.extend(
        self
          .templates
          .paths(&self.context.project_dir)
          .into_iter()
          .filter_map(|path| path.strip_prefix(&output_dir).ok().map(Path::to_path_buf)),
      );
      let dirs = self.prunable_dirs(&output_dir);
      match prune_stale_documents(&output_dir, &dirs, &keep) {
        Ok(removed) => removed,
        Err(err) => {
          diagnostics.push(Diagnostic::PruneFailed(err));
          Vec::new()
        }
      }
    } else {
      Vec::new()
    };

    PassSummary {
      mode,
      written,
      removed,
      diagnostics,
    }
  }

  /// Output kind directories that hold only generated documents.
  ///
  /// A directory inside the source root also holds sources and templates, so it is never
  /// pruned.
  fn prunable_dirs(&self, output_dir: &Path) -> Vec<&'static str> {
    let source_dir = self.context.path(&self.context.config.source_root);
    PanelKind::ALL
      .iter()
      .map(|kind| kind.dir_name())
      .filter(|dir| {
        let inside_sources = output_dir.join(dir).starts_with(&source_dir);
        if inside_sources {
          crate::debug!("prune"; "not pruning {dir}: it lies inside the source root");
        }
        !inside_sources
      })
      .collect()
  }

  /// Files whose change should trigger a regeneration when driven from a build script.
  pub fn rerun_paths(&self) -> Vec<PathBuf> {
    let mut paths = vec![self.context.path(DEFAULT_CONFIG_FILE)];
    paths.extend(self.templates.paths(&self.context.project_dir));
    paths.push(self.context.manifest_path());
    paths
  }
}

/// Select, resolve and inject every input.
///
/// Inputs without a template, without a manifest entry, or whose output path is already
/// claimed by an earlier input are skipped with a diagnostic; the others still render.
pub fn render_documents<S: TemplateSelector>(
  selector: &S,
  templates: &TemplateStore,
  source_root: &str,
  inputs: &[InputFile],
  assets: &AssetContext,
) -> PassReport {
  let mut documents = Vec::with_capacity(inputs.len());
  let mut diagnostics = Vec::new();
  let mut claims = OutputClaims::default();

  for input in inputs {
    let Some(template_id) = selector.template_for(&input.relative) else {
      diagnostics.push(Diagnostic::UnmatchedInput {
        input: input.key.clone(),
      });
      continue;
    };
    let Some(template) = templates.get(template_id) else {
      diagnostics.push(Diagnostic::UnmatchedInput {
        input: input.key.clone(),
      });
      continue;
    };

    let relative_path = match derive_output_path(&input.key, source_root) {
      Ok(path) => path,
      Err(err) => {
        diagnostics.push(Diagnostic::from(err));
        continue;
      }
    };

    let resolved = match assets.resolve(&input.key) {
      Ok(resolved) => resolved,
      Err(ResolveError::MissingEntry { .. }) => {
        diagnostics.push(Diagnostic::MissingManifestEntry {
          input: input.key.clone(),
        });
        continue;
      }
    };
    diagnostics.extend(
      resolved
        .missing_imports
        .into_iter()
        .map(|import| Diagnostic::MissingImport {
          input: input.key.clone(),
          import,
        }),
    );

    if let Err(owner) = claims.claim(&relative_path, &input.key) {
      diagnostics.push(Diagnostic::OutputCollision {
        input: input.key.clone(),
        owner,
        path: relative_path,
      });
      continue;
    }

    crate::debug!("resolve"; "{} -> {} ({} tag(s), template {})", input.key, relative_path.display(), resolved.tags.len(), template_id);
    documents.push(OutputDocument {
      input: input.clone(),
      template: template_id.clone(),
      html: inject_tags(template, &resolved.tags),
      relative_path,
    });
  }

  PassReport {
    mode: assets.mode(),
    documents,
    diagnostics,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ProjectConfig;
  use crate::models::{ManifestChunk, ManifestGraph};
  use crate::resolve::DevServer;
  use std::fs;
  use tempfile::tempdir;

  fn input(key: &str) -> InputFile {
    InputFile::new(Path::new("/project"), "src", Path::new(key)).unwrap()
  }

  fn store(dir: &Path, templates: &[(&str, &str)]) -> TemplateStore {
    for (path, content) in templates {
      let full = dir.join(path);
      fs::create_dir_all(full.parent().unwrap()).unwrap();
      fs::write(full, content).unwrap();
    }
    let ids: Vec<TemplateId> = templates.iter().map(|(path, _)| TemplateId::from(*path)).collect();
    TemplateStore::load(dir, &ids).unwrap()
  }

  fn dev_assets() -> AssetContext {
    AssetContext::development(
      "/bundles/demo/",
      DevServer {
        https: false,
        host: "localhost".into(),
        port: 3000,
      },
      "@vite/client",
      None,
    )
  }

  #[test]
  fn unmatched_inputs_are_skipped_with_a_warning() {
    let dir = tempdir().unwrap();
    let templates = store(dir.path(), &[("graphics.html", "<head></head>")]);
    let rules = TemplateRules::compile([("graphics/*.js", "graphics.html")]).unwrap();
    let inputs = vec![input("src/graphics/a.js"), input("src/extension/b.js")];

    let report = render_documents(&rules, &templates, "src", &inputs, &dev_assets());

    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].relative_path, PathBuf::from("graphics/a.html"));
    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
      &report.diagnostics[0],
      Diagnostic::UnmatchedInput { input } if input == "src/extension/b.js"
    ));
  }

  #[test]
  fn colliding_outputs_keep_the_first_input() {
    let dir = tempdir().unwrap();
    let templates = store(dir.path(), &[("graphics.html", "<head></head>")]);
    let rules = TemplateRules::compile([("graphics/*", "graphics.html")]).unwrap();
    let inputs = vec![input("src/graphics/main.js"), input("src/graphics/main.ts")];

    let report = render_documents(&rules, &templates, "src", &inputs, &dev_assets());

    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].input.key, "src/graphics/main.js");
    assert!(matches!(
      &report.diagnostics[0],
      Diagnostic::OutputCollision { input, owner, .. }
        if input == "src/graphics/main.ts" && owner == "src/graphics/main.js"
    ));
  }

  #[test]
  fn missing_manifest_entries_skip_only_that_input() {
    let dir = tempdir().unwrap();
    let templates = store(dir.path(), &[("graphics.html", "<head></head>")]);
    let rules = TemplateRules::compile([("graphics/*.js", "graphics.html")]).unwrap();
    let manifest: ManifestGraph = [(
      "src/graphics/a.js".to_string(),
      ManifestChunk {
        file: "assets/a.js".into(),
        ..ManifestChunk::default()
      },
    )]
    .into_iter()
    .collect();
    let assets = AssetContext::production("/bundles/demo/shared/dist/", manifest);
    let inputs = vec![input("src/graphics/a.js"), input("src/graphics/b.js")];

    let report = render_documents(&rules, &templates, "src", &inputs, &assets);

    assert_eq!(report.mode, BuildMode::Production);
    assert_eq!(report.documents.len(), 1);
    assert_eq!(
      report.documents[0].html,
      "<head><script type=\"module\" src=\"/bundles/demo/shared/dist/assets/a.js\"></script>\n</head>"
    );
    assert!(matches!(
      &report.diagnostics[0],
      Diagnostic::MissingManifestEntry { input } if input == "src/graphics/b.js"
    ));
  }

  #[test]
  fn builder_requires_readable_templates_and_rules() {
    let dir = tempdir().unwrap();
    let context = BuildContext::new(dir.path(), ProjectConfig::default());
    assert!(matches!(
      PanelBuilder::new(context),
      Err(BuildError::Template(_))
    ));

    let config = ProjectConfig {
      templates: serde_json::Map::new(),
      ..ProjectConfig::default()
    };
    assert!(matches!(
      PanelBuilder::new(BuildContext::new(dir.path(), config)),
      Err(BuildError::NoTemplateRules)
    ));
  }

  #[test]
  fn empty_discovery_is_fatal() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/graphics")).unwrap();
    fs::create_dir_all(dir.path().join("src/dashboard")).unwrap();
    fs::write(dir.path().join("src/graphics/template.html"), "<head></head>").unwrap();
    fs::write(dir.path().join("src/dashboard/template.html"), "<head></head>").unwrap();

    let builder =
      PanelBuilder::new(BuildContext::new(dir.path(), ProjectConfig::default())).unwrap();
    assert!(matches!(
      builder.collect_inputs(&[]),
      Err(BuildError::NoInputs { .. })
    ));
  }

  #[test]
  fn explicit_inputs_outside_the_source_root_are_reported() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/graphics")).unwrap();
    fs::create_dir_all(dir.path().join("src/dashboard")).unwrap();
    fs::write(dir.path().join("src/graphics/template.html"), "<head></head>").unwrap();
    fs::write(dir.path().join("src/dashboard/template.html"), "<head></head>").unwrap();

    fs::write(dir.path().join("src/graphics/a.js"), "").unwrap();
    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("lib/other.js"), "").unwrap();

    let builder =
      PanelBuilder::new(BuildContext::new(dir.path(), ProjectConfig::default())).unwrap();
    let inputs = builder
      .collect_inputs(&[
        PathBuf::from("src/graphics/a.js"),
        PathBuf::from("lib/other.js"),
      ])
      .unwrap();

    assert_eq!(inputs.files.len(), 1);
    assert!(matches!(
      &inputs.diagnostics[0],
      Diagnostic::OutsideSourceRoot { input, .. } if input == "lib/other.js"
    ));
  }

  #[test]
  fn explicit_declaration_files_and_missing_paths_are_skipped() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/graphics")).unwrap();
    fs::create_dir_all(dir.path().join("src/dashboard")).unwrap();
    fs::write(dir.path().join("src/graphics/template.html"), "<head></head>").unwrap();
    fs::write(dir.path().join("src/dashboard/template.html"), "<head></head>").unwrap();
    fs::write(dir.path().join("src/graphics/main.js"), "").unwrap();
    fs::write(dir.path().join("src/graphics/types.d.ts"), "").unwrap();

    let builder =
      PanelBuilder::new(BuildContext::new(dir.path(), ProjectConfig::default())).unwrap();
    let inputs = builder
      .collect_inputs(&[
        PathBuf::from("src/graphics/main.js"),
        PathBuf::from("src/graphics/types.d.ts"),
        PathBuf::from("src/graphics/gone.js"),
      ])
      .unwrap();

    assert_eq!(inputs.files.len(), 1);
    assert_eq!(inputs.files[0].key, "src/graphics/main.js");
    assert!(matches!(
      &inputs.diagnostics[0],
      Diagnostic::DeclarationInput { input } if input == "src/graphics/types.d.ts"
    ));
    assert!(matches!(
      &inputs.diagnostics[1],
      Diagnostic::MissingInput { input } if input == "src/graphics/gone.js"
    ));
  }

  #[test]
  fn plan_reports_kind_template_and_output() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/graphics")).unwrap();
    fs::create_dir_all(dir.path().join("src/dashboard")).unwrap();
    fs::write(dir.path().join("src/graphics/template.html"), "<head></head>").unwrap();
    fs::write(dir.path().join("src/dashboard/template.html"), "<head></head>").unwrap();

    let config = ProjectConfig {
      templates: [(
        "graphics/**/*".to_string(),
        serde_json::Value::String("src/graphics/template.html".into()),
      )]
      .into_iter()
      .collect(),
      ..ProjectConfig::default()
    };
    let builder = PanelBuilder::new(BuildContext::new(dir.path(), config)).unwrap();
    let entries = builder.plan(&[
      input("src/graphics/clock/main.ts"),
      input("src/dashboard/panel.js"),
    ]);

    assert_eq!(
      entries[0].template,
      Some(TemplateId::from("src/graphics/template.html"))
    );
    assert_eq!(entries[0].output, Some(PathBuf::from("graphics/clock/main.html")));
    assert_eq!(entries[1].template, None);
    assert_eq!(entries[1].output, None);

    let json = serde_json::to_value(&entries).unwrap();
    assert_eq!(json[0]["key"], "src/graphics/clock/main.ts");
    assert_eq!(json[0]["kind"], "graphics");
    assert_eq!(json[0]["name"], "main");
    assert_eq!(json[0]["template"], "src/graphics/template.html");
    assert_eq!(json[1]["kind"], "dashboard");
    assert!(json[1]["output"].is_null());
  }
}
