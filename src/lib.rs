#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod html;
pub mod logger;
pub mod manifest;
pub mod models;
pub mod output;
pub mod pattern;
pub mod project;
pub mod resolve;
pub mod selection;
pub mod templates;

pub use builder::{BuildError, PanelBuilder, PassOutcome, PassReport, PassSummary, PlanEntry};
pub use html::inject_tags;
pub use manifest::{collect_stylesheets, load_manifest};
pub use models::{InputFile, ManifestChunk, ManifestGraph, OutputDocument, PanelKind, TemplateId};
pub use output::derive_output_path;
pub use project::BuildContext;
pub use resolve::{AssetContext, BuildMode, DevServer, resolve_asset_tags};
pub use selection::{TemplateRules, TemplateSelector, select_template};
