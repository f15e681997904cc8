use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use panel_html::config::ProjectConfig;
use panel_html::diagnostics::{Diagnostic, emit_cargo_warnings};
use panel_html::{BuildContext, BuildMode, PanelBuilder, PassOutcome, PassSummary, logger};
use panel_html::{debug, log, warn};

#[derive(Parser)]
#[command(name = "panel-html")]
#[command(about = "Generate panel HTML documents for a bundle's graphics and dashboard entries")]
#[command(version)]
struct Cli {
  /// Bundle directory containing panels.config.json
  #[arg(long, default_value = ".", global = true)]
  project: PathBuf,

  /// Explicit configuration file (defaults to <project>/panels.config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Print per-entry resolution details
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
  #[value(alias = "dev")]
  Development,
  #[value(alias = "prod")]
  Production,
}

impl From<ModeArg> for BuildMode {
  fn from(mode: ModeArg) -> Self {
    match mode {
      ModeArg::Development => BuildMode::Development,
      ModeArg::Production => BuildMode::Production,
    }
  }
}

#[derive(clap::Args)]
struct ServerArgs {
  /// Dev server host
  #[arg(long)]
  host: Option<String>,
  /// Dev server port
  #[arg(long)]
  port: Option<u16>,
  /// Dev server uses TLS
  #[arg(long)]
  https: bool,
  /// Override the bundle name used in URLs
  #[arg(long)]
  bundle_name: Option<String>,
}

#[derive(Subcommand)]
enum Command {
  /// Resolve and write every panel document
  Generate {
    /// Which documents to produce
    #[arg(long, value_enum, default_value = "development")]
    mode: ModeArg,
    #[command(flatten)]
    server: ServerArgs,
    /// Also print cargo:rerun-if-changed and cargo:warning lines for build scripts
    #[arg(long)]
    cargo: bool,
    /// Entry files to use instead of discovering them
    inputs: Vec<PathBuf>,
  },
  /// Show which template and output path each entry maps to, without writing anything
  Plan {
    /// Print the plan as JSON instead of log lines
    #[arg(long)]
    json: bool,
    /// Entry files to use instead of discovering them
    inputs: Vec<PathBuf>,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  logger::set_verbose(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      warn!("error"; "{err:#}");
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let config = match &cli.config {
    Some(path) => ProjectConfig::from_path(path)?,
    None => ProjectConfig::discover(&cli.project)?,
  };

  match cli.command {
    Command::Generate {
      mode,
      server,
      cargo,
      inputs,
    } => generate(&cli.project, apply_overrides(config, server), mode.into(), cargo, &inputs),
    Command::Plan { json, inputs } => plan(&cli.project, config, json, &inputs),
  }
}

fn apply_overrides(mut config: ProjectConfig, server: ServerArgs) -> ProjectConfig {
  if let Some(host) = server.host {
    config.server.host = host;
  }
  if let Some(port) = server.port {
    config.server.port = port;
  }
  if server.https {
    config.server.https = true;
  }
  if server.bundle_name.is_some() {
    config.bundle_name = server.bundle_name;
  }
  config
}

fn generate(
  project: &Path,
  config: ProjectConfig,
  mode: BuildMode,
  cargo: bool,
  explicit: &[PathBuf],
) -> Result<()> {
  let context = BuildContext::new(project, config);
  let builder = PanelBuilder::new(context).context("failed to prepare panel templates")?;
  let inputs = builder.collect_inputs(explicit)?;
  report(&inputs.diagnostics, cargo);

  let module = match mode {
    BuildMode::Development => "dev",
    BuildMode::Production => "build",
  };
  debug!(module; "resolving {} entries for bundle `{}`", inputs.files.len(), builder.context().bundle_name);

  match builder.run(mode, &inputs.files) {
    PassOutcome::Completed(summary) => {
      report(&summary.diagnostics, cargo);
      print_summary(module, &summary);
    }
    PassOutcome::Skipped(err) => {
      warn!(module; "{err}; HTML files won't be generated");
      if cargo {
        println!("cargo:warning={err}; HTML files won't be generated");
      }
    }
  }

  if cargo {
    for path in builder.rerun_paths() {
      println!("cargo:rerun-if-changed={}", path.display());
    }
  }
  Ok(())
}

fn plan(project: &Path, config: ProjectConfig, json: bool, explicit: &[PathBuf]) -> Result<()> {
  let builder = PanelBuilder::new(BuildContext::new(project, config))?;
  let inputs = builder.collect_inputs(explicit)?;
  report(&inputs.diagnostics, false);

  let entries = builder.plan(&inputs.files);
  if json {
    let rendered = serde_json::to_string_pretty(&entries).context("failed to serialise plan")?;
    println!("{rendered}");
    return Ok(());
  }

  for entry in &entries {
    let kind = entry
      .input
      .kind
      .map(|kind| kind.to_string())
      .unwrap_or_else(|| "other".to_string());
    match (&entry.template, &entry.output) {
      (Some(template), Some(output)) => {
        log!("plan"; "[{kind}] {} -> {} (template {template})", entry.input.key, output.display());
      }
      _ => log!("plan"; "[{kind}] {} -> unmatched", entry.input.key),
    }
  }
  Ok(())
}

fn report(diagnostics: &[Diagnostic], cargo: bool) {
  for diagnostic in diagnostics {
    warn!("warn"; "{diagnostic}");
  }
  if cargo {
    emit_cargo_warnings(diagnostics);
  }
}

fn print_summary(module: &str, summary: &PassSummary) {
  for path in &summary.written {
    debug!(module; "wrote {}", path.display());
  }
  for path in &summary.removed {
    debug!(module; "removed stale {}", path.display());
  }
  log!(module; "generated {} {} document(s)", summary.written.len(), summary.mode);
}
