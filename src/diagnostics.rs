//! Recoverable problems found during a pass, reported without stopping it.

use std::path::PathBuf;

use thiserror::Error;

use crate::output::OutputError;

/// A recoverable, attributable problem.
#[derive(Debug, Error)]
pub enum Diagnostic {
  /// No template rule matches the input; it produces no document.
  #[error("no template matches `{input}`; skipping it")]
  UnmatchedInput {
    /// Input key.
    input: String,
  },
  /// An explicitly named input does not exist.
  #[error("`{input}` does not exist; skipping it")]
  MissingInput {
    /// Input path as given.
    input: String,
  },
  /// An explicitly named input is a type declaration artifact, not an entry.
  #[error("`{input}` is a declaration file; skipping it")]
  DeclarationInput {
    /// Input path as given.
    input: String,
  },
  /// The input lies outside the configured source root.
  #[error("`{input}` is outside the source root `{source_root}`; skipping it")]
  OutsideSourceRoot {
    /// Input path.
    input: String,
    /// Configured source root.
    source_root: String,
  },
  /// Production manifest has no chunk for the input.
  #[error("`{input}` has no entry in the build manifest; skipping it")]
  MissingManifestEntry {
    /// Input key.
    input: String,
  },
  /// An imported chunk key is not defined in the manifest.
  #[error("`{input}` imports `{import}`, which the build manifest does not define")]
  MissingImport {
    /// Input key.
    input: String,
    /// Undefined import key.
    import: String,
  },
  /// Two inputs derive the same output path; the later one is skipped.
  #[error("`{input}` would overwrite {path} already generated for `{owner}`; skipping it")]
  OutputCollision {
    /// Input that lost the claim.
    input: String,
    /// Input that owns the path.
    owner: String,
    /// Contested output path.
    path: PathBuf,
  },
  /// A document could not be written.
  #[error(transparent)]
  WriteFailed(#[from] OutputError),
  /// Stale documents could not be pruned.
  #[error("failed to prune stale documents: {0}")]
  PruneFailed(#[source] std::io::Error),
}

/// Print diagnostics as `cargo:warning=` lines for consumption from a build script.
pub fn emit_cargo_warnings(diagnostics: &[Diagnostic]) {
  for diagnostic in diagnostics {
    println!("cargo:warning={diagnostic}");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_name_the_input() {
    let unmatched = Diagnostic::UnmatchedInput {
      input: "src/extension/index.js".into(),
    };
    assert!(unmatched.to_string().contains("src/extension/index.js"));

    let collision = Diagnostic::OutputCollision {
      input: "src/graphics/main.ts".into(),
      owner: "src/graphics/main.js".into(),
      path: PathBuf::from("graphics/main.html"),
    };
    let message = collision.to_string();
    assert!(message.contains("src/graphics/main.ts"));
    assert!(message.contains("graphics/main.html"));
    assert!(message.contains("src/graphics/main.js"));
  }
}
