//! Depth-first walk over the chunk import graph collecting stylesheets.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::models::{ManifestChunk, ManifestGraph};

/// Failure to resolve an entry against the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  /// The entry key has no chunk in the manifest.
  #[error("entry `{entry}` is not present in the build manifest")]
  MissingEntry {
    /// Entry key that was looked up.
    entry: String,
  },
}

/// Stylesheets reachable from an entry chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleClosure<'g> {
  /// The entry chunk itself.
  pub entry: Option<&'g ManifestChunk>,
  /// Every distinct stylesheet path, in depth-first pre-order.
  pub stylesheets: Vec<&'g str>,
  /// Import keys that have no chunk in the manifest, in discovery order.
  pub missing_imports: Vec<&'g str>,
}

/// Traversal bookkeeping threaded through the walk.
#[derive(Debug, Default)]
struct TraversalState<'g> {
  visited_chunks: BTreeSet<&'g str>,
  emitted_styles: BTreeSet<&'g str>,
  missing: BTreeSet<&'g str>,
}

/// Collect the stylesheets of `entry` and every chunk it transitively imports.
///
/// Chunks are visited depth-first in `imports` declaration order. A stylesheet path is
/// emitted the first time it is seen anywhere in the walk, and each chunk is expanded at
/// most once, so cyclic graphs terminate.
pub fn collect_stylesheets<'g>(
  graph: &'g ManifestGraph,
  entry: &str,
) -> Result<StyleClosure<'g>, ResolveError> {
  let (entry_key, entry_chunk) =
    graph
      .get_key_value(entry)
      .ok_or_else(|| ResolveError::MissingEntry {
        entry: entry.to_string(),
      })?;

  let mut state = TraversalState::default();
  let mut closure = StyleClosure {
    entry: Some(entry_chunk),
    ..StyleClosure::default()
  };
  let mut pending: Vec<&'g str> = vec![entry_key.as_str()];

  while let Some(key) = pending.pop() {
    if !state.visited_chunks.insert(key) {
      continue;
    }

    let Some(chunk) = graph.get(key) else {
      if state.missing.insert(key) {
        closure.missing_imports.push(key);
      }
      continue;
    };

    for stylesheet in &chunk.css {
      if state.emitted_styles.insert(stylesheet.as_str()) {
        closure.stylesheets.push(stylesheet.as_str());
      }
    }

    // Reversed so the first declared import is expanded first.
    pending.extend(
      chunk
        .imports
        .iter()
        .rev()
        .map(String::as_str)
        .filter(|import| !state.visited_chunks.contains(import)),
    );
  }

  Ok(closure)
}
