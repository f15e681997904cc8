//! Production manifest handling broken into focused submodules for easier testing.

mod loading;
mod traversal;

pub use loading::{ManifestError, load_manifest};
pub use traversal::{ResolveError, StyleClosure, collect_stylesheets};
