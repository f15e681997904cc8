//! Helpers for turning bundle-relative paths into the URLs and tags written into documents.
//!
//! Joining, filtering and markup live in separate submodules so each concern can be tested
//! on its own. All of them are pure string functions.

mod filters;
mod join;
mod tags;

pub use filters::is_declaration_file;
pub use join::join_url;
pub use tags::{escape_attribute, module_script_tag, stylesheet_tag};
