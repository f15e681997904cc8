use regex::Regex;

fn declaration_patterns() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"(?i)\.d\.[cm]?tsx?$").expect("invalid declaration regex"),
                Regex::new(r"(?i)\.d\.[a-z0-9]+\.ts$").expect("invalid declaration regex"),
            ]
        })
        .as_slice()
}

/// Determine whether a discovered file is a type declaration artifact rather than an entry.
///
/// Declaration files match the same extension globs as real entries but never produce a
/// bundle chunk, so they are dropped before template selection.
pub fn is_declaration_file(path: &str) -> bool {
    declaration_patterns()
        .iter()
        .any(|pattern| pattern.is_match(path))
}
