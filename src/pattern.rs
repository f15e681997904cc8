//! Shell-style glob patterns compiled into anchored regular expressions.
//!
//! Patterns understand `*` (within one path segment), `**` (any number of segments), `?`,
//! bracket classes such as `[a-z]` or `[!_]`, nested brace groups like `{js,ts}` and `\`
//! escapes. Matching is purely textual; nothing here touches the filesystem.

use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Errors raised while compiling a glob pattern.
#[derive(Debug, Error)]
pub enum PatternError {
  /// A brace group or bracket class was opened or closed without its partner.
  #[error("unbalanced `{delimiter}` in pattern `{pattern}`")]
  Unbalanced {
    /// Pattern as written in the configuration.
    pattern: String,
    /// Delimiter missing its partner.
    delimiter: char,
  },
  /// The pattern ended with a lone `\`.
  #[error("pattern `{pattern}` ends with a dangling escape")]
  DanglingEscape {
    /// Pattern as written in the configuration.
    pattern: String,
  },
  /// The translated expression was rejected by the regex engine.
  #[error("pattern `{pattern}` could not be compiled: {source}")]
  Regex {
    /// Pattern as written in the configuration.
    pattern: String,
    /// Underlying regex error.
    #[source]
    source: regex::Error,
  },
}

/// A compiled glob pattern.
#[derive(Clone)]
pub struct GlobPattern {
  source: String,
  regex: Regex,
}

impl GlobPattern {
  /// Compile `pattern`. A leading `./` is ignored.
  pub fn new(pattern: &str) -> Result<Self, PatternError> {
    let source = strip_current_dir(pattern).to_string();
    let body = translate(&source)?;
    let regex = Regex::new(&format!("^{body}$")).map_err(|source_err| PatternError::Regex {
      pattern: pattern.to_string(),
      source: source_err,
    })?;

    Ok(Self { source, regex })
  }

  /// Test a relative path against the pattern.
  ///
  /// Backslashes are treated as separators and a leading `./` is ignored, so discovery
  /// results from any platform compare equal.
  pub fn is_match(&self, path: &str) -> bool {
    self.regex.is_match(&normalise_path(path))
  }

  /// The pattern text this matcher was compiled from.
  pub fn as_str(&self) -> &str {
    &self.source
  }
}

impl fmt::Debug for GlobPattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("GlobPattern").field(&self.source).finish()
  }
}

impl PartialEq for GlobPattern {
  fn eq(&self, other: &Self) -> bool {
    self.source == other.source
  }
}

/// Convert a path into the forward-slash form used for matching and manifest keys.
pub fn normalise_path(path: &str) -> String {
  strip_current_dir(&path.replace('\\', "/")).to_string()
}

fn strip_current_dir(value: &str) -> &str {
  let mut trimmed = value;
  while let Some(rest) = trimmed.strip_prefix("./") {
    trimmed = rest;
  }
  trimmed
}

fn translate(pattern: &str) -> Result<String, PatternError> {
  let chars: Vec<char> = pattern.chars().collect();
  let mut out = String::with_capacity(pattern.len() * 2);
  let mut brace_depth = 0usize;
  let mut i = 0;

  while i < chars.len() {
    match chars[i] {
      '*' => {
        let mut end = i;
        while chars.get(end) == Some(&'*') {
          end += 1;
        }
        let starts_segment = i == 0
          || chars[i - 1] == '/'
          || (brace_depth > 0 && matches!(chars[i - 1], '{' | ','));
        let ends_segment = end == chars.len()
          || (brace_depth > 0 && matches!(chars.get(end), Some(',') | Some('}')));

        if end - i >= 2 && starts_segment && chars.get(end) == Some(&'/') {
          out.push_str("(?:[^/]*/)*");
          i = end + 1;
          continue;
        }
        if end - i >= 2 && starts_segment && ends_segment {
          out.push_str(".*");
          i = end;
          continue;
        }

        out.push_str("[^/]*");
        i = end;
        continue;
      }
      '?' => out.push_str("[^/]"),
      '[' => {
        let (class, next) = translate_class(pattern, &chars, i)?;
        out.push_str(&class);
        i = next;
        continue;
      }
      '{' => {
        brace_depth += 1;
        out.push_str("(?:");
      }
      ',' if brace_depth > 0 => out.push('|'),
      '}' if brace_depth > 0 => {
        brace_depth -= 1;
        out.push(')');
      }
      '}' => {
        return Err(PatternError::Unbalanced {
          pattern: pattern.to_string(),
          delimiter: '}',
        });
      }
      '\\' => {
        let Some(escaped) = chars.get(i + 1) else {
          return Err(PatternError::DanglingEscape {
            pattern: pattern.to_string(),
          });
        };
        out.push_str(&regex::escape(&escaped.to_string()));
        i += 2;
        continue;
      }
      other => out.push_str(&regex::escape(&other.to_string())),
    }
    i += 1;
  }

  if brace_depth > 0 {
    return Err(PatternError::Unbalanced {
      pattern: pattern.to_string(),
      delimiter: '{',
    });
  }

  Ok(out)
}

/// Translate a bracket class starting at `start`, returning the regex class and the index
/// just past the closing `]`.
fn translate_class(
  pattern: &str,
  chars: &[char],
  start: usize,
) -> Result<(String, usize), PatternError> {
  let mut i = start + 1;
  let negated = matches!(chars.get(i), Some('!') | Some('^'));
  if negated {
    i += 1;
  }

  let mut members = String::new();
  let mut first = true;
  loop {
    let Some(&c) = chars.get(i) else {
      return Err(PatternError::Unbalanced {
        pattern: pattern.to_string(),
        delimiter: '[',
      });
    };
    if c == ']' && !first {
      break;
    }
    if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') {
      members.push('\\');
    }
    members.push(c);
    first = false;
    i += 1;
  }

  // Classes never match a separator, negated or not.
  let class = if negated {
    format!("[^/{members}]")
  } else {
    format!("[[{members}]&&[^/]]")
  };
  Ok((class, i + 1))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn glob(pattern: &str) -> GlobPattern {
    GlobPattern::new(pattern).expect("pattern should compile")
  }

  #[test]
  fn single_star_stays_within_a_segment() {
    let pattern = glob("graphics/*.js");
    assert!(pattern.is_match("graphics/special.js"));
    assert!(!pattern.is_match("graphics/nested/special.js"));
    assert!(!pattern.is_match("dashboard/special.js"));
  }

  #[test]
  fn double_star_spans_zero_or_more_directories() {
    let pattern = glob("graphics/**/*.js");
    assert!(pattern.is_match("graphics/main.js"));
    assert!(pattern.is_match("graphics/a/b/c/main.js"));
    assert!(!pattern.is_match("graphicsmain.js"));
  }

  #[test]
  fn trailing_double_star_matches_everything_below() {
    let pattern = glob("dashboard/**");
    assert!(pattern.is_match("dashboard/panel/main.ts"));
    assert!(!pattern.is_match("graphics/panel/main.ts"));
  }

  #[test]
  fn brace_groups_expand_alternatives() {
    let pattern = glob("{graphics,dashboard}/*/main.{js,ts{,x}}");
    assert!(pattern.is_match("graphics/clock/main.js"));
    assert!(pattern.is_match("dashboard/controls/main.tsx"));
    assert!(pattern.is_match("dashboard/controls/main.ts"));
    assert!(!pattern.is_match("extension/controls/main.ts"));
  }

  #[test]
  fn classes_and_question_marks() {
    let pattern = glob("graphics/panel-[0-9]?.js");
    assert!(pattern.is_match("graphics/panel-1a.js"));
    assert!(!pattern.is_match("graphics/panel-xa.js"));

    let negated = glob("graphics/[!_]*.js");
    assert!(negated.is_match("graphics/main.js"));
    assert!(!negated.is_match("graphics/_partial.js"));
  }

  #[test]
  fn double_star_inside_brace_groups_spans_directories() {
    let pattern = glob("graphics/{**/main,index}.js");
    assert!(pattern.is_match("graphics/main.js"));
    assert!(pattern.is_match("graphics/clock/face/main.js"));
    assert!(pattern.is_match("graphics/index.js"));
    assert!(!pattern.is_match("graphics/clock/index.js"));

    let trailing = glob("{dashboard/**,graphics/*.js}");
    assert!(trailing.is_match("dashboard/controls/main.ts"));
    assert!(!trailing.is_match("graphics/clock/main.js"));
  }

  #[test]
  fn classes_never_match_a_separator() {
    let pattern = glob("graphics[/_]main.js");
    assert!(pattern.is_match("graphics_main.js"));
    assert!(!pattern.is_match("graphics/main.js"));
  }

  #[test]
  fn literal_dots_are_not_wildcards() {
    let pattern = glob("graphics/main.js");
    assert!(!pattern.is_match("graphics/mainXjs"));
  }

  #[test]
  fn escapes_make_metacharacters_literal() {
    let pattern = glob(r"graphics/\*.js");
    assert!(pattern.is_match("graphics/*.js"));
    assert!(!pattern.is_match("graphics/main.js"));
  }

  #[test]
  fn normalises_leading_current_dir_and_backslashes() {
    let pattern = glob("./graphics/*/main.js");
    assert_eq!(pattern.as_str(), "graphics/*/main.js");
    assert!(pattern.is_match("./graphics/clock/main.js"));
    assert!(pattern.is_match(r"graphics\clock\main.js"));
  }

  #[test]
  fn rejects_unbalanced_delimiters() {
    assert!(matches!(
      GlobPattern::new("graphics/{a,b.js"),
      Err(PatternError::Unbalanced { delimiter: '{', .. })
    ));
    assert!(matches!(
      GlobPattern::new("graphics/a}.js"),
      Err(PatternError::Unbalanced { delimiter: '}', .. })
    ));
    assert!(matches!(
      GlobPattern::new("graphics/[ab.js"),
      Err(PatternError::Unbalanced { delimiter: '[', .. })
    ));
    assert!(matches!(
      GlobPattern::new("graphics\\"),
      Err(PatternError::DanglingEscape { .. })
    ));
  }
}
