//! Ordered glob rules choosing which template renders each entry.

use crate::models::TemplateId;
use crate::pattern::{GlobPattern, PatternError};

/// Trait describing how entries are matched to templates.
pub trait TemplateSelector {
  /// Template for an entry path relative to the source root, or `None` when unmatched.
  fn template_for(&self, relative_input: &str) -> Option<&TemplateId>;
}

/// One `(pattern, template)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRule {
  /// Compiled pattern, relative to the source root.
  pub pattern: GlobPattern,
  /// Template the pattern maps to.
  pub template: TemplateId,
}

/// Template rules in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateRules {
  rules: Vec<TemplateRule>,
}

impl TemplateRules {
  /// Compile `(pattern, template)` pairs, keeping their order.
  pub fn compile<I, P, T>(pairs: I) -> Result<Self, PatternError>
  where
    I: IntoIterator<Item = (P, T)>,
    P: AsRef<str>,
    T: AsRef<str>,
  {
    let rules = pairs
      .into_iter()
      .map(|(pattern, template)| {
        Ok(TemplateRule {
          pattern: GlobPattern::new(pattern.as_ref())?,
          template: TemplateId::from(template.as_ref()),
        })
      })
      .collect::<Result<Vec<_>, PatternError>>()?;

    Ok(Self { rules })
  }

  /// Rules in declaration order.
  pub fn rules(&self) -> &[TemplateRule] {
    &self.rules
  }

  /// Distinct template identifiers in the order they are first referenced.
  pub fn template_ids(&self) -> Vec<&TemplateId> {
    let mut ids: Vec<&TemplateId> = Vec::new();
    for rule in &self.rules {
      if !ids.contains(&&rule.template) {
        ids.push(&rule.template);
      }
    }
    ids
  }

  /// Returns true when no rules are configured.
  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

impl TemplateSelector for TemplateRules {
  fn template_for(&self, relative_input: &str) -> Option<&TemplateId> {
    select_template(relative_input, &self.rules)
  }
}

/// Return the template of the first rule whose pattern matches `relative_input`.
///
/// Later rules are never consulted once one matches, however specific they are.
pub fn select_template<'r>(relative_input: &str, rules: &'r [TemplateRule]) -> Option<&'r TemplateId> {
  rules
    .iter()
    .find(|rule| rule.pattern.is_match(relative_input))
    .map(|rule| &rule.template)
}
