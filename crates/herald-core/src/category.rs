//! Category patterns and the matcher that evaluates a message category
//! against a subscription's pattern set.
//!
//! Patterns use SQL `LIKE` wildcards: `%` matches any run of characters
//! (including none) and `_` matches exactly one character. Every other
//! character, including `\`, matches itself. Matching is case-sensitive.

use serde::{Deserialize, Serialize};

// ─── Pattern ─────────────────────────────────────────────────────────────────

/// One stored matching rule owned by a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryPattern {
  pub pattern:      String,
  /// When set, the rule holds for categories that do *not* match `pattern`.
  #[serde(default)]
  pub is_exception: bool,
}

impl CategoryPattern {
  /// A rule that holds when the category matches `pattern`.
  pub fn include(pattern: impl Into<String>) -> Self {
    Self { pattern: pattern.into(), is_exception: false }
  }

  /// A rule that holds when the category does not match `pattern`.
  pub fn exception(pattern: impl Into<String>) -> Self {
    Self { pattern: pattern.into(), is_exception: true }
  }

  /// Evaluate this rule on its own.
  pub fn evaluate(&self, category: &str) -> bool {
    like(category, &self.pattern) != self.is_exception
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// How exception patterns combine with the rest of a pattern set.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionPolicy {
  /// Every pattern is an independent alternative and the results are
  /// OR-combined. An exception pattern never vetoes a direct match; it only
  /// adds "everything except X" as another way to match.
  #[default]
  Alternative,
  /// Direct patterns are OR-combined (an absent direct set admits
  /// everything), then any exception pattern whose wildcard matches the
  /// category excludes it.
  Veto,
}

// ─── Matching ────────────────────────────────────────────────────────────────

/// `LIKE`-style wildcard test of `candidate` against `pattern`.
///
/// An empty pattern matches only the empty candidate.
pub fn like(candidate: &str, pattern: &str) -> bool {
  let text: Vec<char> = candidate.chars().collect();
  let pat: Vec<char> = pattern.chars().collect();

  let (mut t, mut p) = (0, 0);
  // Position of the last `%` seen and the text offset it currently absorbs up to.
  let mut backtrack: Option<(usize, usize)> = None;

  while t < text.len() {
    match pat.get(p) {
      Some('%') => {
        backtrack = Some((p, t));
        p += 1;
      }
      Some(&c) if c == '_' || c == text[t] => {
        p += 1;
        t += 1;
      }
      _ => match backtrack {
        Some((star, absorbed)) => {
          p = star + 1;
          t = absorbed + 1;
          backtrack = Some((star, absorbed + 1));
        }
        None => return false,
      },
    }
  }

  pat[p..].iter().all(|&c| c == '%')
}

/// Whether `category` satisfies the pattern set `patterns` under `policy`.
///
/// A subscription with no patterns places no constraint on categories.
pub fn matches(
  category: &str,
  patterns: &[CategoryPattern],
  policy: ExceptionPolicy,
) -> bool {
  if patterns.is_empty() {
    return true;
  }

  match policy {
    ExceptionPolicy::Alternative => {
      patterns.iter().any(|p| p.evaluate(category))
    }
    ExceptionPolicy::Veto => {
      let (exceptions, direct): (Vec<_>, Vec<_>) =
        patterns.iter().partition(|p| p.is_exception);
      let admitted =
        direct.is_empty() || direct.iter().any(|p| like(category, &p.pattern));
      admitted && !exceptions.iter().any(|p| like(category, &p.pattern))
    }
  }
}
