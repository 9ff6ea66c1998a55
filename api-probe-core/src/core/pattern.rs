// api-probe-core/src/core/pattern.rs
// ============================================================================
// Module: Endpoint Glob Patterns
// Description: Glob-style filters for endpoint inclusion and exclusion.
// Purpose: Compile operator-supplied path globs into anchored matchers.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Filter patterns use a small glob dialect: `*` matches any run of
//! characters (`.*`) and `{name}` matches one path segment (`[^/]+`). This is
//! deliberately a different algorithm from template matching in the catalog;
//! the two must not be conflated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use regex::Regex;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pattern compilation errors.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A `{` placeholder was never closed.
    #[error("unclosed placeholder in pattern: {0}")]
    UnclosedPlaceholder(String),
    /// The derived regular expression failed to compile.
    #[error("pattern {pattern} failed to compile: {reason}")]
    Compile {
        /// Original glob pattern.
        pattern: String,
        /// Regex compiler diagnostic.
        reason: String,
    },
}

// ============================================================================
// SECTION: Endpoint Pattern
// ============================================================================

/// Compiled endpoint glob pattern.
#[derive(Debug, Clone)]
pub struct EndpointPattern {
    /// Original glob text.
    raw: String,
    /// Compiled anchored matcher.
    regex: Regex,
}

impl EndpointPattern {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when a placeholder is unclosed or the derived
    /// expression fails to compile.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut expression = String::with_capacity(pattern.len() + 8);
        expression.push('^');
        let mut chars = pattern.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '*' => expression.push_str(".*"),
                '{' => {
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(PatternError::UnclosedPlaceholder(pattern.to_string()));
                    }
                    expression.push_str("[^/]+");
                }
                other => expression.push_str(&regex::escape(&other.to_string())),
            }
        }
        expression.push('$');
        let regex = Regex::new(&expression).map_err(|err| PatternError::Compile {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Returns true when the concrete path matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns the original glob text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for EndpointPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
