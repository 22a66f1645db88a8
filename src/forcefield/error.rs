//! Errors raised while assembling a force field from its definition.
//!
//! Every variant points at a bug in the force-field data itself, never at a
//! runtime condition: they surface when a rule table or parameter table is
//! built, before any structure is typed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("rule '{0}' is defined more than once")]
    DuplicateRule(String),

    #[error("invalid pattern in rule '{rule}': {detail}")]
    InvalidPattern { rule: String, detail: String },

    #[error("rule '{rule}' overrides unknown rule '{target}'")]
    UnknownOverride { rule: String, target: String },

    #[error("rule '{0}' overrides itself")]
    SelfOverride(String),

    #[error("rules '{a}' and '{b}' override each other")]
    OverrideNotAntisymmetric { a: String, b: String },

    #[error("override relation contains a cycle through rule '{0}'")]
    OverrideCycle(String),

    #[error("invalid {kind} parameter entry {key}: {detail}")]
    InvalidParameter {
        kind: &'static str,
        key: String,
        detail: String,
    },
}

impl Error {
    pub fn invalid_pattern(rule: &str, detail: impl Into<String>) -> Self {
        Self::InvalidPattern {
            rule: rule.to_string(),
            detail: detail.into(),
        }
    }

    pub fn invalid_parameter(kind: &'static str, key: &[String], detail: impl Into<String>) -> Self {
        Self::InvalidParameter {
            kind,
            key: key.join("-"),
            detail: detail.into(),
        }
    }
}
