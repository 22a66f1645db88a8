//! Error types for the typing and parametrization pipeline.
//!
//! Failures are data problems (a rule table that cannot type an environment, a
//! parameter table without an entry), never transient conditions, so nothing is
//! retried. Each error carries the atom indices, rule identifiers, or term type
//! tuples needed to fix the force-field data.

use crate::model::graph::GraphError;
use crate::model::topology::UnparametrizedTerm;
use crate::model::types::Element;
use thiserror::Error;

/// Per-atom typing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypingError {
    /// No rule for the atom's element matches its environment.
    #[error("no typing rule matches atom {atom} ({element})")]
    NoMatchingRule { atom: usize, element: Element },

    /// More than one rule survives override reduction.
    #[error("ambiguous type for atom {atom} ({element}): rules {} all match and none overrides the others", .candidates.join(", "))]
    AmbiguousType {
        atom: usize,
        element: Element,
        candidates: Vec<String>,
    },
}

impl TypingError {
    pub fn atom(&self) -> usize {
        match self {
            TypingError::NoMatchingRule { atom, .. } | TypingError::AmbiguousType { atom, .. } => {
                *atom
            }
        }
    }
}

/// Per-term parametrization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParametrizationError {
    #[error("missing parameters for {0}")]
    MissingParameter(UnparametrizedTerm),

    #[error("atom {atom} has no assigned type")]
    UntypedAtom { atom: usize },
}

/// Errors that can occur while typing or parametrizing a structure.
#[derive(Debug, Error)]
pub enum Error {
    /// The input structure violates graph invariants.
    #[error("malformed molecular graph: {0}")]
    MalformedGraph(#[from] GraphError),

    /// The graph already carries assigned types.
    #[error("graph is already typed; assigned types are committed once")]
    AlreadyTyped,

    /// One or more atoms could not be typed.
    #[error("atom typing failed for {} atom(s): {}", .0.len(), summarize(.0))]
    Typing(Vec<TypingError>),

    /// One or more terms could not be parametrized.
    #[error("parametrization failed for {} term(s): {}", .0.len(), summarize(.0))]
    Parametrization(Vec<ParametrizationError>),

    /// The caller's cancellation flag was raised.
    #[error("run cancelled by caller")]
    Cancelled,
}

const SUMMARY_LIMIT: usize = 3;

fn summarize<E: ToString>(errors: &[E]) -> String {
    let mut parts: Vec<String> = errors.iter().take(SUMMARY_LIMIT).map(ToString::to_string).collect();
    if errors.len() > SUMMARY_LIMIT {
        parts.push(format!("and {} more", errors.len() - SUMMARY_LIMIT));
    }
    parts.join("; ")
}

impl Error {
    /// Typing errors carried by this error, if any.
    pub fn typing_errors(&self) -> &[TypingError] {
        match self {
            Error::Typing(errors) => errors,
            _ => &[],
        }
    }

    /// Parametrization errors carried by this error, if any.
    pub fn parametrization_errors(&self) -> &[ParametrizationError] {
        match self {
            Error::Parametrization(errors) => errors,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topology::TermKind;

    #[test]
    fn typing_error_messages_name_the_atom() {
        let err = TypingError::NoMatchingRule {
            atom: 4,
            element: Element::Cl,
        };
        assert_eq!(err.to_string(), "no typing rule matches atom 4 (Cl)");
        assert_eq!(err.atom(), 4);

        let err = TypingError::AmbiguousType {
            atom: 2,
            element: Element::C,
            candidates: vec!["c2".into(), "cx".into()],
        };
        assert!(err.to_string().contains("rules c2, cx"));
    }

    #[test]
    fn summary_is_truncated() {
        let errors: Vec<TypingError> = (0..5)
            .map(|atom| TypingError::NoMatchingRule {
                atom,
                element: Element::H,
            })
            .collect();
        let msg = Error::Typing(errors).to_string();
        assert!(msg.starts_with("atom typing failed for 5 atom(s)"));
        assert!(msg.ends_with("and 2 more"));
    }

    #[test]
    fn missing_parameter_message_includes_types() {
        let err = ParametrizationError::MissingParameter(UnparametrizedTerm {
            kind: TermKind::Bond,
            atoms: vec![0, 1],
            types: vec!["c3".into(), "cl".into()],
        });
        assert_eq!(err.to_string(), "missing parameters for bond 0-1 with types c3-cl");
    }
}
