use std::fmt;

/// Failure reported by the expression engine.
///
/// Resolution errors are never retried by the gallery engine: they abort the
/// operation that triggered the evaluation and leave prior state in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionError {
    MissingVariable {
        name: String,
    },
    Evaluation {
        expression: String,
        reason: String,
    },
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl ResolutionError {
    pub fn missing_variable(name: impl Into<String>) -> Self {
        ResolutionError::MissingVariable { name: name.into() }
    }

    pub fn evaluation(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolutionError::Evaluation {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        ResolutionError::TypeMismatch { expected, found }
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::MissingVariable { name } => {
                write!(f, "variable '{name}' is missing")
            }
            ResolutionError::Evaluation { expression, reason } => {
                write!(f, "failed to evaluate [{expression}]: {reason}")
            }
            ResolutionError::TypeMismatch { expected, found } => {
                write!(f, "type mismatch; expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for ResolutionError {}
