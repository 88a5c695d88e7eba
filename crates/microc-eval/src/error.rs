//! Runtime error types for the MicroC evaluator.

use microc_types::SemanticError;
use std::fmt;
use thiserror::Error;

/// Evaluation error. Every dynamic failure aborts the run.
///
/// Function returns are not errors; they travel as
/// [`Flow::Return`](crate::evaluator::Flow::Return).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Name not bound anywhere in the scope chain.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    /// Operand of the wrong kind for an operator, index or print.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Array index outside `[0, len)`.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    /// Call on something that is not a function.
    #[error("{0} is not a function")]
    NotCallable(String),
    /// Argument count differs from parameter count.
    #[error("function {name} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    /// Division or modulo by zero, integer overflow.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
    /// Integer that is not a Unicode scalar value stored as a char.
    #[error("invalid character code: {0}")]
    InvalidChar(i64),
    /// Call depth exceeded the configured limit.
    #[error("stack overflow: recursion deeper than {depth} calls")]
    StackOverflow { depth: usize },
    /// An array too large to allocate.
    #[error("cannot allocate an array of {len} elements")]
    AllocationFailed { len: usize },
    /// Misuse of the scope chain, e.g. popping the root scope.
    #[error("scope error: {0}")]
    Scope(String),
    /// The tree failed static validation.
    #[error(transparent)]
    Validation(#[from] SemanticError),
}

/// Coarse classification of [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Name,
    Type,
    Index,
    Arity,
    Arithmetic,
    Resource,
    Structure,
    Semantic,
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UndefinedVariable(_) => ErrorKind::Name,
            Self::TypeMismatch(_) | Self::NotCallable(_) | Self::InvalidChar(_) => {
                ErrorKind::Type
            }
            Self::IndexOutOfBounds { .. } => ErrorKind::Index,
            Self::ArityMismatch { .. } => ErrorKind::Arity,
            Self::Arithmetic(_) => ErrorKind::Arithmetic,
            Self::StackOverflow { .. } | Self::AllocationFailed { .. } => ErrorKind::Resource,
            Self::Scope(_) => ErrorKind::Structure,
            Self::Validation(_) => ErrorKind::Semantic,
        }
    }

    pub(crate) fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Type => "type",
            Self::Index => "index",
            Self::Arity => "arity",
            Self::Arithmetic => "arithmetic",
            Self::Resource => "resource",
            Self::Structure => "structure",
            Self::Semantic => "semantic",
        };
        f.write_str(s)
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            EvalError::UndefinedVariable("x".into()).kind(),
            ErrorKind::Name
        );
        assert_eq!(
            EvalError::IndexOutOfBounds { index: -1, len: 3 }.kind(),
            ErrorKind::Index
        );
        assert_eq!(
            EvalError::StackOverflow { depth: 10 }.kind(),
            ErrorKind::Resource
        );
        assert_eq!(
            EvalError::AllocationFailed { len: usize::MAX }.kind(),
            ErrorKind::Resource
        );
        assert_eq!(
            EvalError::from(SemanticError::reserved_name("if")).kind(),
            ErrorKind::Semantic
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EvalError::ArityMismatch {
                name: "f".into(),
                expected: 2,
                got: 1
            }
            .to_string(),
            "function f expects 2 argument(s), got 1"
        );
        assert_eq!(
            EvalError::NotCallable("x".into()).to_string(),
            "x is not a function"
        );
        assert_eq!(
            EvalError::from(SemanticError::reserved_name("if")).to_string(),
            "semantic error: invalid name 'if'"
        );
    }
}
