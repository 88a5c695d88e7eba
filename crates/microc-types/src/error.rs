use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What a validation failure is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticErrorKind {
    /// A keyword or operator token used as an identifier.
    ReservedName,
    /// The same variable declared twice in one block.
    DuplicateVariable,
    /// The same parameter name listed twice.
    DuplicateParameter,
    /// A local in a function body reusing one of its parameter names.
    ParameterCollision,
}

impl SemanticErrorKind {
    pub fn message(self) -> &'static str {
        match self {
            Self::ReservedName => "invalid name",
            Self::DuplicateVariable => "duplicate variable in block",
            Self::DuplicateParameter => "duplicate parameter",
            Self::ParameterCollision => "variable collides with parameter",
        }
    }
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A static error found by the validation pass, before any evaluation.
///
/// Always names the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("semantic error: {kind} '{token}'")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub token: String,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, token: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
        }
    }

    pub fn reserved_name(token: impl Into<String>) -> Self {
        Self::new(SemanticErrorKind::ReservedName, token)
    }

    pub fn duplicate_variable(token: impl Into<String>) -> Self {
        Self::new(SemanticErrorKind::DuplicateVariable, token)
    }

    pub fn duplicate_parameter(token: impl Into<String>) -> Self {
        Self::new(SemanticErrorKind::DuplicateParameter, token)
    }

    pub fn parameter_collision(token: impl Into<String>) -> Self {
        Self::new(SemanticErrorKind::ParameterCollision, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_error_display_names_token() {
        let err = SemanticError::reserved_name("if");
        assert_eq!(err.to_string(), "semantic error: invalid name 'if'");
    }

    #[test]
    fn test_semantic_error_json_serialization() {
        let err = SemanticError::duplicate_parameter("a");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"kind":"duplicate_parameter","token":"a"}"#);

        let back: SemanticError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_kind_messages_are_distinct() {
        let kinds = [
            SemanticErrorKind::ReservedName,
            SemanticErrorKind::DuplicateVariable,
            SemanticErrorKind::DuplicateParameter,
            SemanticErrorKind::ParameterCollision,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.message(), b.message());
            }
        }
    }
}
