use std::fmt;

use thiserror::Error;

/// Which side of a parenthesis pair was left without a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paren {
    /// A `(` was never closed.
    Open,
    /// A `)` appeared without a matching `(`.
    Close,
}

impl fmt::Display for Paren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Paren::Open => write!(f, "unclosed '('"),
            Paren::Close => write!(f, "unexpected ')'"),
        }
    }
}

/// Why an expression, or a request to combine expressions, is structurally unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Malformed {
    #[error("operator '{operator}' is missing an operand")]
    MissingOperand { operator: String },

    #[error("{count} operands are not joined by an operator")]
    DanglingOperands { count: usize },

    #[error("at least two rules are required to combine, got {supplied}")]
    TooFewRules { supplied: usize },

    #[error("invalid tree structure: {0}")]
    InvalidStructure(String),
}

/// Errors raised while tokenizing, building, evaluating, serializing or combining rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("empty expression")]
    EmptyExpression,

    #[error("unmatched parentheses: {0}")]
    UnmatchedParentheses(Paren),

    #[error("invalid token '{found}' at offset {offset}")]
    InvalidToken { offset: usize, found: String },

    #[error("malformed expression: {0}")]
    MalformedExpression(Malformed),

    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),

    #[error("operator '{operator}' needs numeric operands, got '{operand}'")]
    NumericCoercion { operator: String, operand: String },

    #[error("expression too deeply nested (limit {limit})")]
    TooDeeplyNested { limit: usize },
}

impl From<Malformed> for RuleError {
    fn from(reason: Malformed) -> Self {
        RuleError::MalformedExpression(reason)
    }
}
