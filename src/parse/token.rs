use std::fmt;

use crate::Operator;

/// A lexical unit of rule text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An identifier, number, or single-quoted literal (quotes kept).
    Operand(String),
    Operator(Operator),
    LeftParen,
    RightParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Operand(text) => f.write_str(text),
            Token::Operator(op) => write!(f, "{op}"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
        }
    }
}
