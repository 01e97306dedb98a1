mod builder;
mod lexer;
mod token;

pub use builder::build;
pub use lexer::tokenize;
pub use token::Token;

use crate::{Limits, Node, RuleError};

/// Tokenize and build `text` into a tree with default [`Limits`].
///
/// # Errors
///
/// Returns [`RuleError`] if the text is empty, contains an unrecognized
/// character sequence, or does not form a single well-formed expression.
pub fn parse(text: &str) -> Result<Node, RuleError> {
    parse_with_limits(text, &Limits::default())
}

/// Tokenize and build `text` into a tree.
///
/// # Errors
///
/// See [`parse`]; additionally fails with [`RuleError::TooDeeplyNested`] past
/// `limits.max_depth`.
pub fn parse_with_limits(text: &str, limits: &Limits) -> Result<Node, RuleError> {
    let tokens = tokenize(text)?;
    build(&tokens, limits)
}
