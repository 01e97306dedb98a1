mod error;
mod limits;
mod node;
mod record;
mod rule;
pub(crate) mod value;
mod verdict;

pub use error::{Malformed, Paren, RuleError};
pub use limits::{Limits, DEFAULT_MAX_DEPTH};
pub use node::{field, FieldExpr, LogicCounts, Node, Operator};
pub use record::Record;
pub use rule::Rule;
pub use value::Value;
pub use verdict::Verdict;
