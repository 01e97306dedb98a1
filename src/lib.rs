//! Parse, evaluate, combine and store boolean rule expressions.
//!
//! Rule text such as `age > 30 AND department = 'Sales'` is tokenized, built
//! into a binary [`Node`] tree, and evaluated against a flat [`Record`]. Trees
//! can be merged with [`combine`], written back with [`to_text`], and stored in
//! the nested JSON shape produced by [`to_structure`].

mod combine;
mod evaluate;
mod parse;
mod serialize;
mod types;

pub mod error;
pub mod service;
#[cfg(feature = "snapshot")]
pub mod snapshot;
pub mod store;

pub use combine::{combine, combine_with_limits, majority_operator};
pub use error::RuleTreeError;
pub use evaluate::{evaluate, evaluate_with_limits};
pub use parse::{build, parse, parse_with_limits, tokenize, Token};
pub use serialize::{
    from_structure, from_structure_with_limits, to_structure, to_structure_with_limits, to_text,
};
pub use service::{NewCombined, RuleService};
pub use store::{
    MemoryRuleStore, NewRule, RuleFields, RuleId, RuleRepository, StoreError, StoredRule,
};
pub use types::{
    field, FieldExpr, Limits, LogicCounts, Malformed, Node, Operator, Paren, Record, Rule,
    RuleError, Value, Verdict, DEFAULT_MAX_DEPTH,
};
