use std::fmt;

use tracing::trace;

use crate::types::value::parse_number;
use crate::{Limits, Node, Operator, Record, RuleError, Value};

/// What a subtree produced: the outcome of an operator, a record value, or a
/// leaf's own text when no record field matched it.
#[derive(Debug, Clone, Copy)]
enum Resolved<'a> {
    Bool(bool),
    Field(&'a Value),
    Literal(&'a str),
}

impl Resolved<'_> {
    fn number(self, op: Operator) -> Result<f64, RuleError> {
        let number = match self {
            Resolved::Bool(_) => None,
            Resolved::Field(value) => value.as_f64(),
            Resolved::Literal(text) => parse_number(text),
        };
        number.ok_or_else(|| RuleError::NumericCoercion {
            operator: op.symbol().to_owned(),
            operand: self.to_string(),
        })
    }

    fn truthy(self) -> bool {
        match self {
            Resolved::Bool(b) => b,
            Resolved::Field(value) => value.is_truthy(),
            Resolved::Literal(text) => !text.is_empty(),
        }
    }
}

impl fmt::Display for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Bool(b) => write!(f, "{b}"),
            Resolved::Field(value) => write!(f, "{value}"),
            Resolved::Literal(text) => f.write_str(text),
        }
    }
}

/// Strip one layer of surrounding single quotes.
fn unquote(text: &str) -> &str {
    text.strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(text)
}

/// Evaluate `node` against `record` with default [`Limits`].
///
/// # Errors
///
/// See [`evaluate_with_limits`].
pub fn evaluate(node: &Node, record: &Record) -> Result<bool, RuleError> {
    evaluate_with_limits(node, record, &Limits::default())
}

/// Evaluate `node` against `record`.
///
/// Leaves whose text is a key of `record` take the record's value; all other
/// leaves stand for themselves. `<`, `>`, `<=` and `>=` compare as `f64`. `=`
/// compares the string forms of both sides after stripping one layer of single
/// quotes, so `'Sales'` equals `Sales`. `AND` and `OR` always evaluate both
/// children before combining them.
///
/// # Errors
///
/// - [`RuleError::NumericCoercion`] when an ordering comparison meets a non-number
/// - [`RuleError::TooDeeplyNested`] when the tree is taller than `limits.max_depth`
pub fn evaluate_with_limits(
    node: &Node,
    record: &Record,
    limits: &Limits,
) -> Result<bool, RuleError> {
    let result = eval_node(node, record, limits.max_depth, 1)?.truthy();
    trace!(result, "evaluated rule tree");
    Ok(result)
}

fn eval_node<'a>(
    node: &'a Node,
    record: &'a Record,
    limit: usize,
    depth: usize,
) -> Result<Resolved<'a>, RuleError> {
    if depth > limit {
        return Err(RuleError::TooDeeplyNested { limit });
    }

    match node {
        Node::Leaf(text) => Ok(match record.get(text) {
            Some(value) => Resolved::Field(value),
            None => Resolved::Literal(text),
        }),
        Node::Binary { op, left, right } => {
            let lhs = eval_node(left, record, limit, depth + 1)?;
            let rhs = eval_node(right, record, limit, depth + 1)?;
            let outcome = match op {
                Operator::And => lhs.truthy() & rhs.truthy(),
                Operator::Or => lhs.truthy() | rhs.truthy(),
                Operator::Eq => unquote(&lhs.to_string()) == unquote(&rhs.to_string()),
                Operator::Lt => lhs.number(*op)? < rhs.number(*op)?,
                Operator::Gt => lhs.number(*op)? > rhs.number(*op)?,
                Operator::Lte => lhs.number(*op)? <= rhs.number(*op)?,
                Operator::Gte => lhs.number(*op)? >= rhs.number(*op)?,
            };
            Ok(Resolved::Bool(outcome))
        }
    }
}
