use std::fmt;
use std::str::FromStr;

use super::error::RuleError;
use super::value::Value;

/// The closed set of operators a rule tree can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::And,
        Operator::Or,
        Operator::Lt,
        Operator::Gt,
        Operator::Lte,
        Operator::Gte,
        Operator::Eq,
    ];

    /// The textual form used in rule text and in the stored `val` field.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Eq => "=",
        }
    }

    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Binding strength used by the tree builder. Higher binds tighter; the
    /// open-parenthesis sentinel sits below every operator.
    ///
    /// | level | members                          |
    /// |-------|----------------------------------|
    /// | 2     | `AND`                            |
    /// | 3     | `OR`, `<`, `>`, `<=`, `>=`, `=`  |
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            Operator::And => 2,
            Operator::Or
            | Operator::Lt
            | Operator::Gt
            | Operator::Lte
            | Operator::Gte
            | Operator::Eq => 3,
        }
    }

    #[must_use]
    pub fn is_logical(self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::from_symbol(s).ok_or_else(|| RuleError::UnsupportedOperator(s.to_owned()))
    }
}

/// A rule expression tree.
///
/// Leaves hold either a field name, resolved against a [`Record`](super::Record)
/// at evaluation time, or a literal (`30`, `'Sales'`). Every internal node is a
/// binary operator owning both of its children. Trees are never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(String),
    Binary {
        op: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Number of `AND` and `OR` nodes in a tree. Comparisons and leaves are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicCounts {
    pub and: usize,
    pub or: usize,
}

impl std::ops::Add for LogicCounts {
    type Output = LogicCounts;

    fn add(self, rhs: LogicCounts) -> LogicCounts {
        LogicCounts {
            and: self.and + rhs.and,
            or: self.or + rhs.or,
        }
    }
}

impl Node {
    #[must_use]
    pub fn leaf(value: impl Into<String>) -> Node {
        Node::Leaf(value.into())
    }

    #[must_use]
    pub fn binary(op: Operator, left: Node, right: Node) -> Node {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn and(self, other: Node) -> Node {
        Node::binary(Operator::And, self, other)
    }

    #[must_use]
    pub fn or(self, other: Node) -> Node {
        Node::binary(Operator::Or, self, other)
    }

    /// The node's `val`: the leaf text, or the operator symbol.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Node::Leaf(value) => value,
            Node::Binary { op, .. } => op.symbol(),
        }
    }

    #[must_use]
    pub fn left(&self) -> Option<&Node> {
        match self {
            Node::Leaf(_) => None,
            Node::Binary { left, .. } => Some(left),
        }
    }

    #[must_use]
    pub fn right(&self) -> Option<&Node> {
        match self {
            Node::Leaf(_) => None,
            Node::Binary { right, .. } => Some(right),
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Number of nodes on the longest root-to-leaf path. A lone leaf has height 1.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1_usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            if let Node::Binary { left, right, .. } = node {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        max
    }

    #[must_use]
    pub fn logic_counts(&self) -> LogicCounts {
        let mut counts = LogicCounts::default();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Node::Binary { op, left, right } = node {
                match op {
                    Operator::And => counts.and += 1,
                    Operator::Or => counts.or += 1,
                    _ => {}
                }
                stack.push(left);
                stack.push(right);
            }
        }
        counts
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::serialize::to_text(self))
    }
}

/// Intermediate builder for field comparisons.
/// Created by [`field()`]; a comparison method turns it into a [`Node`].
#[derive(Debug, Clone)]
pub struct FieldExpr {
    name: String,
}

impl FieldExpr {
    fn compare(self, op: Operator, value: impl Into<Value>) -> Node {
        Node::binary(op, Node::Leaf(self.name), Node::Leaf(value.into().to_literal()))
    }

    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> Node {
        self.compare(Operator::Eq, value)
    }

    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> Node {
        self.compare(Operator::Gt, value)
    }

    #[must_use]
    pub fn gte(self, value: impl Into<Value>) -> Node {
        self.compare(Operator::Gte, value)
    }

    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> Node {
        self.compare(Operator::Lt, value)
    }

    #[must_use]
    pub fn lte(self, value: impl Into<Value>) -> Node {
        self.compare(Operator::Lte, value)
    }
}

#[must_use]
pub fn field(name: &str) -> FieldExpr {
    FieldExpr {
        name: name.to_owned(),
    }
}
