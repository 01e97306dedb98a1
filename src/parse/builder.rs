//! Two-stack operator-precedence (shunting-yard) tree builder.
//!
//! Operators wait on one stack, finished subtrees on the other. An incoming
//! operator first folds every waiting operator that binds at least as tightly,
//! which makes equal-precedence chains left-associative:
//! `a AND b AND c` becomes `(a AND b) AND c`.

use tracing::debug;

use crate::types::{Limits, Malformed, Node, Operator, Paren, RuleError};

use super::token::Token;

#[derive(Debug, Clone, Copy)]
enum Pending {
    Open,
    Op(Operator),
}

/// A finished subtree together with its height, so depth is checked without rewalking.
struct Subtree {
    node: Node,
    height: usize,
}

struct Builder<'a> {
    ops: Vec<Pending>,
    nodes: Vec<Subtree>,
    open_parens: usize,
    limits: &'a Limits,
}

impl<'a> Builder<'a> {
    fn new(limits: &'a Limits) -> Self {
        Self {
            ops: Vec::new(),
            nodes: Vec::new(),
            open_parens: 0,
            limits,
        }
    }

    fn too_deep(&self) -> RuleError {
        RuleError::TooDeeplyNested {
            limit: self.limits.max_depth,
        }
    }

    fn push_leaf(&mut self, value: String) -> Result<(), RuleError> {
        if self.limits.max_depth == 0 {
            return Err(self.too_deep());
        }
        self.nodes.push(Subtree {
            node: Node::Leaf(value),
            height: 1,
        });
        Ok(())
    }

    fn open(&mut self) -> Result<(), RuleError> {
        self.open_parens += 1;
        if self.open_parens > self.limits.max_depth {
            return Err(self.too_deep());
        }
        self.ops.push(Pending::Open);
        Ok(())
    }

    fn close(&mut self) -> Result<(), RuleError> {
        loop {
            match self.ops.pop() {
                Some(Pending::Open) => break,
                Some(Pending::Op(op)) => self.fold(op)?,
                None => return Err(RuleError::UnmatchedParentheses(Paren::Close)),
            }
        }
        self.open_parens -= 1;
        Ok(())
    }

    fn operator(&mut self, incoming: Operator) -> Result<(), RuleError> {
        while let Some(&Pending::Op(top)) = self.ops.last() {
            if top.precedence() < incoming.precedence() {
                break;
            }
            self.ops.pop();
            self.fold(top)?;
        }
        self.ops.push(Pending::Op(incoming));
        Ok(())
    }

    /// Replace the top two subtrees with one rooted at `op`.
    fn fold(&mut self, op: Operator) -> Result<(), RuleError> {
        let right = self.nodes.pop();
        let left = self.nodes.pop();
        let (Some(left), Some(right)) = (left, right) else {
            return Err(Malformed::MissingOperand {
                operator: op.symbol().to_owned(),
            }
            .into());
        };
        let height = left.height.max(right.height) + 1;
        if height > self.limits.max_depth {
            return Err(self.too_deep());
        }
        self.nodes.push(Subtree {
            node: Node::binary(op, left.node, right.node),
            height,
        });
        Ok(())
    }

    fn finish(mut self) -> Result<Node, RuleError> {
        while let Some(pending) = self.ops.pop() {
            match pending {
                Pending::Open => return Err(RuleError::UnmatchedParentheses(Paren::Open)),
                Pending::Op(op) => self.fold(op)?,
            }
        }
        let root = self.nodes.pop().ok_or(RuleError::EmptyExpression)?;
        if !self.nodes.is_empty() {
            return Err(Malformed::DanglingOperands {
                count: self.nodes.len() + 1,
            }
            .into());
        }
        debug!(height = root.height, "built rule tree");
        Ok(root.node)
    }
}

/// Build a tree from a token sequence.
///
/// # Errors
///
/// - [`RuleError::UnmatchedParentheses`] for an unclosed `(` or a stray `)`
/// - [`RuleError::EmptyExpression`] if no operand survives (e.g. `()`)
/// - [`RuleError::MalformedExpression`] when operators and operands do not pair up
/// - [`RuleError::TooDeeplyNested`] past `limits.max_depth`
pub fn build(tokens: &[Token], limits: &Limits) -> Result<Node, RuleError> {
    debug!(tokens = tokens.len(), "building rule tree");
    let mut builder = Builder::new(limits);
    for token in tokens {
        match token {
            Token::LeftParen => builder.open()?,
            Token::RightParen => builder.close()?,
            Token::Operator(op) => builder.operator(*op)?,
            Token::Operand(value) => builder.push_leaf(value.clone())?,
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::tokenize;

    fn build_text(text: &str) -> Result<Node, RuleError> {
        build(&tokenize(text)?, &Limits::default())
    }

    fn leaf(s: &str) -> Node {
        Node::leaf(s)
    }

    #[test]
    fn single_comparison() {
        assert_eq!(
            build_text("age > 30").unwrap(),
            Node::binary(Operator::Gt, leaf("age"), leaf("30"))
        );
    }

    #[test]
    fn single_operand() {
        assert_eq!(build_text("active").unwrap(), leaf("active"));
    }

    #[test]
    fn and_chain_is_left_associative() {
        assert_eq!(
            build_text("1 AND 2 AND 3").unwrap(),
            Node::binary(
                Operator::And,
                Node::binary(Operator::And, leaf("1"), leaf("2")),
                leaf("3"),
            )
        );
    }

    #[test]
    fn comparisons_bind_tighter_than_and() {
        assert_eq!(
            build_text("age > 30 AND department = 'Sales'").unwrap(),
            Node::binary(
                Operator::And,
                Node::binary(Operator::Gt, leaf("age"), leaf("30")),
                Node::binary(Operator::Eq, leaf("department"), leaf("'Sales'")),
            )
        );
    }

    #[test]
    fn or_shares_comparison_precedence() {
        // OR and comparisons sit on one level, so they fold left to right.
        assert_eq!(
            build_text("a > 1 OR b").unwrap(),
            Node::binary(
                Operator::Or,
                Node::binary(Operator::Gt, leaf("a"), leaf("1")),
                leaf("b"),
            )
        );
        assert_eq!(
            build_text("a OR b AND c").unwrap(),
            Node::binary(
                Operator::And,
                Node::binary(Operator::Or, leaf("a"), leaf("b")),
                leaf("c"),
            )
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            build_text("a AND (b OR c)").unwrap(),
            Node::binary(
                Operator::And,
                leaf("a"),
                Node::binary(Operator::Or, leaf("b"), leaf("c")),
            )
        );
    }

    #[test]
    fn redundant_parentheses() {
        assert_eq!(
            build_text("((x = 1))").unwrap(),
            Node::binary(Operator::Eq, leaf("x"), leaf("1"))
        );
    }

    #[test]
    fn excess_open_paren() {
        assert_eq!(
            build_text("(age > 30"),
            Err(RuleError::UnmatchedParentheses(Paren::Open))
        );
    }

    #[test]
    fn excess_close_paren() {
        assert_eq!(
            build_text("age > 30)"),
            Err(RuleError::UnmatchedParentheses(Paren::Close))
        );
    }

    #[test]
    fn empty_parens() {
        assert_eq!(build_text("()"), Err(RuleError::EmptyExpression));
    }

    #[test]
    fn missing_operand() {
        assert_eq!(
            build_text("age >"),
            Err(RuleError::MalformedExpression(Malformed::MissingOperand {
                operator: ">".into()
            }))
        );
        assert!(matches!(
            build_text("AND"),
            Err(RuleError::MalformedExpression(Malformed::MissingOperand { .. }))
        ));
    }

    #[test]
    fn dangling_operands() {
        assert_eq!(
            build_text("age 30"),
            Err(RuleError::MalformedExpression(Malformed::DanglingOperands {
                count: 2
            }))
        );
    }

    #[test]
    fn depth_limit_on_parentheses() {
        let limits = Limits::with_max_depth(3);
        let tokens = tokenize("((((x))))").unwrap();
        assert_eq!(
            build(&tokens, &limits),
            Err(RuleError::TooDeeplyNested { limit: 3 })
        );
    }

    #[test]
    fn depth_limit_on_tree_height() {
        let limits = Limits::with_max_depth(3);
        let ok = tokenize("a > 1 AND b").unwrap();
        assert!(build(&ok, &limits).is_ok());
        let too_tall = tokenize("a > 1 AND b AND c").unwrap();
        assert_eq!(
            build(&too_tall, &limits),
            Err(RuleError::TooDeeplyNested { limit: 3 })
        );
    }

    #[test]
    fn rebuilding_is_deterministic() {
        let text = "((age > 30 AND department = 'Sales') OR (age < 25 AND department = 'Marketing')) AND (salary > 50000 OR experience > 5)";
        assert_eq!(build_text(text).unwrap(), build_text(text).unwrap());
    }
}
