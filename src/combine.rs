//! Merging several rule trees into one.
//!
//! Trees are folded left to right. Each step places the running tree on the
//! left and the next tree on the right, under whichever of `AND`/`OR` occurs
//! more often in the two of them combined; `AND` wins ties, including the case
//! where neither side contains a logical operator. The running tree's counts
//! include the roots added by earlier steps.
//!
//! The chosen root is a majority vote, not a logical composition of the inputs.
//! Identities such as De Morgan's laws do not hold across a combined tree.

use tracing::debug;

use crate::types::{LogicCounts, Malformed};
use crate::{Limits, Node, Operator, RuleError};

/// The root operator picked for a combine step with these cumulative counts.
#[must_use]
pub fn majority_operator(counts: LogicCounts) -> Operator {
    if counts.or > counts.and {
        Operator::Or
    } else {
        Operator::And
    }
}

/// Combine `trees` with default [`Limits`].
///
/// # Errors
///
/// See [`combine_with_limits`].
pub fn combine<I>(trees: I) -> Result<Node, RuleError>
where
    I: IntoIterator<Item = Node>,
{
    combine_with_limits(trees, &Limits::default())
}

/// Combine two or more trees into one.
///
/// # Errors
///
/// - [`Malformed::TooFewRules`] if fewer than two trees are supplied
/// - [`RuleError::TooDeeplyNested`] if the merged tree exceeds `limits.max_depth`
pub fn combine_with_limits<I>(trees: I, limits: &Limits) -> Result<Node, RuleError>
where
    I: IntoIterator<Item = Node>,
{
    let mut trees = trees.into_iter();
    let (mut combined, second) = match (trees.next(), trees.next()) {
        (Some(first), Some(second)) => (first, second),
        (first, _) => {
            return Err(Malformed::TooFewRules {
                supplied: usize::from(first.is_some()),
            }
            .into())
        }
    };
    let mut counts = combined.logic_counts();
    let mut height = combined.height();

    for (step, next) in std::iter::once(second).chain(trees).enumerate() {
        let cumulative = counts + next.logic_counts();
        let op = majority_operator(cumulative);
        debug!(
            step,
            and = cumulative.and,
            or = cumulative.or,
            root = %op,
            "combining rule trees"
        );

        height = height.max(next.height()) + 1;
        if height > limits.max_depth {
            return Err(RuleError::TooDeeplyNested {
                limit: limits.max_depth,
            });
        }

        counts = cumulative
            + match op {
                Operator::Or => LogicCounts { and: 0, or: 1 },
                _ => LogicCounts { and: 1, or: 0 },
            };
        combined = Node::binary(op, combined, next);
    }

    Ok(combined)
}
