//! Converting trees back to rule text and to/from the stored node shape.
//!
//! The stored shape is the tree itself, one object per node:
//!
//! ```text
//! { "val": "AND",
//!   "left":  { "val": "age", "left": null, "right": null },
//!   "right": { "val": "30",  "left": null, "right": null } }
//! ```
//!
//! Leaves have both children `null`; internal nodes have both children set and
//! an operator symbol in `val`.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::types::Malformed;
use crate::{Limits, Node, Operator, RuleError};

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

enum Step<'a> {
    Visit(&'a Node),
    Emit(&'a str),
    Close,
}

/// Write `node` back as rule text.
///
/// Every operator node is wrapped in parentheses and every value is followed by
/// a space, so `age > 30` becomes `(age > 30 ) `. Because the output is fully
/// parenthesized, parsing it rebuilds the same tree regardless of precedence.
#[must_use]
pub fn to_text(node: &Node) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Visit(node)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Visit(Node::Leaf(value)) => {
                out.push_str(value);
                out.push(' ');
            }
            Step::Visit(Node::Binary { op, left, right }) => {
                out.push('(');
                stack.push(Step::Close);
                stack.push(Step::Visit(right));
                stack.push(Step::Emit(op.symbol()));
                stack.push(Step::Visit(left));
            }
            Step::Emit(symbol) => {
                out.push_str(symbol);
                out.push(' ');
            }
            Step::Close => out.push_str(") "),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// Convert `node` to its stored JSON shape with default [`Limits`].
///
/// # Errors
///
/// See [`to_structure_with_limits`].
pub fn to_structure(node: &Node) -> Result<serde_json::Value, RuleError> {
    to_structure_with_limits(node, &Limits::default())
}

/// # Errors
///
/// Returns [`RuleError::TooDeeplyNested`] for trees taller than `limits.max_depth`.
pub fn to_structure_with_limits(
    node: &Node,
    limits: &Limits,
) -> Result<serde_json::Value, RuleError> {
    if node.height() > limits.max_depth {
        return Err(RuleError::TooDeeplyNested {
            limit: limits.max_depth,
        });
    }
    serde_json::to_value(node).map_err(|e| Malformed::InvalidStructure(e.to_string()).into())
}

/// Rebuild a tree from its stored JSON shape with default [`Limits`].
///
/// # Errors
///
/// See [`from_structure_with_limits`].
pub fn from_structure(value: &serde_json::Value) -> Result<Node, RuleError> {
    from_structure_with_limits(value, &Limits::default())
}

/// Rebuild a tree from its stored JSON shape. A missing `left`/`right` key is
/// read as `null`.
///
/// # Errors
///
/// - [`Malformed::InvalidStructure`] for non-objects, a missing or non-string
///   `val`, or a node with exactly one child
/// - [`RuleError::UnsupportedOperator`] when an internal node's `val` is not an operator
/// - [`RuleError::TooDeeplyNested`] past `limits.max_depth`
pub fn from_structure_with_limits(
    value: &serde_json::Value,
    limits: &Limits,
) -> Result<Node, RuleError> {
    node_from_value(value, limits.max_depth, 1)
}

fn invalid(reason: impl Into<String>) -> RuleError {
    Malformed::InvalidStructure(reason.into()).into()
}

fn child<'a>(
    object: &'a serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<&'a serde_json::Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn node_from_value(
    value: &serde_json::Value,
    limit: usize,
    depth: usize,
) -> Result<Node, RuleError> {
    if depth > limit {
        return Err(RuleError::TooDeeplyNested { limit });
    }
    let object = value
        .as_object()
        .ok_or_else(|| invalid("node must be an object"))?;
    let val = object
        .get("val")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| invalid("node is missing a string 'val'"))?;

    match (child(object, "left"), child(object, "right")) {
        (None, None) => Ok(Node::Leaf(val.to_owned())),
        (Some(left), Some(right)) => {
            let op: Operator = val.parse()?;
            Ok(Node::binary(
                op,
                node_from_value(left, limit, depth + 1)?,
                node_from_value(right, limit, depth + 1)?,
            ))
        }
        _ => Err(invalid(format!("node '{val}' has exactly one child"))),
    }
}

// ---------------------------------------------------------------------------
// serde
// ---------------------------------------------------------------------------

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Node", 3)?;
        state.serialize_field("val", self.value())?;
        state.serialize_field("left", &self.left())?;
        state.serialize_field("right", &self.right())?;
        state.end()
    }
}

/// Owned mirror of the stored shape, used to deserialize [`Node`] from any format.
#[derive(Deserialize)]
pub(crate) struct StoredNode {
    val: String,
    #[serde(default)]
    left: Option<Box<StoredNode>>,
    #[serde(default)]
    right: Option<Box<StoredNode>>,
}

/// Nesting is bounded by the deserializer that produced `stored` (serde_json
/// stops at 128 levels); depth limits apply when the tree is used.
impl TryFrom<StoredNode> for Node {
    type Error = RuleError;

    fn try_from(stored: StoredNode) -> Result<Self, Self::Error> {
        match (stored.left, stored.right) {
            (None, None) => Ok(Node::Leaf(stored.val)),
            (Some(left), Some(right)) => {
                let op: Operator = stored.val.parse()?;
                Ok(Node::binary(op, Node::try_from(*left)?, Node::try_from(*right)?))
            }
            _ => Err(invalid(format!("node '{}' has exactly one child", stored.val))),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = StoredNode::deserialize(deserializer)?;
        Node::try_from(stored).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{field, parse};

    #[test]
    fn leaf_text() {
        assert_eq!(to_text(&Node::leaf("active")), "active ");
    }

    #[test]
    fn comparison_text() {
        assert_eq!(to_text(&field("age").gt(30_i64)), "(age > 30 ) ");
    }

    #[test]
    fn nested_text() {
        let tree = parse("age > 30 AND department = 'Sales'").unwrap();
        assert_eq!(
            to_text(&tree),
            "((age > 30 ) AND (department = 'Sales' ) ) "
        );
        assert_eq!(tree.to_string(), to_text(&tree));
    }

    #[test]
    fn text_reparses_to_same_tree() {
        let text = "((age > 30 AND department = 'Sales') OR (age < 25 AND department = 'Marketing')) AND (salary > 50000 OR experience > 5)";
        let tree = parse(text).unwrap();
        assert_eq!(parse(&to_text(&tree)).unwrap(), tree);
    }

    #[test]
    fn structure_shape() {
        let value = to_structure(&field("age").gt(30_i64)).unwrap();
        assert_eq!(
            value,
            json!({
                "val": ">",
                "left": {"val": "age", "left": null, "right": null},
                "right": {"val": "30", "left": null, "right": null}
            })
        );
    }

    #[test]
    fn structure_round_trip() {
        let tree = parse("(a = 1 AND b > 2) AND (c <= 'x' OR d)").unwrap();
        let value = to_structure(&tree).unwrap();
        assert_eq!(from_structure(&value).unwrap(), tree);
        let via_serde: Node = serde_json::from_value(value).unwrap();
        assert_eq!(via_serde, tree);
    }

    #[test]
    fn missing_children_read_as_leaf() {
        assert_eq!(from_structure(&json!({"val": "age"})).unwrap(), Node::leaf("age"));
    }

    #[test]
    fn unknown_operator_is_unsupported() {
        let value = json!({
            "val": "XOR",
            "left": {"val": "a", "left": null, "right": null},
            "right": {"val": "b", "left": null, "right": null}
        });
        assert_eq!(
            from_structure(&value),
            Err(RuleError::UnsupportedOperator("XOR".into()))
        );
        assert!(serde_json::from_value::<Node>(value).is_err());
    }

    #[test]
    fn one_child_is_invalid() {
        let value = json!({
            "val": "AND",
            "left": {"val": "a", "left": null, "right": null},
            "right": null
        });
        assert!(matches!(
            from_structure(&value),
            Err(RuleError::MalformedExpression(Malformed::InvalidStructure(_)))
        ));
    }

    #[test]
    fn non_object_is_invalid() {
        assert!(matches!(
            from_structure(&json!("age")),
            Err(RuleError::MalformedExpression(Malformed::InvalidStructure(_)))
        ));
        assert!(matches!(
            from_structure(&json!({"val": 3, "left": null, "right": null})),
            Err(RuleError::MalformedExpression(Malformed::InvalidStructure(_)))
        ));
    }

    #[test]
    fn structure_depth_limits() {
        let tree = parse("a > 1 AND b < 2").unwrap();
        let limits = Limits::with_max_depth(2);
        assert_eq!(
            to_structure_with_limits(&tree, &limits),
            Err(RuleError::TooDeeplyNested { limit: 2 })
        );
        let value = to_structure(&tree).unwrap();
        assert_eq!(
            from_structure_with_limits(&value, &limits),
            Err(RuleError::TooDeeplyNested { limit: 2 })
        );
    }
}
