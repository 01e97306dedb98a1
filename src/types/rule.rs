use serde::{Deserialize, Serialize};

use super::error::{Malformed, RuleError};
use super::limits::{Limits, DEFAULT_MAX_DEPTH};
use super::node::Node;
use super::record::Record;

/// Rule text paired with the tree built from it.
///
/// Every `Rule` upholds `ast == build(rule_string)`. Parsed rules get this by
/// construction. Trees produced elsewhere (the combiner, storage) are accepted
/// through [`Rule::from_tree`] only if their serialized text rebuilds the same
/// tree, so the text can always be reparsed without changing behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredPair")]
pub struct Rule {
    rule_string: String,
    ast: Node,
}

#[derive(Deserialize)]
struct StoredPair {
    rule_string: String,
    ast: Node,
}

impl TryFrom<StoredPair> for Rule {
    type Error = RuleError;

    fn try_from(pair: StoredPair) -> Result<Self, Self::Error> {
        // The deserializer's own nesting guard already bounded the stored tree,
        // so a row written under a larger limit is still read back.
        let limits = Limits::with_max_depth(pair.ast.height().max(DEFAULT_MAX_DEPTH));
        Rule::from_parts_with_limits(pair.rule_string, pair.ast, &limits)
    }
}

impl Rule {
    /// Reassemble a rule from stored text and tree, rejecting pairs that disagree.
    pub(crate) fn from_parts_with_limits(
        rule_string: String,
        ast: Node,
        limits: &Limits,
    ) -> Result<Self, RuleError> {
        if ast.height() > limits.max_depth {
            return Err(RuleError::TooDeeplyNested {
                limit: limits.max_depth,
            });
        }
        let rebuilt = crate::parse::parse_with_limits(&rule_string, limits)?;
        if rebuilt != ast {
            return Err(Malformed::InvalidStructure(
                "stored tree does not match its rule text".to_owned(),
            )
            .into());
        }
        Ok(Rule { rule_string, ast })
    }

    /// Tokenize and build `text` with default [`Limits`].
    ///
    /// # Errors
    ///
    /// Returns the tokenizer or builder [`RuleError`].
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        Self::parse_with_limits(text, &Limits::default())
    }

    /// # Errors
    ///
    /// Returns the tokenizer or builder [`RuleError`].
    pub fn parse_with_limits(text: &str, limits: &Limits) -> Result<Self, RuleError> {
        let ast = crate::parse::parse_with_limits(text, limits)?;
        Ok(Rule {
            rule_string: text.to_owned(),
            ast,
        })
    }

    /// Adopt a tree built outside the parser, deriving the rule text from it.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::TooDeeplyNested`] for trees over the depth limit and
    /// [`Malformed::InvalidStructure`] when a leaf cannot be written back as a
    /// single token (e.g. it contains `AND` or unquoted spaces).
    pub fn from_tree(ast: Node) -> Result<Self, RuleError> {
        Self::from_tree_with_limits(ast, &Limits::default())
    }

    /// # Errors
    ///
    /// See [`Rule::from_tree`].
    pub fn from_tree_with_limits(ast: Node, limits: &Limits) -> Result<Self, RuleError> {
        if ast.height() > limits.max_depth {
            return Err(RuleError::TooDeeplyNested {
                limit: limits.max_depth,
            });
        }
        let rule_string = crate::serialize::to_text(&ast);
        let rebuilt = crate::parse::parse_with_limits(&rule_string, limits)
            .map_err(|e| Malformed::InvalidStructure(format!("tree text does not reparse: {e}")))?;
        if rebuilt != ast {
            return Err(Malformed::InvalidStructure(
                "tree text reparses to a different tree".to_owned(),
            )
            .into());
        }
        Ok(Rule { rule_string, ast })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.rule_string
    }

    #[must_use]
    pub fn ast(&self) -> &Node {
        &self.ast
    }

    #[must_use]
    pub fn into_ast(self) -> Node {
        self.ast
    }

    /// Evaluate this rule against `record` with default [`Limits`].
    ///
    /// # Errors
    ///
    /// Returns the evaluator's [`RuleError`].
    pub fn evaluate(&self, record: &Record) -> Result<bool, RuleError> {
        crate::evaluate::evaluate(&self.ast, record)
    }

    /// # Errors
    ///
    /// Returns the evaluator's [`RuleError`].
    pub fn evaluate_with_limits(
        &self,
        record: &Record,
        limits: &Limits,
    ) -> Result<bool, RuleError> {
        crate::evaluate::evaluate_with_limits(&self.ast, record, limits)
    }
}
