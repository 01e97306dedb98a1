use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::store::{NewRule, RuleFields, RuleId, RuleRepository, StoreError, StoredRule};
use crate::{Limits, Record, Rule, RuleTreeError, Verdict};

/// Name and description for the row created by [`RuleService::combine`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct NewCombined {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewCombined {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Rule lifecycle on top of a [`RuleRepository`]: parse on write, evaluate
/// and combine stored rules.
///
/// Every operation applies the service's [`Limits`]. Nothing is persisted
/// when parsing or combining fails.
#[derive(Debug)]
pub struct RuleService<R> {
    repo: R,
    limits: Limits,
}

impl<R: RuleRepository> RuleService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_limits(repo, Limits::default())
    }

    pub fn with_limits(repo: R, limits: Limits) -> Self {
        Self { repo, limits }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn parse(&self, text: &str) -> Result<Rule, StoreError> {
        Rule::parse_with_limits(text, &self.limits).map_err(|e| {
            warn!(rule = text, error = %e, "rejected rule text");
            StoreError::Rule(e)
        })
    }

    /// Parse `new.rule_string` and store it as a new row.
    ///
    /// # Errors
    ///
    /// [`StoreError::Rule`] if the text does not parse,
    /// [`StoreError::Duplicate`] if the text is already stored.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub fn create(&self, new: NewRule) -> Result<StoredRule, StoreError> {
        let rule = self.parse(&new.rule_string)?;
        let row = self.repo.insert(RuleFields {
            name: new.name,
            rule,
            description: new.description,
        })?;
        info!(rule_id = row.id, "rule created");
        Ok(row)
    }

    /// Replace a stored rule, rebuilding its tree from the new text.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`], [`StoreError::Rule`] or [`StoreError::Duplicate`].
    #[instrument(skip(self, new), fields(rule_id = id))]
    pub fn update(&self, id: RuleId, new: NewRule) -> Result<StoredRule, StoreError> {
        let rule = self.parse(&new.rule_string)?;
        let row = self.repo.update(
            id,
            RuleFields {
                name: new.name,
                rule,
                description: new.description,
            },
        )?;
        info!("rule replaced");
        Ok(row)
    }

    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown ids.
    #[instrument(skip(self), fields(rule_id = id))]
    pub fn delete(&self, id: RuleId) -> Result<(), StoreError> {
        self.repo.delete(id)
    }

    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown ids.
    pub fn get(&self, id: RuleId) -> Result<StoredRule, StoreError> {
        self.repo.get(id).inspect_err(|_| warn!(rule_id = id, "rule not found"))
    }

    pub fn list(&self) -> Vec<StoredRule> {
        self.repo.list()
    }

    /// Evaluate a stored rule against `record`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown ids, [`StoreError::Rule`] when
    /// evaluation fails.
    #[instrument(skip(self, record), fields(rule_id = id))]
    pub fn evaluate(&self, id: RuleId, record: &Record) -> Result<Verdict, StoreError> {
        let row = self.get(id)?;
        let passed = row.rule.evaluate_with_limits(record, &self.limits)?;
        Ok(Verdict::new(row.name, passed))
    }

    /// Evaluate a stored rule against a JSON object, as a request body would
    /// supply it. See [`Record::from_json`] for which members become fields.
    ///
    /// # Errors
    ///
    /// [`RuleTreeError::Json`] if `body` is not valid JSON, otherwise as
    /// [`RuleService::evaluate`].
    pub fn evaluate_json(&self, id: RuleId, body: &str) -> Result<Verdict, RuleTreeError> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        Ok(self.evaluate(id, &Record::from_json(&value))?)
    }

    /// Combine stored rules, in the order given, into a new stored rule whose
    /// text is derived from the merged tree.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if any id is unknown
    /// - [`StoreError::Rule`] for fewer than two ids or a merged tree over the depth limit
    /// - [`StoreError::Duplicate`] if the merged text is already stored
    #[instrument(skip(self, ids, meta), fields(count = ids.len(), name = %meta.name))]
    pub fn combine(&self, ids: &[RuleId], meta: NewCombined) -> Result<StoredRule, StoreError> {
        let trees = ids
            .iter()
            .map(|&id| self.get(id).map(|row| row.rule.into_ast()))
            .collect::<Result<Vec<_>, _>>()?;

        let merged = crate::combine_with_limits(trees, &self.limits)?;
        let rule = Rule::from_tree_with_limits(merged, &self.limits)?;
        let row = self.repo.insert(RuleFields {
            name: meta.name,
            rule,
            description: meta.description,
        })?;
        info!(rule_id = row.id, sources = ?ids, "rules combined");
        Ok(row)
    }
}
