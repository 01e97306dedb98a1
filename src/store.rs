//! Persistence contract for named rules and an in-memory implementation.
//!
//! A stored row keeps the rule text and its tree side by side. Rule text is
//! unique across rows; ids are assigned by the store and never reused.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{Rule, RuleError};

pub type RuleId = u64;

/// Errors raised by a [`RuleRepository`] or by [`RuleService`](crate::RuleService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("rule {0} not found")]
    NotFound(RuleId),

    #[error("a rule with text '{0}' already exists")]
    Duplicate(String),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Caller-supplied input for creating or replacing a rule from text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct NewRule {
    pub name: String,
    pub rule_string: String,
    #[serde(default)]
    pub description: String,
}

impl NewRule {
    pub fn new(name: impl Into<String>, rule_string: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule_string: rule_string.into(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The parts of a row that callers choose. The store assigns `id` and
/// `created_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFields {
    pub name: String,
    pub rule: Rule,
    pub description: String,
}

/// One persisted rule.
///
/// Serializes to the flat row shape
/// `{id, name, rule_string, ast, description, created_date}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRule {
    pub id: RuleId,
    pub name: String,
    #[serde(flatten)]
    pub rule: Rule,
    #[serde(default)]
    pub description: String,
    pub created_date: DateTime<Utc>,
}

/// Storage backend for rules.
pub trait RuleRepository: Send + Sync {
    /// Persist a new row and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// [`StoreError::Duplicate`] if another row already has the same rule text.
    fn insert(&self, fields: RuleFields) -> Result<StoredRule, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown ids.
    fn get(&self, id: RuleId) -> Result<StoredRule, StoreError>;

    /// Replace a row's fields, keeping its id and creation date.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown ids, [`StoreError::Duplicate`] if a
    /// different row already has the new rule text.
    fn update(&self, id: RuleId, fields: RuleFields) -> Result<StoredRule, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown ids.
    fn delete(&self, id: RuleId) -> Result<(), StoreError>;

    /// All rows in ascending id order.
    fn list(&self) -> Vec<StoredRule>;
}

#[derive(Debug, Default)]
struct Rows {
    by_id: BTreeMap<RuleId, StoredRule>,
    last_id: RuleId,
}

impl Rows {
    fn text_taken(&self, text: &str, except: Option<RuleId>) -> bool {
        self.by_id
            .values()
            .any(|row| Some(row.id) != except && row.rule.text() == text)
    }
}

/// Thread-safe in-memory [`RuleRepository`].
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rows: RwLock<Rows>,
}

impl MemoryRuleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().by_id.is_empty()
    }

    /// Rows plus the highest id ever assigned, for snapshotting.
    #[cfg(feature = "snapshot")]
    pub(crate) fn export(&self) -> (Vec<StoredRule>, RuleId) {
        let rows = self.rows.read();
        (rows.by_id.values().cloned().collect(), rows.last_id)
    }

    /// Rebuild a store from validated rows.
    #[cfg(feature = "snapshot")]
    pub(crate) fn restore(rows: Vec<StoredRule>, last_id: RuleId) -> Self {
        let by_id = rows.into_iter().map(|row| (row.id, row)).collect();
        Self {
            rows: RwLock::new(Rows { by_id, last_id }),
        }
    }
}

impl RuleRepository for MemoryRuleStore {
    #[instrument(skip(self, entry), fields(name = %entry.name))]
    fn insert(&self, entry: RuleFields) -> Result<StoredRule, StoreError> {
        let mut rows = self.rows.write();
        if rows.text_taken(entry.rule.text(), None) {
            warn!(rule = entry.rule.text(), "duplicate rule text");
            return Err(StoreError::Duplicate(entry.rule.text().to_owned()));
        }

        rows.last_id += 1;
        let row = StoredRule {
            id: rows.last_id,
            name: entry.name,
            rule: entry.rule,
            description: entry.description,
            created_date: Utc::now(),
        };
        rows.by_id.insert(row.id, row.clone());
        info!(rule_id = row.id, "rule stored");
        Ok(row)
    }

    fn get(&self, id: RuleId) -> Result<StoredRule, StoreError> {
        self.rows
            .read()
            .by_id
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    #[instrument(skip(self, entry), fields(rule_id = id))]
    fn update(&self, id: RuleId, entry: RuleFields) -> Result<StoredRule, StoreError> {
        let mut rows = self.rows.write();
        if !rows.by_id.contains_key(&id) {
            warn!("updating unknown rule");
            return Err(StoreError::NotFound(id));
        }
        if rows.text_taken(entry.rule.text(), Some(id)) {
            warn!(rule = entry.rule.text(), "duplicate rule text");
            return Err(StoreError::Duplicate(entry.rule.text().to_owned()));
        }

        let row = rows
            .by_id
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        row.name = entry.name;
        row.rule = entry.rule;
        row.description = entry.description;
        info!("rule updated");
        Ok(row.clone())
    }

    #[instrument(skip(self), fields(rule_id = id))]
    fn delete(&self, id: RuleId) -> Result<(), StoreError> {
        if self.rows.write().by_id.remove(&id).is_some() {
            info!("rule deleted");
            Ok(())
        } else {
            warn!("deleting unknown rule");
            Err(StoreError::NotFound(id))
        }
    }

    fn list(&self) -> Vec<StoredRule> {
        self.rows.read().by_id.values().cloned().collect()
    }
}
