use thiserror::Error;

use crate::store::StoreError;
use crate::RuleError;

/// Unified error type covering rule handling, storage and JSON conversion.
///
/// Returned by [`RuleService::evaluate_json`](crate::RuleService::evaluate_json);
/// every other error in the crate converts into it with `?`.
#[derive(Debug, Error)]
pub enum RuleTreeError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "snapshot")]
    #[error(transparent)]
    SnapshotEncode(#[from] crate::snapshot::SnapshotEncodeError),

    #[cfg(feature = "snapshot")]
    #[error(transparent)]
    SnapshotDecode(#[from] crate::snapshot::SnapshotDecodeError),
}

impl RuleTreeError {
    /// The underlying rule error, whether raised directly or through the store.
    #[must_use]
    pub fn as_rule_error(&self) -> Option<&RuleError> {
        match self {
            RuleTreeError::Rule(e) | RuleTreeError::Store(StoreError::Rule(e)) => Some(e),
            _ => None,
        }
    }
}
