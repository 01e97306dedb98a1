//! Checksummed binary snapshots of a [`MemoryRuleStore`].
//!
//! A snapshot is a 32-byte fixed header followed by a bincode-encoded payload.
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"RTRE"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! Trees are stored flat, in pre-order, so decoding never recurses and a
//! hostile payload cannot exhaust the stack. Decoding checks the header, then
//! re-validates every row: ids must be unique and already issued, rule text
//! must be unique, and each stored tree must be within the depth limit and
//! exactly what its text parses to.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::store::{MemoryRuleStore, RuleId, StoredRule};
use crate::types::Malformed;
use crate::{Limits, Node, Operator, Rule, RuleError};

const MAGIC: &[u8; 4] = b"RTRE";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

/// Errors raised while writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotEncodeError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("snapshot payload of {0} bytes exceeds the 4 GiB format limit")]
    TooLarge(usize),
}

/// Errors raised while reading a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotDecodeError {
    #[error("not a rule snapshot: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: snapshot is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    row_count: usize,
    last_id: RuleId,
    rows: Vec<Row>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Row {
    id: RuleId,
    name: String,
    rule_string: String,
    ast: Vec<FlatNode>,
    description: String,
    created_millis: i64,
}

/// One node of a pre-order walk. Internal nodes are followed by their left
/// subtree, then their right subtree.
#[derive(Debug, Serialize, Deserialize)]
struct FlatNode {
    val: String,
    internal: bool,
}

fn flatten(root: &Node) -> Vec<FlatNode> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(FlatNode {
            val: node.value().to_owned(),
            internal: !node.is_leaf(),
        });
        if let Node::Binary { left, right, .. } = node {
            stack.push(right);
            stack.push(left);
        }
    }
    out
}

/// Rebuild a tree from its pre-order walk, bottom up, refusing any subtree
/// taller than `limits.max_depth`.
fn unflatten(nodes: Vec<FlatNode>, limits: &Limits) -> Result<Node, RuleError> {
    let too_deep = || RuleError::TooDeeplyNested {
        limit: limits.max_depth,
    };
    let mut built: Vec<(Node, usize)> = Vec::new();

    for flat in nodes.into_iter().rev() {
        if !flat.internal {
            if limits.max_depth == 0 {
                return Err(too_deep());
            }
            built.push((Node::Leaf(flat.val), 1));
            continue;
        }
        let op: Operator = flat.val.parse()?;
        let (Some((left, left_height)), Some((right, right_height))) =
            (built.pop(), built.pop())
        else {
            return Err(Malformed::InvalidStructure(format!(
                "operator '{}' is missing a child",
                flat.val
            ))
            .into());
        };
        let height = left_height.max(right_height) + 1;
        if height > limits.max_depth {
            return Err(too_deep());
        }
        built.push((Node::binary(op, left, right), height));
    }

    match (built.pop(), built.is_empty()) {
        (Some((root, _)), true) => Ok(root),
        (None, _) => Err(Malformed::InvalidStructure("empty tree".to_owned()).into()),
        (Some(_), false) => Err(Malformed::InvalidStructure(format!(
            "{} subtrees are not joined by an operator",
            built.len() + 1
        ))
        .into()),
    }
}

impl From<&StoredRule> for Row {
    fn from(row: &StoredRule) -> Self {
        Row {
            id: row.id,
            name: row.name.clone(),
            rule_string: row.rule.text().to_owned(),
            ast: flatten(row.rule.ast()),
            description: row.description.clone(),
            created_millis: row.created_date.timestamp_millis(),
        }
    }
}

fn row_to_stored(row: Row, limits: &Limits) -> Result<StoredRule, SnapshotDecodeError> {
    let id = row.id;
    let invalid = |e: RuleError| SnapshotDecodeError::Validation(format!("rule {id}: {e}"));
    let ast = unflatten(row.ast, limits).map_err(invalid)?;
    let rule = Rule::from_parts_with_limits(row.rule_string, ast, limits).map_err(invalid)?;
    let created_date =
        DateTime::<Utc>::from_timestamp_millis(row.created_millis).ok_or_else(|| {
            SnapshotDecodeError::Validation(format!(
                "rule {id}: creation time {} out of range",
                row.created_millis
            ))
        })?;
    Ok(StoredRule {
        id,
        name: row.name,
        rule,
        description: row.description,
        created_date,
    })
}

fn validate(payload: &Payload) -> Result<(), SnapshotDecodeError> {
    if payload.row_count != payload.rows.len() {
        return Err(SnapshotDecodeError::Validation(format!(
            "header says {} rows but payload has {}",
            payload.row_count,
            payload.rows.len()
        )));
    }

    let mut ids = HashSet::with_capacity(payload.rows.len());
    let mut texts = HashSet::with_capacity(payload.rows.len());
    for row in &payload.rows {
        if row.id == 0 || row.id > payload.last_id {
            return Err(SnapshotDecodeError::Validation(format!(
                "rule id {} outside issued range 1..={}",
                row.id, payload.last_id
            )));
        }
        if !ids.insert(row.id) {
            return Err(SnapshotDecodeError::Validation(format!(
                "rule id {} appears twice",
                row.id
            )));
        }
        if !texts.insert(row.rule_string.as_str()) {
            return Err(SnapshotDecodeError::Validation(format!(
                "rule text '{}' appears twice",
                row.rule_string
            )));
        }
    }
    Ok(())
}

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) -> Result<(), SnapshotEncodeError> {
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| SnapshotEncodeError::TooLarge(payload.len()))?;
    let hash = blake3::hash(payload);

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash.as_bytes()[..16]);
    Ok(())
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), SnapshotDecodeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(SnapshotDecodeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }
    if &bytes[0..4] != MAGIC {
        return Err(SnapshotDecodeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] engine version and bytes[8..12] flags are not checked
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

pub(crate) fn encode(
    rows: &[StoredRule],
    last_id: RuleId,
) -> Result<Vec<u8>, SnapshotEncodeError> {
    let payload = Payload {
        row_count: rows.len(),
        last_id,
        rows: rows.iter().map(Row::from).collect(),
    };
    let payload = bincode::serde::encode_to_vec(&payload, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload)?;
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(
    bytes: &[u8],
    limits: &Limits,
) -> Result<(Vec<StoredRule>, RuleId), SnapshotDecodeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;
    if format_version != FORMAT_VERSION {
        return Err(SnapshotDecodeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload = bytes[HEADER_SIZE..]
        .get(..payload_len as usize)
        .ok_or(SnapshotDecodeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        })?;
    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(SnapshotDecodeError::ChecksumMismatch);
    }

    let (payload, _): (Payload, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    validate(&payload)?;
    debug!(rows = payload.rows.len(), last_id = payload.last_id, "decoded snapshot");

    let last_id = payload.last_id;
    let rows = payload
        .rows
        .into_iter()
        .map(|row| row_to_stored(row, limits))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((rows, last_id))
}

impl MemoryRuleStore {
    /// Encode every row into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotEncodeError`] if bincode fails or the payload exceeds 4 GiB.
    pub fn to_snapshot(&self) -> Result<Vec<u8>, SnapshotEncodeError> {
        let (rows, last_id) = self.export();
        let bytes = encode(&rows, last_id)?;
        info!(rows = rows.len(), bytes = bytes.len(), "wrote snapshot");
        Ok(bytes)
    }

    /// Rebuild a store from bytes produced by [`to_snapshot`](Self::to_snapshot),
    /// with default [`Limits`].
    /// New ids continue after the highest id the snapshotted store had issued.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotDecodeError`] on format, integrity or validation failure.
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self, SnapshotDecodeError> {
        Self::from_snapshot_with_limits(bytes, &Limits::default())
    }

    /// Rebuild a store from a snapshot. Every stored tree must fit within
    /// `limits`; pass the limits the rules were written under.
    ///
    /// # Errors
    ///
    /// See [`from_snapshot`](Self::from_snapshot).
    pub fn from_snapshot_with_limits(
        bytes: &[u8],
        limits: &Limits,
    ) -> Result<Self, SnapshotDecodeError> {
        let (rows, last_id) = decode(bytes, limits)?;
        info!(rows = rows.len(), "restored snapshot");
        Ok(Self::restore(rows, last_id))
    }
}
