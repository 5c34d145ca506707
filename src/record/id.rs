//! Record identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for the name-based hash behind generated ids
const RECORD_NAMESPACE: Uuid = Uuid::from_u128(0x6c65_7873_7061_4e00_8000_0000_6c65_7869);

/// Unique identifier for an annotation record
///
/// Serializes as a plain string. Generated ids are fixed width:
/// `lex_<millis:13>_<batch:04>_<item:05>_<hash:08x>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Derive an id from the record's content, its batch/item position and a
    /// timestamp.
    ///
    /// The hash covers target, context and both indices; the indices and the
    /// timestamp are also spelled out in the id.
    pub fn generate(
        target: &str,
        context: &str,
        batch_index: usize,
        item_index: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let name = format!("{target}\u{1f}{context}\u{1f}{batch_index}\u{1f}{item_index}");
        let digest = Uuid::new_v5(&RECORD_NAMESPACE, name.as_bytes());
        let bytes = digest.as_bytes();
        let hash = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let millis = now.timestamp_millis().max(0);
        Self(format!(
            "lex_{millis:013}_{batch:04}_{item:05}_{hash:08x}",
            batch = batch_index % 10_000,
            item = item_index % 100_000,
        ))
    }

    /// Wrap an existing id string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
