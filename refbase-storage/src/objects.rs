// Copyright 2025 Refbase Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Commit Graph Objects
//!
//! Content-addressable objects: content records, snapshots, commits.
//! All objects are immutable once created; ids are BLAKE3 over the
//! serialized form, so identical objects deduplicate for free.

use blake3::Hasher;
use refbase_core::{CommitMeta, ContentId, ContentKey, ContentKind, ContentRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Object ID - BLAKE3 hash (32 bytes) of the serialized object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub [u8; 32]);

impl ObjectId {
    /// Create from content bytes (content-addressable)
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(content);
        Self(hasher.finalize().into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex form for logs and messages (8 bytes, 16 chars)
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// Full hex representation (64 chars)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a full 64-char hex id
    pub fn from_hex(hex_str: &str) -> Result<Self, ObjectIdParseError> {
        let bytes = hex::decode(hex_str).map_err(|_| ObjectIdParseError::InvalidHex)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ObjectIdParseError::InvalidLength)?;
        Ok(Self(arr))
    }

    /// Whether this id's hex form starts with the given (lowercase) prefix
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.to_hex().starts_with(prefix)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectIdParseError {
    #[error("invalid hex string")]
    InvalidHex,
    #[error("invalid length (expected 32 bytes)")]
    InvalidLength,
}

/// Object type tag, stored alongside the bytes so typed reads can fail
/// fast instead of misinterpreting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectType {
    /// One keyed payload with its stable content id
    Content = 1,
    /// Full keyed state at a commit
    Snapshot = 2,
    /// History node: parent link, operations, metadata
    Commit = 3,
}

/// Trait for content-addressable catalog objects
pub trait CatalogObject: Sized + Serialize + for<'de> Deserialize<'de> {
    const TYPE: ObjectType;

    fn serialize_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap()
    }

    fn deserialize_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }

    fn object_id(&self) -> ObjectId {
        ObjectId::from_content(&self.serialize_bytes())
    }
}

impl CatalogObject for ContentRecord {
    const TYPE: ObjectType = ObjectType::Content;
}

/// One key's slot in a snapshot. The kind is denormalized so namespace
/// checks never load payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: ContentKey,
    pub content_id: ContentId,
    pub kind: ContentKind,
    /// Id of the [`ContentRecord`] object holding the payload
    pub value: ObjectId,
}

/// The full keyed state at a commit, sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &ContentKey) -> Option<&SnapshotEntry> {
        self.entries
            .binary_search_by(|e| e.key.cmp(key))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn contains_key(&self, key: &ContentKey) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace the entry for its key, keeping sort order.
    pub fn upsert(&mut self, entry: SnapshotEntry) {
        match self.entries.binary_search_by(|e| e.key.cmp(&entry.key)) {
            Ok(idx) => self.entries[idx] = entry,
            Err(idx) => self.entries.insert(idx, entry),
        }
    }

    pub fn remove(&mut self, key: &ContentKey) -> Option<SnapshotEntry> {
        match self.entries.binary_search_by(|e| e.key.cmp(key)) {
            Ok(idx) => Some(self.entries.remove(idx)),
            Err(_) => None,
        }
    }

    /// Whether any entry lives below `key` (making it a non-empty namespace).
    pub fn has_children(&self, key: &ContentKey) -> bool {
        let start = match self.entries.binary_search_by(|e| e.key.cmp(key)) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        };
        self.entries[start..]
            .first()
            .is_some_and(|e| e.key.is_descendant_of(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.iter()
    }
}

impl CatalogObject for Snapshot {
    const TYPE: ObjectType = ObjectType::Snapshot;
}

/// One keyed change as recorded in a commit. Unlike the client-facing
/// operation, the payload is referenced by object id; the record itself is
/// stored once and shared by every snapshot containing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredOperation {
    Put {
        key: ContentKey,
        content_id: ContentId,
        kind: ContentKind,
        value: ObjectId,
    },
    Delete {
        key: ContentKey,
    },
}

impl StoredOperation {
    pub fn key(&self) -> &ContentKey {
        match self {
            StoredOperation::Put { key, .. } => key,
            StoredOperation::Delete { key } => key,
        }
    }
}

/// History node. The operation list is what this commit changed relative
/// to its parent; the snapshot id is the resulting full state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// None only for the root commit
    pub parent: Option<ObjectId>,
    pub snapshot: ObjectId,
    pub operations: Vec<StoredOperation>,
    pub meta: CommitMeta,
}

impl Commit {
    pub fn root(snapshot: ObjectId, meta: CommitMeta) -> Self {
        Self {
            parent: None,
            snapshot,
            operations: Vec::new(),
            meta,
        }
    }

    pub fn child(
        parent: ObjectId,
        snapshot: ObjectId,
        operations: Vec<StoredOperation>,
        meta: CommitMeta,
    ) -> Self {
        Self {
            parent: Some(parent),
            snapshot,
            operations,
            meta,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl CatalogObject for Commit {
    const TYPE: ObjectType = ObjectType::Commit;
}

#[cfg(test)]
mod tests {
    use super::*;
    use refbase_core::Content;

    fn entry(path: &[&str]) -> SnapshotEntry {
        SnapshotEntry {
            key: ContentKey::new(path.to_vec()).unwrap(),
            content_id: ContentId::random(),
            kind: ContentKind::Value,
            value: ObjectId::from_content(path.join("/").as_bytes()),
        }
    }

    #[test]
    fn test_object_id_from_content() {
        let a = ObjectId::from_content(b"hello");
        let b = ObjectId::from_content(b"hello");
        let c = ObjectId::from_content(b"other");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_object_id_hex_roundtrip() {
        let oid = ObjectId::from_content(b"test");
        let parsed = ObjectId::from_hex(&oid.to_hex()).unwrap();
        assert_eq!(oid, parsed);
        assert!(oid.matches_prefix(&oid.short()));
        assert!(ObjectId::from_hex("zz").is_err());
        assert!(ObjectId::from_hex("cafebabe").is_err());
    }

    #[test]
    fn test_snapshot_ordering_and_lookup() {
        let mut snapshot = Snapshot::empty();
        snapshot.upsert(entry(&["b"]));
        snapshot.upsert(entry(&["a", "x"]));
        snapshot.upsert(entry(&["a"]));

        let keys: Vec<String> = snapshot.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["a", "a.x", "b"]);

        let key = ContentKey::new(["a", "x"]).unwrap();
        assert!(snapshot.contains_key(&key));
        assert!(snapshot.remove(&key).is_some());
        assert!(!snapshot.contains_key(&key));
    }

    #[test]
    fn test_snapshot_upsert_replaces() {
        let mut snapshot = Snapshot::empty();
        snapshot.upsert(entry(&["a"]));
        let mut replacement = entry(&["a"]);
        replacement.kind = ContentKind::Namespace;
        snapshot.upsert(replacement);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot
                .get(&ContentKey::new(["a"]).unwrap())
                .unwrap()
                .kind,
            ContentKind::Namespace
        );
    }

    #[test]
    fn test_snapshot_has_children() {
        let mut snapshot = Snapshot::empty();
        snapshot.upsert(entry(&["ns"]));
        snapshot.upsert(entry(&["ns", "table"]));
        snapshot.upsert(entry(&["other"]));

        let ns = ContentKey::new(["ns"]).unwrap();
        let other = ContentKey::new(["other"]).unwrap();
        assert!(snapshot.has_children(&ns));
        assert!(!snapshot.has_children(&other));

        snapshot.remove(&ContentKey::new(["ns", "table"]).unwrap());
        assert!(!snapshot.has_children(&ns));
    }

    #[test]
    fn test_commit_object_ids_are_content_addressed() {
        let snapshot = Snapshot::empty();
        let snapshot_id = snapshot.object_id();
        let meta = CommitMeta::from_message("init").with_timestamp(chrono::Utc::now());
        let root = Commit::root(snapshot_id, meta.clone());
        assert!(root.is_root());
        assert_eq!(root.object_id(), Commit::root(snapshot_id, meta).object_id());
    }

    #[test]
    fn test_content_record_roundtrip() {
        let record = ContentRecord::new(ContentId::random(), Content::value(b"payload".to_vec()));
        let bytes = record.serialize_bytes();
        let back = ContentRecord::deserialize_bytes(&bytes).unwrap();
        assert_eq!(record, back);
        assert_eq!(record.object_id(), back.object_id());
    }
}
