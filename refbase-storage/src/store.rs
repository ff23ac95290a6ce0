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

//! Commit Store - Content-Addressable Object Storage
//!
//! Append-only storage for commit-graph objects (content records,
//! snapshots, commits). Identical objects share one slot; nothing is ever
//! mutated or deleted, so concurrent readers never observe partial writes.

use crate::objects::{CatalogObject, Commit, ObjectId, ObjectType};
use dashmap::DashMap;
use refbase_core::CatalogError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(ObjectId),

    #[error("Commit not found for hash prefix: {0}")]
    PrefixNotFound(String),

    #[error("Hash prefix is ambiguous: {0}")]
    AmbiguousPrefix(String),

    #[error("Type mismatch: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(oid) => CatalogError::ObjectNotFound(oid.to_hex()),
            StoreError::PrefixNotFound(prefix) => CatalogError::ObjectNotFound(prefix),
            StoreError::AmbiguousPrefix(prefix) => CatalogError::BadRequest(format!(
                "hash prefix '{prefix}' matches more than one commit"
            )),
            other => CatalogError::Internal(other.to_string()),
        }
    }
}

/// Stored object with its type tag
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredObject {
    obj_type: ObjectType,
    data: Vec<u8>,
}

/// Store statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_objects: u64,
    pub content_count: u64,
    pub snapshot_count: u64,
    pub commit_count: u64,
    pub total_size_bytes: u64,
}

/// In-memory content-addressed store for the commit graph.
pub struct CommitStore {
    objects: DashMap<ObjectId, StoredObject>,
    content_count: AtomicU64,
    snapshot_count: AtomicU64,
    commit_count: AtomicU64,
    total_size: AtomicU64,
}

impl CommitStore {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            content_count: AtomicU64::new(0),
            snapshot_count: AtomicU64::new(0),
            commit_count: AtomicU64::new(0),
            total_size: AtomicU64::new(0),
        }
    }

    /// Store an object (idempotent - same content, same id)
    pub fn put<T: CatalogObject>(&self, obj: &T) -> Result<ObjectId, StoreError> {
        let data = obj.serialize_bytes();
        let oid = ObjectId::from_content(&data);

        if self.objects.contains_key(&oid) {
            return Ok(oid);
        }

        match T::TYPE {
            ObjectType::Content => self.content_count.fetch_add(1, Ordering::Relaxed),
            ObjectType::Snapshot => self.snapshot_count.fetch_add(1, Ordering::Relaxed),
            ObjectType::Commit => self.commit_count.fetch_add(1, Ordering::Relaxed),
        };
        self.total_size
            .fetch_add(data.len() as u64, Ordering::Relaxed);

        self.objects.insert(
            oid,
            StoredObject {
                obj_type: T::TYPE,
                data,
            },
        );
        Ok(oid)
    }

    /// Get an object by id
    pub fn get<T: CatalogObject>(&self, oid: &ObjectId) -> Result<Option<T>, StoreError> {
        match self.objects.get(oid) {
            Some(stored) => {
                if stored.obj_type != T::TYPE {
                    return Err(StoreError::TypeMismatch {
                        expected: T::TYPE,
                        actual: stored.obj_type,
                    });
                }
                let obj = T::deserialize_bytes(&stored.data)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(obj))
            }
            None => Ok(None),
        }
    }

    /// Get an object, failing if absent
    pub fn get_required<T: CatalogObject>(&self, oid: &ObjectId) -> Result<T, StoreError> {
        self.get(oid)?.ok_or(StoreError::NotFound(*oid))
    }

    pub fn exists(&self, oid: &ObjectId) -> bool {
        self.objects.contains_key(oid)
    }

    pub fn get_type(&self, oid: &ObjectId) -> Option<ObjectType> {
        self.objects.get(oid).map(|s| s.obj_type)
    }

    /// Resolve a (lowercase) hex prefix to the commit it identifies.
    /// A full 64-char id short-circuits; shorter prefixes must match
    /// exactly one stored commit.
    pub fn find_commit(&self, prefix: &str) -> Result<ObjectId, StoreError> {
        if prefix.len() == 64 {
            let oid = ObjectId::from_hex(prefix)
                .map_err(|_| StoreError::PrefixNotFound(prefix.to_string()))?;
            return match self.get_type(&oid) {
                Some(ObjectType::Commit) => Ok(oid),
                _ => Err(StoreError::PrefixNotFound(prefix.to_string())),
            };
        }

        let mut found: Option<ObjectId> = None;
        for item in self.objects.iter() {
            if item.value().obj_type == ObjectType::Commit && item.key().matches_prefix(prefix) {
                if found.is_some() {
                    return Err(StoreError::AmbiguousPrefix(prefix.to_string()));
                }
                found = Some(*item.key());
            }
        }
        found.ok_or_else(|| StoreError::PrefixNotFound(prefix.to_string()))
    }

    /// Load the commit behind an id, failing on non-commit objects.
    pub fn commit(&self, oid: &ObjectId) -> Result<Commit, StoreError> {
        self.get_required(oid)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_objects: self.objects.len() as u64,
            content_count: self.content_count.load(Ordering::Relaxed),
            snapshot_count: self.snapshot_count.load(Ordering::Relaxed),
            commit_count: self.commit_count.load(Ordering::Relaxed),
            total_size_bytes: self.total_size.load(Ordering::Relaxed),
        }
    }
}

impl Default for CommitStore {
    fn default() -> Self {
        Self::new()
    }
}
