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

//! Reference Store
//!
//! The only shared mutable state in the catalog: the name -> head table.
//! Mutations of a single reference serialize through a per-name
//! compare-and-swap; distinct references update fully in parallel. A CAS
//! either installs the new head or reports the observed one - there is no
//! partial state for a loser to see.

use crate::objects::ObjectId;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use refbase_core::{validate_reference_name, CatalogError, RefNameError, ReferenceKind};
use thiserror::Error;

/// Reference store errors
#[derive(Debug, Error)]
pub enum RefError {
    #[error("Reference not found: {0}")]
    NotFound(String),

    #[error("Reference already exists: {0}")]
    AlreadyExists(String),

    #[error(transparent)]
    InvalidName(#[from] RefNameError),

    #[error("Reference {name} is a {actual}, not a {expected}")]
    KindMismatch {
        name: String,
        expected: ReferenceKind,
        actual: ReferenceKind,
    },
}

impl From<RefError> for CatalogError {
    fn from(err: RefError) -> Self {
        match err {
            RefError::NotFound(name) => CatalogError::ReferenceNotFound(name),
            RefError::AlreadyExists(name) => CatalogError::ReferenceAlreadyExists(name),
            RefError::InvalidName(e) => CatalogError::BadRequest(e.to_string()),
            kind @ RefError::KindMismatch { .. } => CatalogError::BadRequest(kind.to_string()),
        }
    }
}

/// One named pointer into the commit graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub name: String,
    pub kind: ReferenceKind,
    pub head: ObjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefEntry {
    fn new(name: impl Into<String>, kind: ReferenceKind, head: ObjectId) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            kind,
            head,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of a compare-and-swap on one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasResult {
    /// The head moved; the returned entry is the post-update state.
    Updated(RefEntry),
    /// The expected hash was stale; `actual` is the head that was observed.
    Mismatch { actual: ObjectId },
}

/// Name -> head table with per-name CAS.
pub struct RefStore {
    refs: DashMap<String, RefEntry>,
}

impl RefStore {
    pub fn new() -> Self {
        Self {
            refs: DashMap::new(),
        }
    }

    /// Create a reference, failing if the name is taken or invalid.
    pub fn create(
        &self,
        name: &str,
        kind: ReferenceKind,
        head: ObjectId,
    ) -> Result<RefEntry, RefError> {
        validate_reference_name(name)?;
        match self.refs.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RefError::AlreadyExists(name.to_string())),
            Entry::Vacant(vacant) => {
                let entry = RefEntry::new(name, kind, head);
                vacant.insert(entry.clone());
                tracing::debug!(name, kind = %kind, head = %head.short(), "reference created");
                Ok(entry)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<RefEntry> {
        self.refs.get(name).map(|r| r.clone())
    }

    pub fn require(&self, name: &str) -> Result<RefEntry, RefError> {
        self.get(name).ok_or_else(|| RefError::NotFound(name.to_string()))
    }

    /// Like [`Self::require`], also checking the reference kind.
    pub fn require_kind(&self, name: &str, kind: ReferenceKind) -> Result<RefEntry, RefError> {
        let entry = self.require(name)?;
        if entry.kind != kind {
            return Err(RefError::KindMismatch {
                name: name.to_string(),
                expected: kind,
                actual: entry.kind,
            });
        }
        Ok(entry)
    }

    /// Atomically move `name` from `expected` to `new`. Exactly one of two
    /// racing callers wins; the loser gets back the head it lost to.
    pub fn compare_and_set(
        &self,
        name: &str,
        expected: ObjectId,
        new: ObjectId,
    ) -> Result<CasResult, RefError> {
        match self.refs.entry(name.to_string()) {
            Entry::Vacant(_) => Err(RefError::NotFound(name.to_string())),
            Entry::Occupied(mut occupied) => {
                if occupied.get().head != expected {
                    let actual = occupied.get().head;
                    tracing::debug!(
                        name,
                        expected = %expected.short(),
                        actual = %actual.short(),
                        "compare-and-set lost"
                    );
                    return Ok(CasResult::Mismatch { actual });
                }
                let entry = occupied.get_mut();
                entry.head = new;
                entry.updated_at = Utc::now();
                Ok(CasResult::Updated(entry.clone()))
            }
        }
    }

    /// Delete a reference of the given kind, returning the removed entry.
    pub fn delete(&self, name: &str, kind: ReferenceKind) -> Result<RefEntry, RefError> {
        match self.refs.entry(name.to_string()) {
            Entry::Vacant(_) => Err(RefError::NotFound(name.to_string())),
            Entry::Occupied(occupied) => {
                if occupied.get().kind != kind {
                    return Err(RefError::KindMismatch {
                        name: name.to_string(),
                        expected: kind,
                        actual: occupied.get().kind,
                    });
                }
                let entry = occupied.remove();
                tracing::debug!(name, "reference deleted");
                Ok(entry)
            }
        }
    }

    /// All references, sorted by name.
    pub fn list(&self) -> Vec<RefEntry> {
        let mut entries: Vec<RefEntry> = self.refs.iter().map(|r| r.clone()).collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

impl Default for RefStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn oid(data: &[u8]) -> ObjectId {
        ObjectId::from_content(data)
    }

    #[test]
    fn test_create_and_get() {
        let store = RefStore::new();
        let head = oid(b"c1");
        store.create("main", ReferenceKind::Branch, head).unwrap();

        let entry = store.get("main").unwrap();
        assert_eq!(entry.kind, ReferenceKind::Branch);
        assert_eq!(entry.head, head);

        assert!(matches!(
            store.create("main", ReferenceKind::Branch, head),
            Err(RefError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.create("bad name", ReferenceKind::Branch, head),
            Err(RefError::InvalidName(_))
        ));
    }

    #[test]
    fn test_compare_and_set() {
        let store = RefStore::new();
        let c1 = oid(b"c1");
        let c2 = oid(b"c2");
        let c3 = oid(b"c3");
        store.create("main", ReferenceKind::Branch, c1).unwrap();

        match store.compare_and_set("main", c1, c2).unwrap() {
            CasResult::Updated(entry) => assert_eq!(entry.head, c2),
            other => panic!("expected update, got {other:?}"),
        }

        // Stale expectation observes the winner's head.
        match store.compare_and_set("main", c1, c3).unwrap() {
            CasResult::Mismatch { actual } => assert_eq!(actual, c2),
            other => panic!("expected mismatch, got {other:?}"),
        }
        assert_eq!(store.get("main").unwrap().head, c2);
    }

    #[test]
    fn test_concurrent_cas_single_winner() {
        let store = Arc::new(RefStore::new());
        let base = oid(b"base");
        store.create("main", ReferenceKind::Branch, base).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let new = oid(format!("commit-{i}").as_bytes());
                    matches!(
                        store.compare_and_set("main", base, new).unwrap(),
                        CasResult::Updated(_)
                    )
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(wins, 1);
        assert_ne!(store.get("main").unwrap().head, base);
    }

    #[test]
    fn test_delete_checks_kind() {
        let store = RefStore::new();
        let head = oid(b"c1");
        store.create("v1.0", ReferenceKind::Tag, head).unwrap();

        assert!(matches!(
            store.delete("v1.0", ReferenceKind::Branch),
            Err(RefError::KindMismatch { .. })
        ));
        store.delete("v1.0", ReferenceKind::Tag).unwrap();
        assert!(store.get("v1.0").is_none());
    }

    #[test]
    fn test_list_sorted() {
        let store = RefStore::new();
        let head = oid(b"c1");
        store.create("zeta", ReferenceKind::Branch, head).unwrap();
        store.create("alpha", ReferenceKind::Branch, head).unwrap();

        let names: Vec<String> = store.list().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
