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

//! Catalog - High-Level Versioned Catalog Interface
//!
//! Ties the stores and engines together behind one handle: reference CRUD,
//! conflict-checked commits, merge/transplant, content lookup, entry
//! listing, history and diff. A fresh catalog bootstraps with an empty root
//! commit and the default branch pointing at it, so every reference always
//! has a concrete head hash.

use crate::commit::CommitEngine;
use crate::config::CatalogConfig;
use crate::diff::{DiffEngine, DiffEntry};
use crate::merge::MergeEngine;
use crate::objects::{Commit, ObjectId, Snapshot};
use crate::refs::{CasResult, RefEntry, RefStore};
use crate::resolve::{Resolved, Resolver};
use crate::store::CommitStore;
use refbase_core::{
    CatalogError, CommitMeta, ContentId, ContentKey, ContentKind, ContentRecord, Operation,
    ReferenceKind, Result,
};

/// One row of an entry listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub key: ContentKey,
    pub content_id: ContentId,
    pub kind: ContentKind,
}

/// One row of a history listing, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub hash: ObjectId,
    pub parent: Option<ObjectId>,
    pub meta: CommitMeta,
}

/// The versioned catalog.
pub struct Catalog {
    store: CommitStore,
    refs: RefStore,
    config: CatalogConfig,
}

impl Catalog {
    /// Create a catalog with the root commit and default branch in place.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let store = CommitStore::new();
        let refs = RefStore::new();

        let snapshot_id = store.put(&Snapshot::empty())?;
        let root = store.put(&Commit::root(
            snapshot_id,
            CommitMeta::from_message("repository initialized"),
        ))?;
        refs.create(&config.default_branch, ReferenceKind::Branch, root)?;
        tracing::info!(
            default_branch = %config.default_branch,
            root = %root.short(),
            "catalog initialized"
        );

        Ok(Self {
            store,
            refs,
            config,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn store(&self) -> &CommitStore {
        &self.store
    }

    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.store, &self.refs, &self.config.default_branch)
    }

    /// Resolve a reference spec. `for_write` rejects relative refinements.
    pub fn resolve(&self, spec: &str, for_write: bool) -> Result<Resolved> {
        self.resolver().resolve(spec, for_write)
    }

    /// Resolve a standalone hash string (full id or unique prefix).
    pub fn lookup_hash(&self, hex: &str) -> Result<ObjectId> {
        self.resolver().lookup_hash(hex)
    }

    // === References ===

    /// Create a branch or tag. Without `from`, the new reference starts at
    /// the default branch's current head.
    pub fn create_reference(
        &self,
        name: &str,
        kind: ReferenceKind,
        from: Option<&str>,
    ) -> Result<RefEntry> {
        let hash = match from {
            Some(spec) => self.resolve(spec, false)?.hash,
            None => self.refs.require(&self.config.default_branch)?.head,
        };
        Ok(self.refs.create(name, kind, hash)?)
    }

    /// Resolve a spec to a named reference. Detached specs are rejected
    /// here; they address commits, not references.
    pub fn get_reference(&self, spec: &str) -> Result<(RefEntry, ObjectId)> {
        let resolved = self.resolve(spec, false)?;
        let name = resolved.name.as_deref().ok_or_else(|| {
            CatalogError::bad_request("a reference name is required, not a detached hash")
        })?;
        Ok((self.refs.require(name)?, resolved.hash))
    }

    pub fn list_references(&self) -> Vec<RefEntry> {
        self.refs.list()
    }

    /// Reassign a branch or tag head to an already existing commit.
    pub fn assign_reference(
        &self,
        name: &str,
        kind: ReferenceKind,
        expected: ObjectId,
        to: ObjectId,
    ) -> Result<RefEntry> {
        self.refs.require_kind(name, kind)?;
        self.store.get_required::<Commit>(&to)?;
        match self.refs.compare_and_set(name, expected, to)? {
            CasResult::Updated(entry) => Ok(entry),
            CasResult::Mismatch { actual } => Err(CatalogError::PreconditionFailed {
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            }),
        }
    }

    /// Delete a reference. The default branch is not deletable.
    pub fn delete_reference(&self, name: &str, kind: ReferenceKind) -> Result<RefEntry> {
        if name == self.config.default_branch {
            return Err(CatalogError::bad_request(
                "the default branch cannot be deleted",
            ));
        }
        Ok(self.refs.delete(name, kind)?)
    }

    // === Mutations ===

    /// Commit an operation set onto a branch, returning the new head.
    pub fn commit(
        &self,
        branch: &str,
        expected: ObjectId,
        operations: &[Operation],
        meta: CommitMeta,
    ) -> Result<RefEntry> {
        CommitEngine::new(&self.store, &self.refs).commit(branch, expected, operations, meta)
    }

    pub fn merge(
        &self,
        target: &str,
        expected: ObjectId,
        from_ref: &str,
        from_hash: ObjectId,
    ) -> Result<RefEntry> {
        MergeEngine::new(&self.store, &self.refs, self.config.merge_walk_limit)
            .merge(target, expected, from_ref, from_hash)
    }

    pub fn transplant(
        &self,
        target: &str,
        expected: ObjectId,
        from_ref: &str,
        hashes: &[ObjectId],
    ) -> Result<RefEntry> {
        MergeEngine::new(&self.store, &self.refs, self.config.merge_walk_limit)
            .transplant(target, expected, from_ref, hashes)
    }

    // === Reads ===

    /// The full keyed state at a resolved spec, in key order.
    pub fn entries(&self, spec: &str) -> Result<Vec<EntryInfo>> {
        let resolved = self.resolve(spec, false)?;
        let snapshot = self.snapshot_at(resolved.hash)?;
        Ok(snapshot
            .iter()
            .map(|e| EntryInfo {
                key: e.key.clone(),
                content_id: e.content_id,
                kind: e.kind,
            })
            .collect())
    }

    /// Single-key lookup at a resolved spec.
    pub fn content(&self, spec: &str, key: &ContentKey) -> Result<Option<ContentRecord>> {
        let resolved = self.resolve(spec, false)?;
        self.content_at(resolved.hash, key)
    }

    /// Multi-key lookup; absent keys are skipped, the resolved reference is
    /// returned so the boundary can report the effective hash.
    pub fn contents(
        &self,
        spec: &str,
        keys: &[ContentKey],
    ) -> Result<(Vec<(ContentKey, ContentRecord)>, Resolved)> {
        let resolved = self.resolve(spec, false)?;
        let snapshot = self.snapshot_at(resolved.hash)?;
        let mut found = Vec::new();
        for key in keys {
            if let Some(entry) = snapshot.get(key) {
                let record: ContentRecord = self.store.get_required(&entry.value)?;
                found.push((key.clone(), record));
            }
        }
        Ok((found, resolved))
    }

    /// Commit log from a resolved spec, newest first, bounded by the
    /// configured page limit.
    pub fn history(&self, spec: &str, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        let resolved = self.resolve(spec, false)?;
        let max = limit
            .unwrap_or(self.config.history_page_limit)
            .min(self.config.history_page_limit);

        let mut entries = Vec::new();
        let mut current = Some(resolved.hash);
        while let Some(hash) = current {
            if entries.len() >= max {
                break;
            }
            let commit: Commit = self.store.get_required(&hash)?;
            entries.push(HistoryEntry {
                hash,
                parent: commit.parent,
                meta: commit.meta,
            });
            current = commit.parent;
        }
        Ok(entries)
    }

    /// Key-level diff between two independently resolved specs.
    pub fn diff(&self, left_spec: &str, right_spec: &str) -> Result<Vec<DiffEntry>> {
        let left = self.resolve(left_spec, false)?;
        let right = self.resolve(right_spec, false)?;
        DiffEngine::new(&self.store).diff_commits(left.hash, right.hash)
    }

    // === Helpers ===

    fn content_at(&self, commit_id: ObjectId, key: &ContentKey) -> Result<Option<ContentRecord>> {
        let snapshot = self.snapshot_at(commit_id)?;
        snapshot
            .get(key)
            .map(|entry| Ok(self.store.get_required(&entry.value)?))
            .transpose()
    }

    fn snapshot_at(&self, commit_id: ObjectId) -> Result<Snapshot> {
        let commit: Commit = self.store.get_required(&commit_id)?;
        Ok(self.store.get_required(&commit.snapshot)?)
    }
}
