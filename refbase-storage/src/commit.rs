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

//! Commit Engine
//!
//! Validates an operation set against a branch head and applies it
//! atomically. Validation aggregates every conflict it finds before
//! failing, so one round trip is enough to fix a whole operation set.
//! Nothing is mutated until the final compare-and-swap on the branch head;
//! a lost race surfaces as a stale-hash failure, never as partial state.

use crate::objects::{Commit, ObjectId, Snapshot, SnapshotEntry, StoredOperation};
use crate::refs::{CasResult, RefEntry, RefStore};
use crate::store::CommitStore;
use refbase_core::{
    CatalogError, CommitMeta, Conflict, ConflictType, ContentId, ContentKey, ContentKind,
    ContentRecord, Operation, ReferenceKind, Result,
};
use std::collections::HashSet;

/// Applies operation sets to branch heads.
pub struct CommitEngine<'a> {
    store: &'a CommitStore,
    refs: &'a RefStore,
}

impl<'a> CommitEngine<'a> {
    pub fn new(store: &'a CommitStore, refs: &'a RefStore) -> Self {
        Self { store, refs }
    }

    /// Commit `operations` onto `branch`, expecting its head at `expected`.
    /// Returns the reference entry holding the new head.
    pub fn commit(
        &self,
        branch: &str,
        expected: ObjectId,
        operations: &[Operation],
        meta: CommitMeta,
    ) -> Result<RefEntry> {
        let entry = self.refs.require_kind(branch, ReferenceKind::Branch)?;
        if entry.head != expected {
            return Err(CatalogError::PreconditionFailed {
                expected: expected.to_hex(),
                actual: entry.head.to_hex(),
            });
        }

        let base_commit: Commit = self.store.get_required(&expected)?;
        let base: Snapshot = self.store.get_required(&base_commit.snapshot)?;

        let applied = self.apply_operations(&base, operations)?;
        if !applied.conflicts.is_empty() {
            tracing::debug!(
                branch,
                conflicts = applied.conflicts.len(),
                "commit rejected with conflicts"
            );
            return Err(CatalogError::ReferenceConflict(applied.conflicts));
        }

        let snapshot_id = self.store.put(&applied.snapshot)?;
        let commit = Commit::child(expected, snapshot_id, applied.operations, meta);
        let commit_id = self.store.put(&commit)?;

        match self.refs.compare_and_set(branch, expected, commit_id)? {
            CasResult::Updated(entry) => {
                tracing::debug!(
                    branch,
                    commit = %commit_id.short(),
                    operations = operations.len(),
                    "commit applied"
                );
                Ok(entry)
            }
            CasResult::Mismatch { actual } => Err(CatalogError::PreconditionFailed {
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            }),
        }
    }

    /// Run the operation set against `base`, collecting conflicts instead
    /// of stopping at the first. Earlier operations in the set are visible
    /// to later ones, which is what lets a client create a namespace and a
    /// table under it in one commit.
    fn apply_operations(&self, base: &Snapshot, operations: &[Operation]) -> Result<AppliedOps> {
        let mut snapshot = base.clone();
        let mut stored = Vec::with_capacity(operations.len());
        let mut conflicts = Vec::new();
        let mut reported = HashSet::new();
        let mut deleted_namespaces = Vec::new();

        for operation in operations {
            match operation {
                Operation::Put { key, content } => {
                    for ancestor in key.ancestors() {
                        match snapshot.get(&ancestor) {
                            None => report(
                                &mut conflicts,
                                &mut reported,
                                Conflict::namespace_absent(ancestor),
                            ),
                            Some(entry) if entry.kind != ContentKind::Namespace => report(
                                &mut conflicts,
                                &mut reported,
                                Conflict::not_a_namespace(ancestor),
                            ),
                            Some(_) => {}
                        }
                    }

                    // First creation mints the id; updates keep it.
                    let content_id = snapshot
                        .get(key)
                        .map(|e| e.content_id)
                        .unwrap_or_else(ContentId::random);
                    let record = ContentRecord::new(content_id, content.clone());
                    let value = self.store.put(&record)?;
                    let kind = content.kind();
                    snapshot.upsert(SnapshotEntry {
                        key: key.clone(),
                        content_id,
                        kind,
                        value,
                    });
                    stored.push(StoredOperation::Put {
                        key: key.clone(),
                        content_id,
                        kind,
                        value,
                    });
                }
                Operation::Delete { key } => match snapshot.remove(key) {
                    None => report(
                        &mut conflicts,
                        &mut reported,
                        Conflict::key_does_not_exist(key.clone()),
                    ),
                    Some(removed) => {
                        if removed.kind == ContentKind::Namespace {
                            deleted_namespaces.push(key.clone());
                        }
                        stored.push(StoredOperation::Delete { key: key.clone() });
                    }
                },
            }
        }

        // Namespace emptiness is judged after the whole set, so deleting a
        // namespace and its children together stays legal in either order.
        for key in deleted_namespaces {
            if snapshot.has_children(&key) {
                report(
                    &mut conflicts,
                    &mut reported,
                    Conflict::namespace_not_empty(key),
                );
            }
        }

        Ok(AppliedOps {
            snapshot,
            operations: stored,
            conflicts,
        })
    }
}

struct AppliedOps {
    snapshot: Snapshot,
    operations: Vec<StoredOperation>,
    conflicts: Vec<Conflict>,
}

/// Push a conflict unless the same finding was already recorded for the
/// same key (two Puts under one missing namespace report it once).
fn report(
    conflicts: &mut Vec<Conflict>,
    reported: &mut HashSet<(ConflictType, ContentKey)>,
    conflict: Conflict,
) {
    if reported.insert((conflict.conflict_type, conflict.key.clone())) {
        conflicts.push(conflict);
    }
}
