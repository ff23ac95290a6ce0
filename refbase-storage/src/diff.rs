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

//! Diff Engine
//!
//! Key-level comparison of two resolved commits. Values are opaque, so a
//! difference is "the payloads are not the same bytes", reported per key in
//! key order with both sides attached.

use crate::objects::{Commit, ObjectId, Snapshot, SnapshotEntry};
use crate::store::CommitStore;
use refbase_core::{ContentKey, ContentRecord, Result};
use serde::{Deserialize, Serialize};

/// One differing key. Insertions and deletions leave the absent side None.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub key: ContentKey,
    pub left: Option<ContentRecord>,
    pub right: Option<ContentRecord>,
}

/// Summary counts over a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
}

impl DiffStats {
    pub fn of(entries: &[DiffEntry]) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            match (&entry.left, &entry.right) {
                (None, Some(_)) => stats.added += 1,
                (Some(_), None) => stats.removed += 1,
                _ => stats.changed += 1,
            }
        }
        stats
    }
}

/// Compares resolved commits key by key.
pub struct DiffEngine<'a> {
    store: &'a CommitStore,
}

impl<'a> DiffEngine<'a> {
    pub fn new(store: &'a CommitStore) -> Self {
        Self { store }
    }

    /// Diff two commits. Equal ids short-circuit to an empty result.
    pub fn diff_commits(&self, left: ObjectId, right: ObjectId) -> Result<Vec<DiffEntry>> {
        if left == right {
            return Ok(Vec::new());
        }
        let left_snap = self.snapshot_at(left)?;
        let right_snap = self.snapshot_at(right)?;
        self.diff_snapshots(&left_snap, &right_snap)
    }

    fn diff_snapshots(&self, left: &Snapshot, right: &Snapshot) -> Result<Vec<DiffEntry>> {
        let mut entries = Vec::new();
        let mut left_iter = left.iter().peekable();
        let mut right_iter = right.iter().peekable();

        loop {
            let (key, left_entry, right_entry): (ContentKey, Option<_>, Option<_>) =
                match (left_iter.peek(), right_iter.peek()) {
                    (None, None) => break,
                    (Some(l), None) => {
                        let l = (*l).clone();
                        left_iter.next();
                        (l.key.clone(), Some(l), None)
                    }
                    (None, Some(r)) => {
                        let r = (*r).clone();
                        right_iter.next();
                        (r.key.clone(), None, Some(r))
                    }
                    (Some(l), Some(r)) => match l.key.cmp(&r.key) {
                        std::cmp::Ordering::Less => {
                            let l = (*l).clone();
                            left_iter.next();
                            (l.key.clone(), Some(l), None)
                        }
                        std::cmp::Ordering::Greater => {
                            let r = (*r).clone();
                            right_iter.next();
                            (r.key.clone(), None, Some(r))
                        }
                        std::cmp::Ordering::Equal => {
                            let l = (*l).clone();
                            let r = (*r).clone();
                            left_iter.next();
                            right_iter.next();
                            if l.value == r.value {
                                continue;
                            }
                            (l.key.clone(), Some(l), Some(r))
                        }
                    },
                };
            entries.push(DiffEntry {
                key,
                left: self.load(left_entry)?,
                right: self.load(right_entry)?,
            });
        }
        Ok(entries)
    }

    fn load(&self, entry: Option<SnapshotEntry>) -> Result<Option<ContentRecord>> {
        entry
            .map(|e| Ok(self.store.get_required(&e.value)?))
            .transpose()
    }

    fn snapshot_at(&self, commit_id: ObjectId) -> Result<Snapshot> {
        let commit: Commit = self.store.get_required(&commit_id)?;
        Ok(self.store.get_required(&commit.snapshot)?)
    }
}
