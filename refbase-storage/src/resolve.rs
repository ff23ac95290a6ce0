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

//! Reference resolution.
//!
//! Turns a parsed [`RefSpec`] into a concrete commit id: default-marker
//! lookup, named-reference lookup, anchor hashes (full or prefix), and the
//! relative refinements `~N`, `^N`, `*ts`. Relative refinements are legal
//! for reads only; resolution for a mutation rejects them before touching
//! the graph.

use crate::objects::{Commit, ObjectId};
use crate::refs::RefStore;
use crate::store::CommitStore;
use chrono::{DateTime, Utc};
use refbase_core::{CatalogError, RefSpec, RefSpecBase, ReferenceKind, RelativePart, Result};

/// Outcome of resolving a spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The reference the spec went through; None for detached specs.
    pub name: Option<String>,
    pub kind: Option<ReferenceKind>,
    pub hash: ObjectId,
}

/// Resolves reference specs against the stores.
pub struct Resolver<'a> {
    store: &'a CommitStore,
    refs: &'a RefStore,
    default_branch: &'a str,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a CommitStore, refs: &'a RefStore, default_branch: &'a str) -> Self {
        Self {
            store,
            refs,
            default_branch,
        }
    }

    /// Resolve a raw spec string. `for_write` rejects relative refinements.
    pub fn resolve(&self, spec: &str, for_write: bool) -> Result<Resolved> {
        let parsed = RefSpec::parse(spec)?;
        self.resolve_parsed(&parsed, for_write)
    }

    pub fn resolve_parsed(&self, spec: &RefSpec, for_write: bool) -> Result<Resolved> {
        if for_write && spec.has_relative_parts() {
            return Err(CatalogError::relative_hash_not_allowed());
        }

        let (name, kind, head) = match &spec.base {
            RefSpecBase::Default => {
                let entry = self.refs.require(self.default_branch)?;
                (Some(entry.name), Some(entry.kind), Some(entry.head))
            }
            RefSpecBase::Named(name) => {
                let entry = self.refs.require(name)?;
                (Some(entry.name), Some(entry.kind), Some(entry.head))
            }
            RefSpecBase::Detached => (None, None, None),
        };

        let mut hash = match &spec.anchor {
            Some(prefix) => self.store.find_commit(prefix)?,
            None => head.ok_or_else(|| {
                CatalogError::bad_request("detached reference spec requires a hash")
            })?,
        };

        for part in &spec.relative {
            hash = self.apply_relative(hash, part)?;
        }

        Ok(Resolved { name, kind, hash })
    }

    /// Look up a standalone hash (full id or unique prefix) as a commit.
    pub fn lookup_hash(&self, hex: &str) -> Result<ObjectId> {
        Ok(self.store.find_commit(hex)?)
    }

    fn apply_relative(&self, base: ObjectId, part: &RelativePart) -> Result<ObjectId> {
        match part {
            RelativePart::AncestorsBack(n) => {
                let mut current = base;
                for _ in 0..*n {
                    current = self.parent_of(current)?;
                }
                Ok(current)
            }
            RelativePart::Parent(n) => {
                // Histories are linear; merge and transplant both produce
                // single-parent commits, so only the first parent exists.
                if *n != 1 {
                    return Err(CatalogError::bad_request(format!(
                        "commit {} has no parent #{n}",
                        base.short()
                    )));
                }
                self.parent_of(base)
            }
            RelativePart::AsOf(ts) => self.youngest_at_or_before(base, ts),
        }
    }

    fn parent_of(&self, hash: ObjectId) -> Result<ObjectId> {
        let commit: Commit = self.store.get_required(&hash)?;
        commit.parent.ok_or_else(|| {
            CatalogError::bad_request(format!(
                "relative lookup walked past the initial commit at {}",
                hash.short()
            ))
        })
    }

    fn youngest_at_or_before(&self, base: ObjectId, ts: &DateTime<Utc>) -> Result<ObjectId> {
        let mut current = base;
        loop {
            let commit: Commit = self.store.get_required(&current)?;
            if commit.meta.timestamp <= *ts {
                return Ok(current);
            }
            current = commit.parent.ok_or_else(|| {
                CatalogError::bad_request(format!("no commit found at or before {ts}"))
            })?;
        }
    }
}
