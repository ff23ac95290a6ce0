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

//! Refbase Storage - Reference/Commit Graph Engine
//!
//! A git-like engine for versioned catalog metadata: named mutable
//! references over an immutable, content-addressed commit history.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐    │
//! │  │ ContentRecord│◄──│   Snapshot   │◄──│    Commit    │    │
//! │  │  (payload)   │   │ (keyed state)│   │  (history)   │    │
//! │  └──────────────┘   └──────────────┘   └──────────────┘    │
//! │          │                 │                  │            │
//! │          ▼                 ▼                  ▼            │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │     CommitStore (BLAKE3 addressed, immutable)    │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                                                            │
//! │  ┌──────────────┐   ┌──────────────┐                       │
//! │  │    Branch    │   │     Tag      │     name -> head      │
//! │  │  (commits)   │   │  (assigned)  │     per-name CAS      │
//! │  └──────────────┘   └──────────────┘                       │
//! │          └────────┬─────────┘                              │
//! │                   ▼                                        │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │                     RefStore                     │      │
//! │  └──────────────────────────────────────────────────┘      │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commits and their snapshots are immutable once written; the reference
//! table is the only shared mutable state, updated through per-name
//! compare-and-swap. Concurrent readers never block and never observe a
//! half-applied commit.

pub mod catalog;
pub mod commit;
pub mod config;
pub mod diff;
pub mod merge;
pub mod objects;
pub mod refs;
pub mod resolve;
pub mod store;

pub use catalog::{Catalog, EntryInfo, HistoryEntry};
pub use commit::CommitEngine;
pub use config::{CatalogConfig, DEFAULT_BRANCH_NAME};
pub use diff::{DiffEngine, DiffEntry, DiffStats};
pub use merge::MergeEngine;
pub use objects::{
    CatalogObject, Commit, ObjectId, ObjectIdParseError, ObjectType, Snapshot, SnapshotEntry,
    StoredOperation,
};
pub use refs::{CasResult, RefEntry, RefError, RefStore};
pub use resolve::{Resolved, Resolver};
pub use store::{CommitStore, StoreError, StoreStats};
