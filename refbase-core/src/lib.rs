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

//! Refbase Core
//!
//! Domain model for the versioned metadata catalog: content keys and
//! payloads, commit metadata, reference kinds and the reference-spec
//! grammar, typed conflicts, and the error taxonomy. Pure data, no I/O;
//! the engines live in `refbase-storage`.

pub mod conflict;
pub mod content;
pub mod error;
pub mod key;
pub mod meta;
pub mod operation;
pub mod reference;
pub mod refspec;

pub use conflict::{Conflict, ConflictType};
pub use content::{Content, ContentId, ContentKind, ContentRecord};
pub use error::{CatalogError, Result, RELATIVE_HASH_NOT_ALLOWED};
pub use key::{ContentKey, KeyError, KEY_DOT_ESCAPE, KEY_SEPARATOR};
pub use meta::CommitMeta;
pub use operation::Operation;
pub use reference::{validate_reference_name, RefNameError, ReferenceKind};
pub use refspec::{RefSpec, RefSpecBase, RelativePart, SpecError, DEFAULT_BRANCH_MARKER};
