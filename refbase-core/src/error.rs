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

//! Catalog error taxonomy.
//!
//! Every failure the engine can produce maps to exactly one of these
//! variants; the service boundary derives stable machine-readable codes and
//! HTTP-ish statuses from them without ever inspecting messages.

use crate::conflict::Conflict;
use crate::key::KeyError;
use crate::reference::RefNameError;
use crate::refspec::SpecError;
use thiserror::Error;

/// The message mutating operations fail with when any hash they received
/// carries a relative suffix.
pub const RELATIVE_HASH_NOT_ALLOWED: &str =
    "Relative hash not allowed in commit, merge or transplant operations";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    #[error("Reference already exists: {0}")]
    ReferenceAlreadyExists(String),

    #[error("Key conflicts on reference: {}", format_conflicts(.0))]
    ReferenceConflict(Vec<Conflict>),

    #[error("Expected hash {expected} does not match the current head {actual}")]
    PreconditionFailed { expected: String, actual: String },

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Content not found: {0}")]
    ContentNotFound(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn relative_hash_not_allowed() -> Self {
        CatalogError::BadRequest(RELATIVE_HASH_NOT_ALLOWED.to_string())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        CatalogError::BadRequest(message.into())
    }

    /// The structured conflict list, when this error carries one.
    pub fn conflicts(&self) -> Option<&[Conflict]> {
        match self {
            CatalogError::ReferenceConflict(conflicts) => Some(conflicts),
            _ => None,
        }
    }
}

fn format_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<KeyError> for CatalogError {
    fn from(err: KeyError) -> Self {
        CatalogError::BadRequest(err.to_string())
    }
}

impl From<RefNameError> for CatalogError {
    fn from(err: RefNameError) -> Self {
        CatalogError::BadRequest(err.to_string())
    }
}

impl From<SpecError> for CatalogError {
    fn from(err: SpecError) -> Self {
        CatalogError::BadRequest(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
