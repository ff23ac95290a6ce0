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

//! Reference kinds and the reference-name grammar.
//!
//! Branch heads move with every commit/merge/transplant; tag targets move
//! only through explicit reassignment. Names may contain `/` (path-like
//! names are common) but none of the characters the spec grammar reserves
//! for anchors and relative lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceKind {
    Branch,
    Tag,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Branch => write!(f, "BRANCH"),
            ReferenceKind::Tag => write!(f, "TAG"),
        }
    }
}

/// Reference name validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid reference name: {0}")]
pub struct RefNameError(pub String);

/// Characters reserved by the reference-spec grammar (anchors, relative
/// lookups) or simply unsafe in names.
const FORBIDDEN_CHARS: [char; 10] = ['~', '^', '*', ':', '?', '[', '\\', '@', '\'', ' '];

/// Validate a reference name against the grammar.
pub fn validate_reference_name(name: &str) -> Result<(), RefNameError> {
    if name.is_empty() {
        return Err(RefNameError("name must not be empty".to_string()));
    }
    if name == "-" {
        return Err(RefNameError(
            "'-' is reserved for the default branch".to_string(),
        ));
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(RefNameError(format!(
            "name must not start or end with '.' - but was: {name}"
        )));
    }
    if name.contains("..") {
        return Err(RefNameError(format!(
            "name must not contain '..' - but was: {name}"
        )));
    }
    if name.contains("//") || name.starts_with('/') || name.ends_with('/') {
        return Err(RefNameError(format!(
            "name must not start or end with '/' or contain '//' - but was: {name}"
        )));
    }
    for c in name.chars() {
        if c.is_control() || FORBIDDEN_CHARS.contains(&c) {
            return Err(RefNameError(format!(
                "name must not contain {:?} - but was: {name}",
                c
            )));
        }
    }
    Ok(())
}
