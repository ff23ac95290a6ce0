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

//! Typed conflicts.
//!
//! Commit, merge and transplant validation never stops at the first
//! finding; the full list travels with the error so clients can fix an
//! entire operation set in one round trip.

use crate::key::ContentKey;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    NamespaceAbsent,
    NotANamespace,
    KeyDoesNotExist,
    NamespaceNotEmpty,
    ValueDiffers,
}

/// One structured finding, naming the key it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub conflict_type: ConflictType,
    pub key: ContentKey,
    pub message: String,
}

impl Conflict {
    pub fn new(conflict_type: ConflictType, key: ContentKey, message: impl Into<String>) -> Self {
        Self {
            conflict_type,
            key,
            message: message.into(),
        }
    }

    pub fn namespace_absent(key: ContentKey) -> Self {
        let message = format!("namespace '{key}' must exist");
        Self::new(ConflictType::NamespaceAbsent, key, message)
    }

    pub fn not_a_namespace(key: ContentKey) -> Self {
        let message = format!("expected the existing content for key '{key}' to be a namespace");
        Self::new(ConflictType::NotANamespace, key, message)
    }

    pub fn key_does_not_exist(key: ContentKey) -> Self {
        let message = format!("key '{key}' does not exist");
        Self::new(ConflictType::KeyDoesNotExist, key, message)
    }

    pub fn namespace_not_empty(key: ContentKey) -> Self {
        let message = format!("namespace '{key}' is not empty");
        Self::new(ConflictType::NamespaceNotEmpty, key, message)
    }

    pub fn value_differs(key: ContentKey) -> Self {
        let message = format!("values of existing and expected content for key '{key}' are different");
        Self::new(ConflictType::ValueDiffers, key, message)
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
