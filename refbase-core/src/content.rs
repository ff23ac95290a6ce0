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

//! Content payloads and their stable identities.
//!
//! The catalog never interprets payload bytes; content schemas live with the
//! clients. The engine only distinguishes namespace markers from values, and
//! tracks a [`ContentId`] per key that survives value updates.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of one catalog entry, minted when the key is first
/// created and preserved across updates to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId(Uuid);

impl ContentId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse content classification, recorded per entry so namespace checks
/// never need to load payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    Namespace,
    Value,
}

/// One catalog payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    /// Marker entry making this key path usable as a parent for nested keys.
    Namespace,
    /// Opaque payload bytes.
    Value(Vec<u8>),
}

impl Content {
    pub fn value(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Value(bytes.into())
    }

    /// Convenience for JSON-shaped payloads; the engine still treats the
    /// bytes as opaque.
    pub fn value_json(value: &serde_json::Value) -> Self {
        Self::Value(serde_json::to_vec(value).unwrap_or_default())
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Namespace => ContentKind::Namespace,
            Content::Value(_) => ContentKind::Value,
        }
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self, Content::Namespace)
    }

    /// Try to parse the payload as JSON.
    pub fn as_json(&self) -> Option<serde_json::Value> {
        match self {
            Content::Namespace => None,
            Content::Value(bytes) => serde_json::from_slice(bytes).ok(),
        }
    }
}

/// A payload together with its stable id, as stored at a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: ContentId,
    pub content: Content,
}

impl ContentRecord {
    pub fn new(id: ContentId, content: Content) -> Self {
        Self { id, content }
    }

    pub fn kind(&self) -> ContentKind {
        self.content.kind()
    }
}
