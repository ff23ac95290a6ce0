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

//! Request and response shapes of the logical service boundary.
//!
//! The engine always holds the richest model; these types project it into
//! what a client negotiated. Protocol v1 serialized one author and one
//! sign-off per commit; v2 went plural. The projection happens here and
//! only here.

use chrono::{DateTime, Utc};
use refbase_core::{CommitMeta, ContentKey, ContentKind, ContentRecord, Operation, ReferenceKind};
use refbase_storage::{DiffEntry, EntryInfo, HistoryEntry, RefEntry};
use serde::{Deserialize, Serialize};

/// Negotiated protocol version, declared per request by the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

/// A named reference with its resolved head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub hash: String,
}

impl From<RefEntry> for ReferenceInfo {
    fn from(entry: RefEntry) -> Self {
        Self {
            name: entry.name,
            kind: entry.kind,
            hash: entry.head.to_hex(),
        }
    }
}

/// Commit request body: the operation set plus its metadata. The expected
/// hash travels in the target spec (`branch@hash`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub operations: Vec<Operation>,
    pub commit_meta: CommitMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub from_ref_name: String,
    pub from_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransplantRequest {
    pub from_ref_name: String,
    pub hashes_to_transplant: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub target_branch: ReferenceInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub content: ContentRecord,
    /// The fully resolved reference, present only when the request spec
    /// left the hash open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_reference: Option<ReferenceInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedContent {
    pub key: ContentKey,
    pub content: ContentRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMultipleContentsResponse {
    pub contents: Vec<KeyedContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_reference: Option<ReferenceInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub key: ContentKey,
    pub content_id: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
}

impl From<EntryInfo> for EntryView {
    fn from(info: EntryInfo) -> Self {
        Self {
            key: info.key,
            content_id: info.content_id.to_string(),
            kind: info.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesResponse {
    pub entries: Vec<EntryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub diffs: Vec<DiffEntry>,
}

/// Commit metadata as one protocol version serializes it. Exactly one of
/// the singular/plural field pairs is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitMetaView {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_off_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_signed_off_by: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CommitMetaView {
    pub fn project(meta: &CommitMeta, version: ApiVersion) -> Self {
        match version {
            ApiVersion::V1 => Self {
                message: meta.message.clone(),
                author: meta.author().map(String::from),
                signed_off_by: meta.signed_off_by().map(String::from),
                authors: None,
                all_signed_off_by: None,
                committer: meta.committer.clone(),
                timestamp: meta.timestamp,
            },
            ApiVersion::V2 => Self {
                message: meta.message.clone(),
                author: None,
                signed_off_by: None,
                authors: Some(meta.authors.clone()),
                all_signed_off_by: Some(meta.all_signed_off_by.clone()),
                committer: meta.committer.clone(),
                timestamp: meta.timestamp,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryView {
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<String>,
    pub commit_meta: CommitMetaView,
}

impl LogEntryView {
    pub fn project(entry: &HistoryEntry, version: ApiVersion) -> Self {
        Self {
            hash: entry.hash.to_hex(),
            parent_hash: entry.parent.map(|p| p.to_hex()),
            commit_meta: CommitMetaView::project(&entry.meta, version),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResponse {
    pub log_entries: Vec<LogEntryView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> CommitMeta {
        CommitMeta::from_message("test commit")
            .with_author("alice")
            .with_author("bob")
            .with_signed_off_by("carol")
    }

    #[test]
    fn test_v1_projection_is_singular() {
        let view = CommitMetaView::project(&meta(), ApiVersion::V1);
        assert_eq!(view.author.as_deref(), Some("alice"));
        assert_eq!(view.signed_off_by.as_deref(), Some("carol"));
        assert!(view.authors.is_none());

        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"author\""));
        assert!(json.contains("\"signedOffBy\""));
        assert!(!json.contains("\"authors\""));
        assert!(!json.contains("\"allSignedOffBy\""));
    }

    #[test]
    fn test_v2_projection_is_plural() {
        let view = CommitMetaView::project(&meta(), ApiVersion::V2);
        assert_eq!(view.authors.as_deref(), Some(&["alice".to_string(), "bob".to_string()][..]));
        assert!(view.author.is_none());

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("\"author\""));
        assert!(!json.contains("\"signedOffBy\""));
        assert!(json.contains("\"authors\""));
        assert!(json.contains("\"allSignedOffBy\""));
    }

    #[test]
    fn test_v2_plural_fields_present_even_when_empty() {
        let view = CommitMetaView::project(&CommitMeta::from_message("bare"), ApiVersion::V2);
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"authors\":[]"));
        assert!(json.contains("\"allSignedOffBy\":[]"));
    }
}
