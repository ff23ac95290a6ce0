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

//! The logical service boundary over the catalog engine.
//!
//! Request-level validation lives here: mandatory expected hashes, the
//! relative-hash prohibition for mutations (in every position a hash can
//! appear - path target, body field, list element), and reference-kind
//! checks, all before any engine call. Transport, deserialization and
//! authentication belong to an outer collaborator.

use crate::api::{
    ApiVersion, CommitRequest, CommitResponse, ContentResponse, DiffResponse, EntriesResponse,
    EntryView, GetMultipleContentsResponse, KeyedContent, LogEntryView, LogResponse, MergeRequest,
    ReferenceInfo, TransplantRequest,
};
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use refbase_core::{
    CatalogError, ContentKey, RefSpec, RefSpecBase, ReferenceKind, RELATIVE_HASH_NOT_ALLOWED,
};
use refbase_storage::{Catalog, ObjectId, Resolved};

type ServiceResult<T> = Result<T, ServiceError>;

/// The versioned catalog behind its logical request/response operations.
pub struct CatalogService {
    catalog: Catalog,
    log_requests: bool,
}

impl CatalogService {
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let catalog = Catalog::new(config.catalog)?;
        Ok(Self {
            catalog,
            log_requests: config.log_requests,
        })
    }

    fn trace_request(&self, operation: &str, spec: &str) {
        if self.log_requests {
            tracing::info!(operation, spec, "handling catalog request");
        }
    }

    /// Direct access to the engine, mostly for tests and embedding.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // === References ===

    pub fn create_reference(
        &self,
        name: &str,
        kind: ReferenceKind,
        from: Option<&str>,
    ) -> ServiceResult<ReferenceInfo> {
        self.trace_request("create_reference", name);
        let entry = self.catalog.create_reference(name, kind, from)?;
        Ok(entry.into())
    }

    pub fn get_reference(&self, spec: &str) -> ServiceResult<ReferenceInfo> {
        let (entry, _) = self.catalog.get_reference(spec)?;
        Ok(entry.into())
    }

    pub fn list_references(&self) -> Vec<ReferenceInfo> {
        self.catalog
            .list_references()
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// Reassign a branch or tag to an existing commit. Both the expected
    /// hash and the new target are mandatory, exact hashes.
    pub fn assign_reference(
        &self,
        name: &str,
        kind: ReferenceKind,
        expected_hash: Option<&str>,
        assign_to: Option<&str>,
    ) -> ServiceResult<ReferenceInfo> {
        let (expected_hash, assign_to) = match (expected_hash, assign_to) {
            (Some(expected_hash), Some(assign_to)) => (expected_hash, assign_to),
            (expected_hash, assign_to) => {
                let mut missing = Vec::new();
                if expected_hash.is_none() {
                    missing.push("assignReference.expectedHash: must not be null");
                }
                if assign_to.is_none() {
                    missing.push("assignReference.assignTo: must not be null");
                }
                return Err(ServiceError::bad_request(missing.join(", ")));
            }
        };

        let expected = self.exact_hash(expected_hash)?;
        let to = self.exact_hash(assign_to)?;
        let entry = self.catalog.assign_reference(name, kind, expected, to)?;
        Ok(entry.into())
    }

    pub fn delete_reference(
        &self,
        name: &str,
        kind: ReferenceKind,
    ) -> ServiceResult<ReferenceInfo> {
        let entry = self.catalog.delete_reference(name, kind)?;
        Ok(entry.into())
    }

    // === Mutations ===

    pub fn commit(&self, target_spec: &str, request: CommitRequest) -> ServiceResult<CommitResponse> {
        self.trace_request("commit", target_spec);
        let (branch, anchor) =
            self.mutation_target(target_spec, "commitMultipleOperations.expectedHash")?;
        let expected = self.exact_hash(&anchor)?;
        let entry = self.catalog.commit(
            &branch,
            expected,
            &request.operations,
            request.commit_meta,
        )?;
        Ok(CommitResponse {
            target_branch: entry.into(),
        })
    }

    pub fn merge(&self, target_spec: &str, request: MergeRequest) -> ServiceResult<CommitResponse> {
        self.trace_request("merge", target_spec);
        let (branch, anchor) =
            self.mutation_target(target_spec, "mergeRefIntoBranch.expectedHash")?;
        let from_anchor = request
            .from_hash
            .as_deref()
            .ok_or_else(|| {
                ServiceError::bad_request("mergeRefIntoBranch.fromHash: must not be null")
            })
            .and_then(|hash| self.mutation_hash(hash))?;

        // All boundary validation passed; only now touch the graph.
        let expected = self.exact_hash(&anchor)?;
        let from_hash = self.exact_hash(&from_anchor)?;
        let entry = self
            .catalog
            .merge(&branch, expected, &request.from_ref_name, from_hash)?;
        Ok(CommitResponse {
            target_branch: entry.into(),
        })
    }

    pub fn transplant(
        &self,
        target_spec: &str,
        request: TransplantRequest,
    ) -> ServiceResult<CommitResponse> {
        self.trace_request("transplant", target_spec);
        let (branch, anchor) =
            self.mutation_target(target_spec, "transplantCommitsIntoBranch.expectedHash")?;
        if request.hashes_to_transplant.is_empty() {
            return Err(ServiceError::bad_request(
                "transplantCommitsIntoBranch.hashesToTransplant: must not be empty",
            ));
        }
        let anchors = request
            .hashes_to_transplant
            .iter()
            .map(|hash| self.mutation_hash(hash))
            .collect::<ServiceResult<Vec<_>>>()?;

        // All boundary validation passed; only now touch the graph.
        let expected = self.exact_hash(&anchor)?;
        let hashes = anchors
            .iter()
            .map(|anchor| self.exact_hash(anchor))
            .collect::<ServiceResult<Vec<_>>>()?;
        let entry =
            self.catalog
                .transplant(&branch, expected, &request.from_ref_name, &hashes)?;
        Ok(CommitResponse {
            target_branch: entry.into(),
        })
    }

    // === Reads ===

    pub fn get_content(&self, spec: &str, key: &ContentKey) -> ServiceResult<ContentResponse> {
        let (mut found, resolved) = self.catalog.contents(spec, std::slice::from_ref(key))?;
        let record = found.pop().map(|(_, record)| record).ok_or_else(|| {
            ServiceError::from(CatalogError::ContentNotFound(format!(
                "key '{key}' not found on reference '{spec}'"
            )))
        })?;
        Ok(ContentResponse {
            content: record,
            effective_reference: self.effective_reference(spec, &resolved)?,
        })
    }

    pub fn get_multiple_contents(
        &self,
        spec: &str,
        keys: &[ContentKey],
    ) -> ServiceResult<GetMultipleContentsResponse> {
        let (found, resolved) = self.catalog.contents(spec, keys)?;
        Ok(GetMultipleContentsResponse {
            contents: found
                .into_iter()
                .map(|(key, content)| KeyedContent { key, content })
                .collect(),
            effective_reference: self.effective_reference(spec, &resolved)?,
        })
    }

    pub fn get_entries(&self, spec: &str) -> ServiceResult<EntriesResponse> {
        let entries = self.catalog.entries(spec)?;
        Ok(EntriesResponse {
            entries: entries.into_iter().map(EntryView::from).collect(),
        })
    }

    pub fn get_history(
        &self,
        spec: &str,
        version: ApiVersion,
        limit: Option<usize>,
    ) -> ServiceResult<LogResponse> {
        let entries = self.catalog.history(spec, limit)?;
        Ok(LogResponse {
            log_entries: entries
                .iter()
                .map(|entry| LogEntryView::project(entry, version))
                .collect(),
        })
    }

    pub fn get_diff(&self, left_spec: &str, right_spec: &str) -> ServiceResult<DiffResponse> {
        Ok(DiffResponse {
            diffs: self.catalog.diff(left_spec, right_spec)?,
        })
    }

    // === Boundary validation helpers ===

    /// Parse a mutation target spec into its branch name and mandatory
    /// expected-hash anchor. Relative refinements and missing hashes are
    /// rejected here, before any graph access.
    fn mutation_target(
        &self,
        target_spec: &str,
        missing_hash_context: &str,
    ) -> ServiceResult<(String, String)> {
        let parsed =
            RefSpec::parse(target_spec).map_err(|e| ServiceError::bad_request(e.to_string()))?;
        if parsed.has_relative_parts() {
            return Err(ServiceError::bad_request(RELATIVE_HASH_NOT_ALLOWED));
        }
        let branch = match &parsed.base {
            RefSpecBase::Named(name) => name.clone(),
            RefSpecBase::Default => self.catalog.config().default_branch.clone(),
            RefSpecBase::Detached => {
                return Err(ServiceError::bad_request(
                    "mutations require a branch name, not a detached hash",
                ))
            }
        };
        let anchor = parsed.anchor.ok_or_else(|| {
            ServiceError::bad_request(format!("{missing_hash_context}: must not be null"))
        })?;
        Ok((branch, anchor))
    }

    /// Parse a body-supplied hash for a mutation, rejecting relative forms.
    fn mutation_hash(&self, hash_spec: &str) -> ServiceResult<String> {
        let parsed =
            RefSpec::parse_hash(hash_spec).map_err(|e| ServiceError::bad_request(e.to_string()))?;
        if parsed.has_relative_parts() {
            return Err(ServiceError::bad_request(RELATIVE_HASH_NOT_ALLOWED));
        }
        Ok(parsed.anchor.expect("parse_hash always anchors"))
    }

    /// Resolve a plain hex hash (full id or unique prefix) to a commit.
    fn exact_hash(&self, hex: &str) -> ServiceResult<ObjectId> {
        Ok(self.catalog.lookup_hash(&hex.to_ascii_lowercase())?)
    }

    /// The reference a content lookup was actually served from; None when
    /// the spec pinned an anchor hash and the answer was unambiguous.
    fn effective_reference(
        &self,
        spec: &str,
        resolved: &Resolved,
    ) -> ServiceResult<Option<ReferenceInfo>> {
        let parsed = RefSpec::parse(spec).map_err(|e| ServiceError::bad_request(e.to_string()))?;
        if parsed.anchor.is_some() {
            return Ok(None);
        }
        match (&resolved.name, resolved.kind) {
            (Some(name), Some(kind)) => Ok(Some(ReferenceInfo {
                name: name.clone(),
                kind,
                hash: resolved.hash.to_hex(),
            })),
            _ => Ok(None),
        }
    }
}
