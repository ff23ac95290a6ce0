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

//! Refbase Service
//!
//! The logical request/response boundary over the catalog engine: typed
//! request and response shapes, protocol-version projection (v1 singular vs
//! v2 plural commit metadata, client-spec-gated structured error details),
//! boundary validation with stable messages, and service configuration.
//! Wire transport, deserialization and authentication are left to an outer
//! collaborator; everything here is plain types and calls.

pub mod api;
pub mod config;
pub mod error;
pub mod service;

pub use api::{
    ApiVersion, CommitMetaView, CommitRequest, CommitResponse, ContentResponse, DiffResponse,
    EntriesResponse, EntryView, GetMultipleContentsResponse, KeyedContent, LogEntryView,
    LogResponse, MergeRequest, ReferenceInfo, TransplantRequest,
};
pub use config::ServiceConfig;
pub use error::{ClientSpec, ErrorCode, ErrorDetails, ServiceError};
pub use service::CatalogService;
