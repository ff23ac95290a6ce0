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

//! Commit metadata.
//!
//! The core always holds the richest shape: plural authors and sign-offs.
//! Protocol v1 exposed a single author and a single signed-off-by; the
//! singular accessors exist so the boundary can project that shape without
//! the core ever storing the narrow form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMeta {
    pub message: String,
    pub authors: Vec<String>,
    pub all_signed_off_by: Vec<String>,
    pub committer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CommitMeta {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            authors: Vec::new(),
            all_signed_off_by: Vec::new(),
            committer: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_signed_off_by(mut self, signer: impl Into<String>) -> Self {
        self.all_signed_off_by.push(signer.into());
        self
    }

    pub fn with_committer(mut self, committer: impl Into<String>) -> Self {
        self.committer = Some(committer.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// First author, the v1 singular projection.
    pub fn author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    /// First sign-off, the v1 singular projection.
    pub fn signed_off_by(&self) -> Option<&str> {
        self.all_signed_off_by.first().map(String::as_str)
    }
}
