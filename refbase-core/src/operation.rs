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

//! Commit operations as submitted by clients.

use crate::content::Content;
use crate::key::ContentKey;
use serde::{Deserialize, Serialize};

/// One keyed change within a commit's operation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Put { key: ContentKey, content: Content },
    Delete { key: ContentKey },
}

impl Operation {
    pub fn put(key: ContentKey, content: Content) -> Self {
        Self::Put { key, content }
    }

    pub fn delete(key: ContentKey) -> Self {
        Self::Delete { key }
    }

    pub fn key(&self) -> &ContentKey {
        match self {
            Operation::Put { key, .. } => key,
            Operation::Delete { key } => key,
        }
    }
}
