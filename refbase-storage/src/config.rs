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

//! Catalog configuration.

use serde::{Deserialize, Serialize};

/// Default branch name, matching what clients expect from a fresh service.
pub const DEFAULT_BRANCH_NAME: &str = "main";

/// Default bound on ancestor walks during merge/transplant.
pub const DEFAULT_MERGE_WALK_LIMIT: usize = 10_000;

/// Default cap on one history listing.
pub const DEFAULT_HISTORY_PAGE_LIMIT: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Name of the branch the `-` marker resolves to.
    pub default_branch: String,

    /// Hard bound on commit-chain walks in merge/transplant; longer
    /// histories fail instead of scanning without limit.
    pub merge_walk_limit: usize,

    /// Most commits one history listing returns, whatever the caller asks.
    pub history_page_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_branch: DEFAULT_BRANCH_NAME.to_string(),
            merge_walk_limit: DEFAULT_MERGE_WALK_LIMIT,
            history_page_limit: DEFAULT_HISTORY_PAGE_LIMIT,
        }
    }
}

impl CatalogConfig {
    /// Config with a differently named default branch.
    pub fn with_default_branch(name: impl Into<String>) -> Self {
        Self {
            default_branch: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.merge_walk_limit, DEFAULT_MERGE_WALK_LIMIT);
        assert_eq!(config.history_page_limit, DEFAULT_HISTORY_PAGE_LIMIT);
    }

    #[test]
    fn test_with_default_branch() {
        let config = CatalogConfig::with_default_branch("trunk");
        assert_eq!(config.default_branch, "trunk");
    }
}
