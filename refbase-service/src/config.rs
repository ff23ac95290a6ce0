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

//! Service configuration, loadable from a TOML file.
//!
//! ```toml
//! log_requests = true
//!
//! [catalog]
//! default_branch = "main"
//! merge_walk_limit = 10000
//! history_page_limit = 500
//! ```

use anyhow::Context;
use refbase_storage::CatalogConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Engine configuration.
    pub catalog: CatalogConfig,

    /// Emit a tracing event per boundary operation.
    pub log_requests: bool,
}

impl ServiceConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.catalog.default_branch, "main");
        assert!(!config.log_requests);
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "log_requests = true\n\n[catalog]\ndefault_branch = \"trunk\"\nmerge_walk_limit = 42"
        )
        .unwrap();

        let config = ServiceConfig::load(file.path()).unwrap();
        assert!(config.log_requests);
        assert_eq!(config.catalog.default_branch, "trunk");
        assert_eq!(config.catalog.merge_walk_limit, 42);
        // Unset keys keep their defaults.
        assert_eq!(config.catalog.history_page_limit, 500);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ServiceConfig::load("/nonexistent/refbase.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
