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

//! Hierarchical Content Keys
//!
//! A [`ContentKey`] identifies one catalog entry as an ordered sequence of
//! non-empty path elements. Proper prefixes of a multi-element key act as
//! namespaces and must exist before the key itself can be committed.
//!
//! The encoded path form joins elements with `.` and escapes a literal `.`
//! inside an element as U+001D, so `a.b` (two elements) and `a\u{1D}b`
//! (one element containing a dot) stay distinguishable.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Separator between elements in the encoded path form.
pub const KEY_SEPARATOR: char = '.';

/// Escape for a literal `.` inside an element (ASCII group separator).
pub const KEY_DOT_ESCAPE: char = '\u{001D}';

/// Key construction / parse errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("content key must have at least one element")]
    Empty,

    #[error("content key elements must not be empty")]
    EmptyElement,

    #[error("content key element contains forbidden character {0:?}")]
    ForbiddenCharacter(char),
}

/// Hierarchical identifier of one catalog entry.
///
/// Keys order element-wise (not by their encoded string), so entry listings
/// and diffs come out grouped by namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    elements: Vec<String>,
}

impl ContentKey {
    /// Create a key from path elements, validating each element.
    pub fn new<I, S>(elements: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements: Vec<String> = elements.into_iter().map(Into::into).collect();
        if elements.is_empty() {
            return Err(KeyError::Empty);
        }
        for element in &elements {
            validate_element(element)?;
        }
        Ok(Self { elements })
    }

    /// The path elements, in order.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// The last element (the entry's own name within its namespace).
    pub fn name(&self) -> &str {
        self.elements.last().expect("keys have at least one element")
    }

    /// The key minus its last element; `None` for single-element keys.
    pub fn parent(&self) -> Option<ContentKey> {
        if self.elements.len() < 2 {
            return None;
        }
        Some(ContentKey {
            elements: self.elements[..self.elements.len() - 1].to_vec(),
        })
    }

    /// All proper prefixes of this key, shortest first. These are the
    /// namespace paths that must exist for the key to be committable.
    pub fn ancestors(&self) -> impl Iterator<Item = ContentKey> + '_ {
        (1..self.elements.len()).map(move |len| ContentKey {
            elements: self.elements[..len].to_vec(),
        })
    }

    /// Whether `other` is a proper prefix of this key.
    pub fn is_descendant_of(&self, other: &ContentKey) -> bool {
        self.elements.len() > other.elements.len()
            && self.elements[..other.elements.len()] == other.elements[..]
    }

    /// Encode to the path-string form. Literal dots inside an element are
    /// replaced by U+001D before elements are joined with `.`.
    pub fn to_path_string(&self) -> String {
        self.elements
            .iter()
            .map(|e| e.replace(KEY_SEPARATOR, &KEY_DOT_ESCAPE.to_string()))
            .collect::<Vec<_>>()
            .join(&KEY_SEPARATOR.to_string())
    }

    /// Decode from the path-string form. Inverse of [`Self::to_path_string`].
    pub fn from_path_string(path: &str) -> Result<Self, KeyError> {
        if path.is_empty() {
            return Err(KeyError::Empty);
        }
        let elements = path
            .split(KEY_SEPARATOR)
            .map(|raw| {
                if raw.is_empty() {
                    return Err(KeyError::EmptyElement);
                }
                Ok(raw.replace(KEY_DOT_ESCAPE, &KEY_SEPARATOR.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { elements })
    }
}

fn validate_element(element: &str) -> Result<(), KeyError> {
    if element.is_empty() {
        return Err(KeyError::EmptyElement);
    }
    for c in element.chars() {
        if c == '\u{0000}' || c == KEY_DOT_ESCAPE {
            return Err(KeyError::ForbiddenCharacter(c));
        }
    }
    Ok(())
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}
