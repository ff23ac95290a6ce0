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

//! Reference-spec grammar.
//!
//! A spec string addresses a commit through a reference:
//!
//! ```text
//! main                      current head of branch "main"
//! -                         current head of the default branch
//! feature/x@                branch "feature/x" (trailing '@' pins the name end)
//! main@11223344aabb..       anchored at an exact or prefix hash
//! main~2                    two commits before the head
//! main@cafebabe^1           parent of the anchored commit
//! main*2021-04-07T14:42:25Z youngest commit at or before the timestamp
//! @11223344aabb..           detached, no reference name
//! ```
//!
//! Everything downstream operates on the parsed [`RefSpec`], never on raw
//! strings. Relative parts are read-only addressing; mutating operations
//! reject them before touching the graph.

use crate::reference::{validate_reference_name, RefNameError};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Spec-level sentinel for the configured default branch.
pub const DEFAULT_BRANCH_MARKER: &str = "-";

/// Spec parse errors, surfaced to callers as bad requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("empty reference spec")]
    Empty,

    #[error(transparent)]
    InvalidName(#[from] RefNameError),

    #[error("invalid hash: {0:?} (expected 8 to 64 hex characters, even length)")]
    InvalidHash(String),

    #[error("invalid relative lookup {0:?}: expected a number after '~' or '^'")]
    InvalidOffset(String),

    #[error("invalid timestamp {0:?}: expected RFC 3339 or milliseconds since epoch")]
    InvalidTimestamp(String),
}

/// What the spec is anchored on before hash/relative refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSpecBase {
    /// The configured default branch (`-`).
    Default,
    /// A named branch or tag.
    Named(String),
    /// No reference at all; the anchor hash stands alone.
    Detached,
}

/// One relative refinement step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelativePart {
    /// `~N`: N commits back along first parents.
    AncestorsBack(u32),
    /// `^N`: the Nth parent of the commit.
    Parent(u32),
    /// `*ts`: the youngest commit with a timestamp at or before `ts`.
    AsOf(DateTime<Utc>),
}

/// A parsed reference spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSpec {
    pub base: RefSpecBase,
    /// Anchor hash in hex; a full 64-char id or an unambiguous prefix.
    pub anchor: Option<String>,
    pub relative: Vec<RelativePart>,
}

impl RefSpec {
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        if spec.is_empty() {
            return Err(SpecError::Empty);
        }

        let (name_part, rest) = match spec.find('@') {
            Some(at) => (&spec[..at], Some(&spec[at + 1..])),
            None => {
                // No anchor; relative parts may still follow the name.
                let cut = spec
                    .find(|c| matches!(c, '~' | '^' | '*'))
                    .unwrap_or(spec.len());
                (&spec[..cut], None)
            }
        };

        let (anchor, relative) = match rest {
            None => {
                let cut = name_part.len();
                (None, parse_relative(&spec[cut..])?)
            }
            Some(rest) => {
                let cut = rest
                    .find(|c: char| matches!(c, '~' | '^' | '*'))
                    .unwrap_or(rest.len());
                let hash = &rest[..cut];
                let anchor = if hash.is_empty() {
                    // Trailing bare '@' only pins where the name ends.
                    None
                } else {
                    Some(validate_hash(hash)?)
                };
                (anchor, parse_relative(&rest[cut..])?)
            }
        };

        let base = match name_part {
            DEFAULT_BRANCH_MARKER => RefSpecBase::Default,
            "" if anchor.is_some() => RefSpecBase::Detached,
            "" => return Err(SpecError::Empty),
            name => {
                validate_reference_name(name)?;
                RefSpecBase::Named(name.to_string())
            }
        };

        Ok(Self {
            base,
            anchor,
            relative,
        })
    }

    /// Parse a standalone hash field (merge/transplant request bodies):
    /// a hex hash with an optional relative suffix, no reference name.
    pub fn parse_hash(hash_spec: &str) -> Result<Self, SpecError> {
        if hash_spec.is_empty() {
            return Err(SpecError::Empty);
        }
        let cut = hash_spec
            .find(|c| matches!(c, '~' | '^' | '*'))
            .unwrap_or(hash_spec.len());
        let anchor = validate_hash(&hash_spec[..cut])?;
        Ok(Self {
            base: RefSpecBase::Detached,
            anchor: Some(anchor),
            relative: parse_relative(&hash_spec[cut..])?,
        })
    }

    pub fn has_relative_parts(&self) -> bool {
        !self.relative.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        match &self.base {
            RefSpecBase::Named(name) => Some(name),
            _ => None,
        }
    }
}

fn validate_hash(hash: &str) -> Result<String, SpecError> {
    let valid = (8..=64).contains(&hash.len())
        && hash.len() % 2 == 0
        && hash.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(SpecError::InvalidHash(hash.to_string()));
    }
    Ok(hash.to_ascii_lowercase())
}

fn parse_relative(mut suffix: &str) -> Result<Vec<RelativePart>, SpecError> {
    let mut parts = Vec::new();
    while !suffix.is_empty() {
        let op = suffix.chars().next().expect("suffix is non-empty");
        let rest = &suffix[op.len_utf8()..];
        let end = rest
            .find(|c| matches!(c, '~' | '^' | '*'))
            .unwrap_or(rest.len());
        let arg = &rest[..end];
        let part = match op {
            '~' => RelativePart::AncestorsBack(parse_offset(arg)?),
            '^' => RelativePart::Parent(parse_offset(arg)?),
            '*' => RelativePart::AsOf(parse_timestamp(arg)?),
            _ => unreachable!("split on relative operators"),
        };
        parts.push(part);
        suffix = &rest[end..];
    }
    Ok(parts)
}

fn parse_offset(arg: &str) -> Result<u32, SpecError> {
    let n: u32 = arg
        .parse()
        .map_err(|_| SpecError::InvalidOffset(arg.to_string()))?;
    if n == 0 {
        return Err(SpecError::InvalidOffset(arg.to_string()));
    }
    Ok(n)
}

fn parse_timestamp(arg: &str) -> Result<DateTime<Utc>, SpecError> {
    if let Ok(millis) = arg.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| SpecError::InvalidTimestamp(arg.to_string()));
    }
    DateTime::parse_from_rfc3339(arg)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| SpecError::InvalidTimestamp(arg.to_string()))
}
