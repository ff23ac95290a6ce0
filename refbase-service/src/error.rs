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

//! Service error envelope.
//!
//! Every engine failure maps to a stable numeric status and coarse error
//! code plus a human message. Structured conflict details are additive:
//! clients declare the protocol spec they understand, and anything below
//! spec 2 gets the envelope without `error_details` - same status, same
//! code, so old clients never see a shape they cannot parse.

use refbase_core::{CatalogError, Conflict};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unknown,
    BadRequest,
    ReferenceNotFound,
    ReferenceAlreadyExists,
    ContentNotFound,
    ReferenceConflict,
    PreconditionFailed,
    UnsupportedMediaType,
    Internal,
}

/// Structured error payload, gated by the declared client spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub conflicts: Vec<Conflict>,
}

/// Protocol spec a client declares with its requests. Clients that send
/// nothing are treated as the oldest spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ClientSpec(pub u8);

impl ClientSpec {
    /// The newest spec this service knows how to serve.
    pub const CURRENT: ClientSpec = ClientSpec(2);

    pub fn supports_error_details(&self) -> bool {
        self.0 >= 2
    }
}

/// The error shape every service operation fails with.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{status} {reason}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    pub status: u16,
    pub reason: String,
    pub message: String,
    pub error_code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
}

impl ServiceError {
    fn new(status: u16, reason: &str, error_code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.to_string(),
            message: message.into(),
            error_code,
            error_details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, "Bad Request", ErrorCode::BadRequest, message)
    }

    pub fn unsupported_media_type(mime: impl Into<String>) -> Self {
        Self::new(
            415,
            "Unsupported Media Type",
            ErrorCode::UnsupportedMediaType,
            format!("Unsupported media type: {}", mime.into()),
        )
    }

    /// Drop additive detail the declared client spec cannot parse. The
    /// status and coarse code never change with the spec.
    pub fn projected(mut self, client_spec: ClientSpec) -> Self {
        if !client_spec.supports_error_details() {
            self.error_details = None;
        }
        self
    }
}

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::BadRequest(message) => Self::bad_request(message),
            CatalogError::ReferenceNotFound(name) => Self::new(
                404,
                "Not Found",
                ErrorCode::ReferenceNotFound,
                format!("Reference not found: {name}"),
            ),
            CatalogError::ReferenceAlreadyExists(name) => Self::new(
                409,
                "Conflict",
                ErrorCode::ReferenceAlreadyExists,
                format!("Reference already exists: {name}"),
            ),
            CatalogError::ReferenceConflict(conflicts) => {
                let message = conflicts
                    .iter()
                    .map(|c| c.message.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut error = Self::new(
                    409,
                    "Conflict",
                    ErrorCode::ReferenceConflict,
                    format!("Key conflicts on reference: {message}"),
                );
                error.error_details = Some(ErrorDetails { conflicts });
                error
            }
            err @ CatalogError::PreconditionFailed { .. } => Self::new(
                412,
                "Precondition Failed",
                ErrorCode::PreconditionFailed,
                err.to_string(),
            ),
            CatalogError::ObjectNotFound(hash) => Self::new(
                404,
                "Not Found",
                ErrorCode::ContentNotFound,
                format!("Commit not found: {hash}"),
            ),
            CatalogError::ContentNotFound(message) => {
                Self::new(404, "Not Found", ErrorCode::ContentNotFound, message)
            }
            CatalogError::UnsupportedMediaType(mime) => Self::unsupported_media_type(mime),
            CatalogError::Internal(message) => Self::new(
                500,
                "Internal Server Error",
                ErrorCode::Internal,
                message,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refbase_core::{Conflict, ContentKey};

    fn conflict_error() -> ServiceError {
        let key = ContentKey::new(["ns"]).unwrap();
        CatalogError::ReferenceConflict(vec![Conflict::namespace_absent(key)]).into()
    }

    #[test]
    fn test_conflict_mapping() {
        let error = conflict_error();
        assert_eq!(error.status, 409);
        assert_eq!(error.error_code, ErrorCode::ReferenceConflict);
        assert_eq!(error.error_details.as_ref().unwrap().conflicts.len(), 1);
    }

    #[test]
    fn test_details_gated_by_client_spec() {
        assert!(conflict_error()
            .projected(ClientSpec(2))
            .error_details
            .is_some());
        for spec in [ClientSpec(0), ClientSpec(1)] {
            let projected = conflict_error().projected(spec);
            assert!(projected.error_details.is_none());
            // The coarse code survives projection untouched.
            assert_eq!(projected.error_code, ErrorCode::ReferenceConflict);
            assert_eq!(projected.status, 409);
        }
    }

    #[test]
    fn test_details_absent_from_serialized_form_when_stripped() {
        let json =
            serde_json::to_value(conflict_error().projected(ClientSpec(1))).unwrap();
        assert!(json.get("errorDetails").is_none());
        assert_eq!(json["errorCode"], "REFERENCE_CONFLICT");

        let json = serde_json::to_value(conflict_error()).unwrap();
        assert_eq!(
            json["errorDetails"]["conflicts"][0]["conflictType"],
            "NAMESPACE_ABSENT"
        );
    }

    #[test]
    fn test_unsupported_media_type_representable() {
        let error = ServiceError::unsupported_media_type("text/plain");
        assert_eq!(error.status, 415);
        assert_eq!(error.error_code, ErrorCode::UnsupportedMediaType);
    }
}
