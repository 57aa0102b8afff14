// Copyright 2026 BadCompany
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

// Domain error types. Every variant is Clone + PartialEq so outcomes can be
// compared across repeated invocations.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure to extract a JSON envelope from a raw body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is not well-formed JSON for the expected envelope shape
    #[error("Malformed JSON payload: {0}")]
    Json(String),

    /// Event-stream bodies are line text and must be UTF-8
    #[error("Body is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Event-stream body without any `data` line
    #[error("No `data` line found in event-stream body")]
    NoPayloadFound,
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Json(e.to_string())
    }
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(e: std::str::Utf8Error) -> Self {
        DecodeError::InvalidUtf8(e.to_string())
    }
}

/// Structural rule violated by an envelope field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Constraint {
    /// `jsonrpc` must equal "2.0"
    JsonRpcVersion,
    /// Non-negative integer
    Uint,
    /// Field must be present and non-empty
    Required,
    /// Printable ASCII only
    PrintableAscii,
    /// Empty, or a `YYYY-MM-DD` calendar date
    DateOrEmpty,
}

impl Constraint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Constraint::JsonRpcVersion => "eq=2.0",
            Constraint::Uint => "uint",
            Constraint::Required => "required",
            Constraint::PrintableAscii => "printascii",
            Constraint::DateOrEmpty => "date",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First failing field of an envelope, with the offending value rendered as JSON
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed: field `{field}` = {value} violates `{constraint}`")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub constraint: Constraint,
}

/// A message that could not be decoded or did not validate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Reasons the external content auditor could not produce a score
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuditError {
    /// Connection, TLS or body-read failure
    #[error("Auditor request failed: {0}")]
    Transport(String),

    #[error("Auditor call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Auditor returned HTTP {0}")]
    HttpStatus(u16),

    /// Body was not a plain decimal integer
    #[error("Auditor returned a non-integer score: {0:?}")]
    InvalidScore(String),

    /// Caller aborted the originating request
    #[error("Auditor call cancelled")]
    Cancelled,
}

impl AuditError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuditError::Transport(_) | AuditError::Timeout(_) | AuditError::HttpStatus(500..=599)
        )
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: `{field}` {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml_ng::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
