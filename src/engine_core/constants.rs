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

//! snowfall Constants - Single source of truth for all configuration values.
//!
//! This module centralizes magic numbers, reserved error codes, environment
//! variable names and wire literals used across the pipeline.

/// JSON-RPC 2.0 wire literals and the reserved codes used in synthesized replies
pub mod jsonrpc {
    /// The only accepted value of the `jsonrpc` member
    pub const VERSION: &str = "2.0";
    /// Block issued by the gateway (injection or unavailable auditor)
    pub const ERROR_SECURITY_BLOCK: i64 = -32000;
    /// Invalid request (standard JSON-RPC)
    pub const ERROR_INVALID_REQUEST: i64 = -32600;
    /// Parse error (standard JSON-RPC)
    pub const ERROR_PARSE: i64 = -32700;
    /// Content too large (MCP reserved)
    pub const ERROR_CONTENT_TOO_LARGE: i64 = -32801;
}

/// Event-stream framing
pub mod framing {
    /// Key of the line carrying the JSON envelope
    pub const DATA_KEY: &str = "data";
    /// Event name used when synthesizing a framed replacement body
    pub const EVENT_MESSAGE: &str = "message";
}

/// External content auditor contract
pub mod auditor {
    /// Path appended to the configured endpoint
    pub const CHECK_PATH: &str = "/check";
    /// Connect timeout cap; the total call timeout comes from config
    pub const CONNECT_TIMEOUT_SECS: u64 = 2;
}

/// Identity reported in synthesized error envelopes and audit records
pub mod gateway {
    pub const NAME: &str = "snowfall";
}

/// Configuration Environment Variables
pub mod config {
    pub const ENV_IN_CHECK: &str = "SF_IN_CHECK";
    pub const ENV_OUT_CHECK: &str = "SF_OUT_CHECK";
    pub const ENV_AUDIT: &str = "SF_AUDIT";
    pub const ENV_AUDIT_URL: &str = "SF_AUDIT_URL";
    pub const ENV_AUDIT_TOKEN: &str = "SF_AUDIT_TOKEN";
    pub const ENV_AUDIT_THRESHOLD: &str = "SF_AUDIT_THRESHOLD";
    pub const ENV_AUDIT_TIMEOUT_MS: &str = "SF_AUDIT_TIMEOUT_MS";
    pub const ENV_REQUEST_POLICY: &str = "SF_REQUEST_POLICY";
    pub const ENV_RESPONSE_POLICY: &str = "SF_RESPONSE_POLICY";
    pub const ENV_AUDIT_POLICY: &str = "SF_AUDIT_POLICY";
    pub const ENV_MAX_BODY_BYTES: &str = "SF_MAX_BODY_BYTES";
    pub const ENV_LOG_LEVEL: &str = "SF_LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "SF_LOG_FORMAT";

    /// Default score threshold (exclusive)
    pub const DEFAULT_AUDIT_THRESHOLD: u8 = 80;
    /// Upper bound of the score scale
    pub const MAX_AUDIT_THRESHOLD: u8 = 100;
    /// Default auditor call timeout in milliseconds
    pub const DEFAULT_AUDIT_TIMEOUT_MS: u64 = 5_000;
}

/// Transport Limits (DoS Protection)
pub mod limits {
    /// Maximum accepted message body size (10 MB)
    pub const MAX_MESSAGE_SIZE_BYTES: usize = 10 * 1024 * 1024;
}
