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

//! Known-Error Registry.
//!
//! Reserved JSON-RPC / MCP error codes and their meaning. The table is a
//! `static` and is only reachable through the read-only accessors below.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownError {
    pub code: i64,
    pub codename: &'static str,
    pub reason: &'static str,
}

static KNOWN_ERRORS: [KnownError; 11] = [
    KnownError {
        code: -32000,
        codename: "SERVER_ERROR",
        reason: "Server-side tool execution failed",
    },
    KnownError {
        code: -32001,
        codename: "RESOURCE_NOT_FOUND",
        reason: "The requested resource could not be found",
    },
    KnownError {
        code: -32002,
        codename: "PERMISSION_DENIED",
        reason: "The client lacks the necessary permissions",
    },
    KnownError {
        code: -32003,
        codename: "RATE_LIMIT",
        reason: "Rate limit of server was exceeded",
    },
    KnownError {
        code: -32004,
        codename: "TIMEOUT",
        reason: "The operation timed out",
    },
    KnownError {
        code: -32600,
        codename: "METHOD_NOT_FOUND",
        reason: "The requested operation is not available",
    },
    KnownError {
        code: -32602,
        codename: "INVALID_PARAM",
        reason: "Invalid parameter was passed by client",
    },
    KnownError {
        code: -32603,
        codename: "INTERNAL_ERROR",
        reason: "Server encountered an implementation issue",
    },
    KnownError {
        code: -32700,
        codename: "PARSE_ERROR",
        reason: "MCP message is malformed",
    },
    KnownError {
        code: -32800,
        codename: "REQUEST_CANCELLED",
        reason: "Client cancelled the request",
    },
    KnownError {
        code: -32801,
        codename: "CONTENT_TOO_LARGE",
        reason: "The request content is too large",
    },
];

pub fn lookup(code: i64) -> Option<&'static KnownError> {
    KNOWN_ERRORS.iter().find(|e| e.code == code)
}

pub fn entries() -> &'static [KnownError] {
    &KNOWN_ERRORS
}
