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

//! Envelope schema validation.
//!
//! Checks run in a fixed order and stop at the first failure, which is
//! reported as a `(field, value, constraint)` triple. The envelope is never
//! modified.

use crate::engine_core::constants::jsonrpc;
use crate::engine_core::errors::{Constraint, ValidationError};
use crate::engine_core::models::{Envelope, McpRequest, McpResponse};
use chrono::NaiveDate;
use serde_json::Value;

pub struct EnvelopeValidator;

impl EnvelopeValidator {
    pub fn validate(envelope: &Envelope) -> Result<(), ValidationError> {
        if envelope.jsonrpc() != jsonrpc::VERSION {
            return Err(violation(
                "jsonrpc",
                &Value::from(envelope.jsonrpc()),
                Constraint::JsonRpcVersion,
            ));
        }

        match envelope {
            Envelope::Request(req) => Self::validate_request(req),
            Envelope::Response(resp) => Self::validate_response(resp),
        }
    }

    fn validate_request(req: &McpRequest) -> Result<(), ValidationError> {
        // Absent id marks a notification. An explicit null is not a valid request id.
        if let Some(id) = &req.id {
            if id.as_u64().is_none() {
                return Err(violation("id", id, Constraint::Uint));
            }
        }

        if req.method.is_empty() {
            return Err(violation("method", &Value::from(""), Constraint::Required));
        }
        if !is_printable_ascii(&req.method) {
            return Err(violation(
                "method",
                &Value::from(req.method.as_str()),
                Constraint::PrintableAscii,
            ));
        }

        if let Some(version) = req.params.as_ref().and_then(|p| p.protocol_version.as_deref()) {
            check_protocol_version("params.protocolVersion", version)?;
        }
        Ok(())
    }

    fn validate_response(resp: &McpResponse) -> Result<(), ValidationError> {
        // Null ids are legal on error replies to unparseable requests.
        match &resp.id {
            None | Some(Value::Null) => {}
            Some(id) if id.as_u64().is_some() => {}
            Some(id) => return Err(violation("id", id, Constraint::Uint)),
        }

        if let Some(version) = resp.protocol_version.as_deref() {
            check_protocol_version("protocolVersion", version)?;
        }
        if let Some(version) = resp.result.as_ref().and_then(|r| r.protocol_version.as_deref()) {
            check_protocol_version("result.protocolVersion", version)?;
        }
        Ok(())
    }
}

fn violation(field: &'static str, value: &Value, constraint: Constraint) -> ValidationError {
    ValidationError {
        field,
        value: value.to_string(),
        constraint,
    }
}

fn check_protocol_version(field: &'static str, version: &str) -> Result<(), ValidationError> {
    if is_date_or_empty(version) {
        Ok(())
    } else {
        Err(violation(field, &Value::from(version), Constraint::DateOrEmpty))
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| b == b' ' || b.is_ascii_graphic())
}

/// Empty, or exactly `YYYY-MM-DD` naming a real calendar day.
pub fn is_date_or_empty(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    let b = s.as_bytes();
    let shape_ok = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b
            .iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    shape_ok && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
