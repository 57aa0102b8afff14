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

//! Security audit trail.
//!
//! Every message the gateway refuses to forward gets one structured record on
//! the `audit` tracing target, keyed by an incident id that is also returned
//! to the client inside the synthesized error envelope.

use crate::engine_core::constants::gateway;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

#[derive(Serialize)]
struct AuditEntry<'a> {
    incident_id: Uuid,
    source: &'a str,
    timestamp: String,
    event_type: &'a str,
    details: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    /// Emit a record and return its incident id.
    pub fn log(&self, event_type: &str, details: serde_json::Value) -> Uuid {
        let incident_id = Uuid::new_v4();
        let entry = AuditEntry {
            incident_id,
            source: gateway::NAME,
            timestamp: crate::utils::time::now_rfc3339(),
            event_type,
            details,
        };

        let payload_str = serde_json::to_string(&entry).unwrap_or_default();

        info!(
            target: "audit",
            incident_id = %incident_id,
            payload = %payload_str,
            "SECURITY_AUDIT_LOG"
        );
        incident_id
    }
}

/// SHA-256 of `text`, hex encoded. Lets operators correlate blocked
/// descriptions without writing attacker-controlled text into the logs.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
