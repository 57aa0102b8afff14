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

//! Interception Orchestrator.
//!
//! Runs every inspection stage for one message, in order, and returns the
//! verdict. Messages that pass are forwarded byte-for-byte; the orchestrator
//! never re-serializes them.
//!
//! Request:  in_check → size → decode → validate
//! Response: out_check → size → decode → validate → error classification
//!           → tool audit gate

use crate::config::{FailurePolicy, GatewayConfig};
use crate::engine::audit_gate::{GateVerdict, ToolAuditGate};
use crate::engine::auditor::HttpAuditor;
use crate::engine::classifier::{Classification, ErrorClassifier};
use crate::engine_core::audit::{fingerprint, AuditLogger};
use crate::engine_core::constants::{gateway, jsonrpc};
use crate::engine_core::errors::{AuditError, ConfigError, MessageError};
use crate::engine_core::models::{Envelope, MessageKind};
use crate::engine_core::traits::ContentAuditor;
use crate::mcp::codec::{self, Decoded, Framing};
use crate::protocol::validator::EnvelopeValidator;
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward,
    Block,
}

/// What the pipeline concluded about a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Inspection disabled for this direction
    Skipped,
    /// Every stage passed
    Clean,
    ContentTooLarge { size: usize, limit: usize },
    /// Failed decoding or structural validation
    Malformed(MessageError),
    /// Upstream answered with a JSON-RPC error; classified, never audited
    ProtocolError(Classification),
    InjectionDetected {
        tool_index: usize,
        tool_name: String,
        score: i64,
    },
    AuditUnavailable {
        tool_index: usize,
        tool_name: String,
        cause: AuditError,
    },
}

/// Result of running one message through the pipeline.
///
/// `body` is always the original bytes. When `action` is `Block`, the caller
/// sends `block_body()` in its place.
#[derive(Debug, Clone)]
pub struct Interception {
    pub body: Bytes,
    pub kind: MessageKind,
    pub outcome: Outcome,
    pub action: Action,
    /// Envelope id, when the message decoded far enough to have one
    pub id: Option<Value>,
    pub framing: Framing,
    /// Set on every blocked message; matches the audit record
    pub incident: Option<Uuid>,
}

impl Interception {
    pub fn must_block(&self) -> bool {
        self.action == Action::Block
    }

    /// Replacement JSON-RPC error envelope for a blocked message, in the
    /// framing the original arrived in. `None` when the message is forwarded.
    pub fn block_body(&self) -> Option<Bytes> {
        if !self.must_block() {
            return None;
        }

        let (code, message, mut data) = match &self.outcome {
            Outcome::InjectionDetected {
                tool_index,
                tool_name,
                score,
            } => (
                jsonrpc::ERROR_SECURITY_BLOCK,
                "Response blocked by gateway: tool description failed content audit",
                json!({
                    "reason": "injection_detected",
                    "toolIndex": tool_index,
                    "toolName": tool_name,
                    "score": score,
                }),
            ),
            Outcome::AuditUnavailable {
                tool_index,
                tool_name,
                ..
            } => (
                jsonrpc::ERROR_SECURITY_BLOCK,
                "Response blocked by gateway: content auditor unavailable",
                json!({
                    "reason": "audit_unavailable",
                    "toolIndex": tool_index,
                    "toolName": tool_name,
                }),
            ),
            Outcome::ContentTooLarge { size, limit } => (
                jsonrpc::ERROR_CONTENT_TOO_LARGE,
                "Message blocked by gateway: content too large",
                json!({
                    "reason": "content_too_large",
                    "size": size,
                    "limit": limit,
                }),
            ),
            Outcome::Malformed(MessageError::Decode(e)) => (
                jsonrpc::ERROR_PARSE,
                "Message blocked by gateway: malformed payload",
                json!({
                    "reason": "decode_failed",
                    "detail": e.to_string(),
                }),
            ),
            Outcome::Malformed(MessageError::Validation(e)) => (
                jsonrpc::ERROR_INVALID_REQUEST,
                "Message blocked by gateway: invalid envelope",
                json!({
                    "reason": "validation_failed",
                    "field": e.field,
                    "constraint": e.constraint.as_str(),
                }),
            ),
            // Never blocked.
            Outcome::Skipped | Outcome::Clean | Outcome::ProtocolError(_) => return None,
        };

        if let Some(obj) = data.as_object_mut() {
            obj.insert("gateway".to_string(), json!(gateway::NAME));
            if let Some(incident) = self.incident {
                obj.insert("incidentId".to_string(), json!(incident.to_string()));
            }
        }

        let envelope = json!({
            "jsonrpc": jsonrpc::VERSION,
            "id": self.id.clone().unwrap_or(Value::Null),
            "error": {
                "code": code,
                "message": message,
                "data": data,
            }
        });
        Some(codec::encode(&envelope, self.framing))
    }
}

/// Inspects MCP traffic in both directions against one config snapshot.
#[derive(Clone)]
pub struct Interceptor {
    config: Arc<GatewayConfig>,
    auditor: Arc<dyn ContentAuditor>,
    audit_log: AuditLogger,
}

impl Interceptor {
    pub fn new(config: GatewayConfig, auditor: Arc<dyn ContentAuditor>) -> Self {
        Self {
            config: Arc::new(config),
            auditor,
            audit_log: AuditLogger::new(),
        }
    }

    /// Validate `config` and wire it to an [`HttpAuditor`].
    pub fn from_config(config: GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let auditor = HttpAuditor::new(&config.audit)?;
        info!(
            in_check = config.in_check,
            out_check = config.out_check,
            audit = config.audit.enabled,
            threshold = config.audit.threshold,
            "Interceptor configured"
        );
        Ok(Self::new(config, Arc::new(auditor)))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Inspect a client → server message.
    pub fn process_request(&self, body: Bytes) -> Interception {
        let kind = MessageKind::Request;
        if !self.config.in_check {
            return self.skipped(body, kind);
        }

        if let Some(outcome) = self.oversized(&body) {
            let framing = Self::framing_hint(&body, kind);
            return self.reject(body, kind, None, framing, outcome);
        }

        let decoded = match Self::parse(&body, kind) {
            Ok(decoded) => decoded,
            Err((err, id, framing)) => {
                return self.reject(body, kind, id, framing, Outcome::Malformed(err));
            }
        };

        if let Envelope::Request(req) = &decoded.envelope {
            debug!(id = ?req.id, method = %req.method, "Processing request");
        }
        let id = decoded.envelope.id().cloned();
        self.finish(body, kind, id, decoded.framing, Outcome::Clean)
    }

    /// Inspect a server → client message.
    ///
    /// Auditor calls stop when `cancel` fires; the response then follows the
    /// `audit_unavailable` policy.
    pub async fn process_response(&self, body: Bytes, cancel: &CancellationToken) -> Interception {
        let kind = MessageKind::Response;
        if !self.config.out_check {
            return self.skipped(body, kind);
        }

        if let Some(outcome) = self.oversized(&body) {
            let framing = Self::framing_hint(&body, kind);
            return self.reject(body, kind, None, framing, outcome);
        }

        let decoded = match Self::parse(&body, kind) {
            Ok(decoded) => decoded,
            Err((err, id, framing)) => {
                return self.reject(body, kind, id, framing, Outcome::Malformed(err));
            }
        };
        let framing = decoded.framing;
        let id = decoded.envelope.id().cloned();

        let Envelope::Response(resp) = decoded.envelope else {
            return self.finish(body, kind, id, framing, Outcome::Clean);
        };

        if let Some(error) = resp.protocol_error() {
            let classification = ErrorClassifier::classify(error);
            return self.finish(body, kind, id, framing, Outcome::ProtocolError(classification));
        }

        let tools = resp.tools();
        if !tools.is_empty() {
            debug!(count = tools.len(), "Auditing tool descriptions");
        }

        let verdict =
            ToolAuditGate::audit(tools, &self.config.audit, self.auditor.as_ref(), cancel).await;

        match verdict {
            GateVerdict::Pass { scored } => {
                debug!(scored, "Tool audit passed");
                self.finish(body, kind, id, framing, Outcome::Clean)
            }
            GateVerdict::InjectionDetected {
                tool_index,
                tool_name,
                score,
            } => {
                let description_sha256 = tools
                    .get(tool_index)
                    .and_then(|t| t.auditable_description())
                    .map(fingerprint);
                let incident = self.audit_log.log(
                    "injection_detected",
                    json!({
                        "id": id,
                        "tool_index": tool_index,
                        "tool_name": tool_name,
                        "score": score,
                        "threshold": self.config.audit.threshold,
                        "description_sha256": description_sha256,
                    }),
                );
                Interception {
                    body,
                    kind,
                    outcome: Outcome::InjectionDetected {
                        tool_index,
                        tool_name,
                        score,
                    },
                    action: Action::Block,
                    id,
                    framing,
                    incident: Some(incident),
                }
            }
            GateVerdict::AuditUnavailable {
                tool_index,
                tool_name,
                cause,
            } => {
                let policy = self.config.policy.audit_unavailable;
                warn!(
                    tool_index,
                    error = %cause,
                    retryable = cause.is_retryable(),
                    ?policy,
                    "Response could not be audited"
                );
                let outcome = Outcome::AuditUnavailable {
                    tool_index,
                    tool_name,
                    cause,
                };
                match policy {
                    FailurePolicy::Open => self.finish(body, kind, id, framing, outcome),
                    FailurePolicy::Closed => self.block(body, kind, id, framing, outcome),
                }
            }
        }
    }

    /// Decode then validate, keeping whatever id and framing survived.
    fn parse(
        body: &[u8],
        kind: MessageKind,
    ) -> Result<Decoded, (MessageError, Option<Value>, Framing)> {
        let decoded = codec::decode(body, kind)
            .map_err(|e| (MessageError::from(e), None, Self::framing_hint(body, kind)))?;
        EnvelopeValidator::validate(&decoded.envelope).map_err(|e| {
            (
                MessageError::from(e),
                decoded.envelope.id().cloned(),
                decoded.framing,
            )
        })?;
        Ok(decoded)
    }

    fn framing_hint(body: &[u8], kind: MessageKind) -> Framing {
        match kind {
            MessageKind::Request => Framing::Json,
            MessageKind::Response => codec::sniff_framing(body),
        }
    }

    fn oversized(&self, body: &[u8]) -> Option<Outcome> {
        let limit = self.config.limits.max_body_bytes;
        (body.len() > limit).then(|| Outcome::ContentTooLarge {
            size: body.len(),
            limit,
        })
    }

    fn skipped(&self, body: Bytes, kind: MessageKind) -> Interception {
        let framing = Self::framing_hint(&body, kind);
        self.finish(body, kind, None, framing, Outcome::Skipped)
    }

    /// Apply the direction's malformed-message policy.
    fn reject(
        &self,
        body: Bytes,
        kind: MessageKind,
        id: Option<Value>,
        framing: Framing,
        outcome: Outcome,
    ) -> Interception {
        let policy = self.malformed_policy(kind);

        match &outcome {
            Outcome::Malformed(MessageError::Validation(e)) => warn!(
                ?kind,
                field = e.field,
                value = %e.value,
                constraint = %e.constraint,
                ?policy,
                "Message failed validation"
            ),
            Outcome::ContentTooLarge { size, limit } => {
                warn!(?kind, size, limit, ?policy, "Message exceeds size limit")
            }
            other => warn!(?kind, outcome = ?other, ?policy, "Message could not be decoded"),
        }

        match policy {
            FailurePolicy::Open => self.finish(body, kind, id, framing, outcome),
            FailurePolicy::Closed => self.block(body, kind, id, framing, outcome),
        }
    }

    /// A response that cannot be parsed cannot be audited either, so while
    /// auditing is on it is held to the stricter of the two policies.
    fn malformed_policy(&self, kind: MessageKind) -> FailurePolicy {
        let policy = &self.config.policy;
        match kind {
            MessageKind::Request => policy.request_malformed,
            MessageKind::Response if self.config.audit.enabled => {
                if policy.response_malformed.is_closed() || policy.audit_unavailable.is_closed() {
                    FailurePolicy::Closed
                } else {
                    FailurePolicy::Open
                }
            }
            MessageKind::Response => policy.response_malformed,
        }
    }

    fn block(
        &self,
        body: Bytes,
        kind: MessageKind,
        id: Option<Value>,
        framing: Framing,
        outcome: Outcome,
    ) -> Interception {
        let incident = self.audit_log.log(
            block_event(&outcome),
            json!({
                "kind": kind,
                "id": id,
                "size": body.len(),
                "outcome": format!("{:?}", outcome),
            }),
        );
        Interception {
            body,
            kind,
            outcome,
            action: Action::Block,
            id,
            framing,
            incident: Some(incident),
        }
    }

    fn finish(
        &self,
        body: Bytes,
        kind: MessageKind,
        id: Option<Value>,
        framing: Framing,
        outcome: Outcome,
    ) -> Interception {
        Interception {
            body,
            kind,
            outcome,
            action: Action::Forward,
            id,
            framing,
            incident: None,
        }
    }
}

fn block_event(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::InjectionDetected { .. } => "injection_detected",
        Outcome::AuditUnavailable { .. } => "audit_unavailable",
        Outcome::ContentTooLarge { .. } => "content_too_large",
        Outcome::Malformed(MessageError::Decode(_)) => "decode_failed",
        Outcome::Malformed(MessageError::Validation(_)) => "validation_failed",
        Outcome::Skipped | Outcome::Clean | Outcome::ProtocolError(_) => "blocked",
    }
}
