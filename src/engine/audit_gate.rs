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

//! Tool Audit Gate.
//!
//! Scores every advertised tool description with the content auditor, in
//! declaration order, and stops at the first one above the threshold. The gate
//! only reports; forwarding policy is the orchestrator's job.

use crate::config::AuditConfig;
use crate::engine_core::errors::AuditError;
use crate::engine_core::models::ToolDescriptor;
use crate::engine_core::traits::ContentAuditor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Score of one tool description against the configured threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditVerdict {
    pub tool_index: usize,
    pub score: i64,
    pub exceeded: bool,
}

impl AuditVerdict {
    pub fn new(tool_index: usize, score: i64, config: &AuditConfig) -> Self {
        Self {
            tool_index,
            score,
            exceeded: config.exceeds(score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    /// No description exceeded the threshold; `scored` descriptions were submitted
    Pass { scored: usize },
    InjectionDetected {
        tool_index: usize,
        tool_name: String,
        score: i64,
    },
    /// The auditor could not score the tool at `tool_index`
    AuditUnavailable {
        tool_index: usize,
        tool_name: String,
        cause: AuditError,
    },
}

pub struct ToolAuditGate;

impl ToolAuditGate {
    /// Audit `tools` sequentially. A disabled config passes without any call.
    pub async fn audit(
        tools: &[ToolDescriptor],
        config: &AuditConfig,
        auditor: &dyn ContentAuditor,
        cancel: &CancellationToken,
    ) -> GateVerdict {
        if !config.enabled {
            return GateVerdict::Pass { scored: 0 };
        }

        let mut scored = 0;
        for (index, tool) in tools.iter().enumerate() {
            debug!(index, name = %tool.name, "Tool discovered");

            let Some(description) = tool.auditable_description() else {
                continue;
            };

            let score = match Self::score_one(description, config, auditor, cancel).await {
                Ok(score) => score,
                Err(cause) => {
                    error!(
                        index,
                        name = %tool.name,
                        error = %cause,
                        "Auditor unavailable"
                    );
                    return GateVerdict::AuditUnavailable {
                        tool_index: index,
                        tool_name: tool.name.clone(),
                        cause,
                    };
                }
            };
            scored += 1;

            let verdict = AuditVerdict::new(index, score, config);
            if verdict.exceeded {
                warn!(
                    index,
                    name = %tool.name,
                    score,
                    threshold = config.threshold,
                    "Description score above threshold: injection detected"
                );
                return GateVerdict::InjectionDetected {
                    tool_index: index,
                    tool_name: tool.name.clone(),
                    score,
                };
            }
            debug!(index, score, "Description score within threshold");
        }

        GateVerdict::Pass { scored }
    }

    /// One auditor call, bounded by the config timeout and the caller's token.
    async fn score_one(
        text: &str,
        config: &AuditConfig,
        auditor: &dyn ContentAuditor,
        cancel: &CancellationToken,
    ) -> Result<i64, AuditError> {
        let timeout = config.timeout();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AuditError::Cancelled),
            res = tokio::time::timeout(timeout, auditor.score(text)) => {
                match res {
                    Ok(scored) => scored,
                    Err(_) => Err(AuditError::Timeout(timeout)),
                }
            }
        }
    }
}
