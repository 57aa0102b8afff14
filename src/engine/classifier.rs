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

//! Protocol error classification.
//!
//! Purely observational: maps an upstream error code to a registry entry and
//! emits one structured event. It never alters the message or the verdict.

use crate::engine_core::models::ErrorInfo;
use crate::protocol::registry;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Known {
        code: i64,
        codename: &'static str,
        reason: &'static str,
    },
    /// Code outside the registry; kept verbatim
    Unknown { code: i64, message: String },
}

impl Classification {
    pub fn code(&self) -> i64 {
        match self {
            Classification::Known { code, .. } | Classification::Unknown { code, .. } => *code,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Classification::Known { .. })
    }
}

pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn classify(error: &ErrorInfo) -> Classification {
        match registry::lookup(error.code) {
            Some(known) => {
                warn!(
                    code = known.code,
                    codename = known.codename,
                    reason = known.reason,
                    "Known MCP error"
                );
                Classification::Known {
                    code: known.code,
                    codename: known.codename,
                    reason: known.reason,
                }
            }
            None => {
                warn!(
                    code = error.code,
                    message = %error.message,
                    "Unknown MCP error"
                );
                Classification::Unknown {
                    code: error.code,
                    message: error.message.clone(),
                }
            }
        }
    }
}
