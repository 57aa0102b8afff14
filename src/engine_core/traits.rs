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

//! Content Auditor Trait.
//!
//! Defines the seam between the tool audit gate and whatever service scores
//! text for prompt-injection likelihood.

use crate::engine_core::errors::AuditError;
use async_trait::async_trait;

/// Scores arbitrary text for injection likelihood.
///
/// Scores are intended to fall in 0..=100 but the range is not enforced;
/// the gate compares whatever comes back against its threshold.
/// Deadlines and cancellation are applied by the caller, so implementations
/// only need to report their own transport and parse failures.
#[async_trait]
pub trait ContentAuditor: Send + Sync {
    async fn score(&self, text: &str) -> Result<i64, AuditError>;
}
