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

// HTTP client for the external content auditor

use crate::config::AuditConfig;
use crate::engine_core::constants::auditor;
use crate::engine_core::errors::{AuditError, ConfigError};
use crate::engine_core::traits::ContentAuditor;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Body of `POST {endpoint}/check`
#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    token: &'a str,
    text: &'a str,
}

/// Auditor reached over HTTP.
///
/// One pooled client is shared by every response passing through the gateway.
pub struct HttpAuditor {
    http_client: Client,
    check_url: String,
    token: String,
    default_timeout: Duration,
}

impl HttpAuditor {
    pub fn new(config: &AuditConfig) -> Result<Self, ConfigError> {
        let timeout = config.timeout();
        let connect_timeout = timeout.min(Duration::from_secs(auditor::CONNECT_TIMEOUT_SECS));

        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .tcp_nodelay(true)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                ConfigError::invalid("audit", format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            check_url: format!(
                "{}{}",
                config.endpoint.trim_end_matches('/'),
                auditor::CHECK_PATH
            ),
            token: config.token.clone(),
            default_timeout: timeout,
        })
    }

    pub fn check_url(&self) -> &str {
        &self.check_url
    }
}

#[async_trait]
impl ContentAuditor for HttpAuditor {
    async fn score(&self, text: &str) -> Result<i64, AuditError> {
        debug!(url = %self.check_url, chars = text.len(), "Submitting text to auditor");

        let response = self
            .http_client
            .post(&self.check_url)
            .bearer_auth(&self.token)
            .json(&ScoreRequest {
                token: &self.token,
                text,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuditError::Timeout(self.default_timeout)
                } else {
                    AuditError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url = %self.check_url, "Auditor returned HTTP error");
            return Err(AuditError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AuditError::Timeout(self.default_timeout)
            } else {
                AuditError::Transport(e.to_string())
            }
        })?;
        parse_score(&body)
    }
}

/// Parse the auditor's plain-text decimal score.
pub fn parse_score(body: &str) -> Result<i64, AuditError> {
    let trimmed = body.trim();
    trimmed.parse::<i64>().map_err(|_| {
        // Cap what we echo back; the body is untrusted.
        AuditError::InvalidScore(trimmed.chars().take(64).collect())
    })
}
