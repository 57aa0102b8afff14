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

//! Gateway configuration snapshot.
//!
//! The pipeline only ever reads an immutable `GatewayConfig` handed to it at
//! construction. Loading it (environment, YAML file) lives here so embedding
//! binaries share one set of names and defaults.

use crate::engine_core::constants::{config as keys, limits};
use crate::engine_core::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// What to do with a message when a check cannot reach a positive verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Forward the original bytes and log
    #[default]
    Open,
    /// Refuse to forward the message
    Closed,
}

impl FailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" | "fail_open" | "forward" => Some(FailurePolicy::Open),
            "closed" | "fail_closed" | "block" => Some(FailurePolicy::Closed),
            _ => None,
        }
    }

    pub fn is_closed(self) -> bool {
        self == FailurePolicy::Closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse_safe(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// External content auditor settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Base URL; `/check` is appended
    pub endpoint: String,
    pub token: String,
    /// Scores strictly above this value are treated as injection
    pub threshold: u8,
    pub timeout_ms: u64,
}

impl AuditConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `score > threshold`; a score equal to the threshold passes.
    pub fn exceeds(&self, score: i64) -> bool {
        score > i64::from(self.threshold)
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            token: String::new(),
            threshold: keys::DEFAULT_AUDIT_THRESHOLD,
            timeout_ms: keys::DEFAULT_AUDIT_TIMEOUT_MS,
        }
    }
}

// Keep the bearer token out of logs.
impl fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditConfig")
            .field("enabled", &self.enabled)
            .field("endpoint", &self.endpoint)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("threshold", &self.threshold)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Per-failure degrade modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicies {
    /// Request that fails decoding, validation or the size bound
    pub request_malformed: FailurePolicy,
    /// Response that fails decoding, validation or the size bound
    pub response_malformed: FailurePolicy,
    /// Auditor unreachable, timed out, or returned garbage
    pub audit_unavailable: FailurePolicy,
}

impl Default for FailurePolicies {
    fn default() -> Self {
        Self {
            request_malformed: FailurePolicy::Open,
            response_malformed: FailurePolicy::Open,
            audit_unavailable: FailurePolicy::Closed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_body_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_body_bytes: limits::MAX_MESSAGE_SIZE_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Inspect client → server requests
    pub in_check: bool,
    /// Inspect server → client responses
    pub out_check: bool,
    pub audit: AuditConfig,
    pub policy: FailurePolicies,
    pub limits: Limits,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            in_check: true,
            out_check: true,
            audit: AuditConfig::default(),
            policy: FailurePolicies::default(),
            limits: Limits::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl GatewayConfig {
    /// Read `SF_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key → value source, then validate it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(keys::ENV_IN_CHECK) {
            config.in_check = parse_switch(keys::ENV_IN_CHECK, &v)?;
        }
        if let Some(v) = lookup(keys::ENV_OUT_CHECK) {
            config.out_check = parse_switch(keys::ENV_OUT_CHECK, &v)?;
        }
        if let Some(v) = lookup(keys::ENV_AUDIT) {
            config.audit.enabled = parse_switch(keys::ENV_AUDIT, &v)?;
        }
        if let Some(v) = lookup(keys::ENV_AUDIT_URL) {
            config.audit.endpoint = v;
        }
        if let Some(v) = lookup(keys::ENV_AUDIT_TOKEN) {
            config.audit.token = v;
        }
        if let Some(v) = lookup(keys::ENV_AUDIT_THRESHOLD) {
            config.audit.threshold = parse_number(keys::ENV_AUDIT_THRESHOLD, &v)?;
        }
        if let Some(v) = lookup(keys::ENV_AUDIT_TIMEOUT_MS) {
            config.audit.timeout_ms = parse_number(keys::ENV_AUDIT_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(keys::ENV_REQUEST_POLICY) {
            config.policy.request_malformed = parse_policy(keys::ENV_REQUEST_POLICY, &v)?;
        }
        if let Some(v) = lookup(keys::ENV_RESPONSE_POLICY) {
            config.policy.response_malformed = parse_policy(keys::ENV_RESPONSE_POLICY, &v)?;
        }
        if let Some(v) = lookup(keys::ENV_AUDIT_POLICY) {
            config.policy.audit_unavailable = parse_policy(keys::ENV_AUDIT_POLICY, &v)?;
        }
        if let Some(v) = lookup(keys::ENV_MAX_BODY_BYTES) {
            config.limits.max_body_bytes = parse_number(keys::ENV_MAX_BODY_BYTES, &v)?;
        }
        if let Some(v) = lookup(keys::ENV_LOG_LEVEL) {
            config.log_level = v;
        }
        if let Some(v) = lookup(keys::ENV_LOG_FORMAT) {
            config.log_format = LogFormat::parse_safe(&v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a YAML document; absent keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_yaml_ng::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints. Reports the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audit.threshold > keys::MAX_AUDIT_THRESHOLD {
            return Err(ConfigError::invalid(
                "audit.threshold",
                format!(
                    "must be within 0..={}, got {}",
                    keys::MAX_AUDIT_THRESHOLD,
                    self.audit.threshold
                ),
            ));
        }

        if self.audit.enabled {
            if self.audit.endpoint.is_empty() {
                return Err(ConfigError::invalid(
                    "audit.endpoint",
                    "is required when auditing is enabled",
                ));
            }
            match reqwest::Url::parse(&self.audit.endpoint) {
                Ok(url) if url.scheme() == "https" && !cfg!(feature = "tls") => {
                    return Err(ConfigError::invalid(
                        "audit.endpoint",
                        "https requires building with the `tls` feature",
                    ))
                }
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => {
                    return Err(ConfigError::invalid(
                        "audit.endpoint",
                        format!("must use http or https, got {}", url.scheme()),
                    ))
                }
                Err(e) => {
                    return Err(ConfigError::invalid(
                        "audit.endpoint",
                        format!("is not a valid URL: {}", e),
                    ))
                }
            }
            if self.audit.token.is_empty() {
                return Err(ConfigError::invalid(
                    "audit.token",
                    "is required when auditing is enabled",
                ));
            }
            if self.audit.timeout_ms == 0 {
                return Err(ConfigError::invalid("audit.timeout_ms", "must be positive"));
            }
        }

        if self.limits.max_body_bytes == 0 {
            return Err(ConfigError::invalid("limits.max_body_bytes", "must be positive"));
        }

        Ok(())
    }
}

fn parse_switch(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::invalid(
            field,
            format!("must be on or off, got {:?}", other),
        )),
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, format!("is not a number: {:?}", value)))
}

fn parse_policy(field: &'static str, value: &str) -> Result<FailurePolicy, ConfigError> {
    FailurePolicy::parse(value).ok_or_else(|| {
        ConfigError::invalid(field, format!("must be open or closed, got {:?}", value))
    })
}
