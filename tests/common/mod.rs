// Shared test doubles for the integration suites

#![allow(dead_code)]

use async_trait::async_trait;
use snowfall::engine_core::errors::AuditError;
use snowfall::engine_core::traits::ContentAuditor;
use snowfall::GatewayConfig;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Auditor that answers from a fixed table and records every submitted text.
#[derive(Default)]
pub struct MockAuditor {
    pub scores: HashMap<String, i64>,
    pub default_score: i64,
    pub fail_with: Option<AuditError>,
    pub calls: Mutex<Vec<String>>,
}

impl MockAuditor {
    pub fn scoring(pairs: &[(&str, i64)]) -> Self {
        Self {
            scores: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Self::default()
        }
    }

    pub fn failing(cause: AuditError) -> Self {
        Self {
            fail_with: Some(cause),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentAuditor for MockAuditor {
    async fn score(&self, text: &str) -> Result<i64, AuditError> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(cause) = &self.fail_with {
            return Err(cause.clone());
        }
        Ok(self.scores.get(text).copied().unwrap_or(self.default_score))
    }
}

/// Never answers within any reasonable timeout.
pub struct HangingAuditor;

#[async_trait]
impl ContentAuditor for HangingAuditor {
    async fn score(&self, _text: &str) -> Result<i64, AuditError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(0)
    }
}

pub fn audit_config(threshold: u8) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.audit.enabled = true;
    config.audit.endpoint = "http://127.0.0.1:1".to_string();
    config.audit.token = "test-token".to_string();
    config.audit.threshold = threshold;
    config
}

pub fn tools_response(id: u64, tools: serde_json::Value) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": { "tools": tools }
    })
    .to_string()
}

pub fn event_stream(json: &str) -> String {
    format!("event: message\ndata: {}\n\n", json)
}
