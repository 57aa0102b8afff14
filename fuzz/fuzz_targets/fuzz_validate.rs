// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use libfuzzer_sys::fuzz_target;
use snowfall::engine_core::models::{Envelope, McpRequest, McpResponse};
use snowfall::protocol::validator::EnvelopeValidator;

fuzz_target!(|data: &[u8]| {
    if let Ok(req) = serde_json::from_slice::<McpRequest>(data) {
        let _ = EnvelopeValidator::validate(&Envelope::Request(req));
    }
    if let Ok(resp) = serde_json::from_slice::<McpResponse>(data) {
        let _ = EnvelopeValidator::validate(&Envelope::Response(resp));
    }
});
