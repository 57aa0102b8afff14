// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use libfuzzer_sys::fuzz_target;
use snowfall::engine_core::models::MessageKind;
use snowfall::mcp::codec;

fuzz_target!(|data: &[u8]| {
    // Any byte sequence must decode to Ok or Err, never panic.
    let _ = codec::decode(data, MessageKind::Request);
    let _ = codec::decode(data, MessageKind::Response);
    let _ = codec::sniff_framing(data);
});
