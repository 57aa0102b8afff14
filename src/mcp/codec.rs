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

//! MCP Frame Decoder.
//!
//! Extracts the JSON-RPC envelope from a fully buffered HTTP body.
//! Requests are always a single JSON object. Responses are either a single
//! JSON object (`application/json`) or an event stream (`text/event-stream`)
//! made of `key: value` lines, where the envelope is the value of the first
//! `data` line.
//!
//! No semantic checks happen here; see `protocol::validator`.

use crate::engine_core::constants::framing;
use crate::engine_core::errors::DecodeError;
use crate::engine_core::models::{Envelope, McpRequest, McpResponse, MessageKind};
use bytes::Bytes;
use serde_json::Value;
use tracing::trace;

/// Wire encoding a body arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Json,
    EventStream,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub envelope: Envelope,
    pub framing: Framing,
}

/// Decode `raw` as a message of the given kind.
pub fn decode(raw: &[u8], kind: MessageKind) -> Result<Decoded, DecodeError> {
    match kind {
        MessageKind::Request => {
            let req: McpRequest = serde_json::from_slice(raw)?;
            Ok(Decoded {
                envelope: Envelope::Request(req),
                framing: Framing::Json,
            })
        }
        MessageKind::Response => {
            let (payload, framing) = locate_response_payload(raw)?;
            let resp: McpResponse = serde_json::from_slice(payload)?;
            Ok(Decoded {
                envelope: Envelope::Response(resp),
                framing,
            })
        }
    }
}

/// Find the JSON bytes of a response body and report its framing.
///
/// A body whose first non-whitespace byte is `{` is raw JSON. Anything else is
/// scanned line by line and the first `data` line wins; scanning stops there.
pub fn locate_response_payload(raw: &[u8]) -> Result<(&[u8], Framing), DecodeError> {
    if sniff_framing(raw) == Framing::Json {
        return Ok((raw, Framing::Json));
    }

    let text = std::str::from_utf8(raw)?;
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key != framing::DATA_KEY {
            continue;
        }
        // Event-stream syntax allows exactly one optional space after the colon.
        let value = value.strip_prefix(' ').unwrap_or(value);
        trace!("Found data line ({} bytes)", value.len());
        return Ok((value.as_bytes(), Framing::EventStream));
    }

    Err(DecodeError::NoPayloadFound)
}

/// Guess a response body's framing without decoding it.
pub fn sniff_framing(raw: &[u8]) -> Framing {
    if raw.trim_ascii_start().first() == Some(&b'{') {
        Framing::Json
    } else {
        Framing::EventStream
    }
}

/// Serialize a synthesized envelope in the given framing.
pub fn encode(value: &Value, wire: Framing) -> Bytes {
    let body = value.to_string();
    match wire {
        Framing::Json => Bytes::from(body),
        Framing::EventStream => Bytes::from(format!(
            "event: {}\n{}: {}\n\n",
            framing::EVENT_MESSAGE,
            framing::DATA_KEY,
            body
        )),
    }
}
