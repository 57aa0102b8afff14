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

//! snowfall: MCP traffic interception core.
//!
//! This library decodes, validates and audits Model Context Protocol messages
//! on their way between an AI client and an MCP server. Transport adapters
//! (HTTP reverse proxy, STDIO bridge) hand complete bodies to
//! [`mcp::pipeline::Interceptor`] and apply the returned verdict.

pub mod config;
pub mod engine;
pub mod engine_core;
pub mod mcp;
pub mod protocol;
pub mod utils;

pub use config::{AuditConfig, FailurePolicy, GatewayConfig};
pub use mcp::pipeline::{Action, Interception, Interceptor, Outcome};
