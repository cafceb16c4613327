// Copyright 2025 RpcBridge Authors
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

//! # RpcBridge CLI
//!
//! Operator tooling for the RpcBridge binding.
//!
//! The binary never talks to a remote service. It works on the artifacts the
//! bridge produces and consumes:
//!
//! - **Frames**: build and inspect argument payloads
//! - **Types**: show the remote parameter types the bridge would send
//! - **Keys**: check `group/interface:version` strings
//! - **Recovery log**: list the services a restarted bridge would restore
//!
//! Every helper returns a `serde_json::Value` or plain strings so the binary
//! can print machine-readable output.

use anyhow::{Context, Result};
use rpcbridge_client::RecoveryLog;
use rpcbridge_common::protocol::types::parse_type_hints;
use rpcbridge_common::{resolve_types, ArgValue, FrameCodec, ServiceKey};
use serde_json::{json, Value};
use std::path::Path;


/// Builds a frame payload and returns it hex encoded.
///
/// With `hex_input` each argument is itself hex; otherwise its UTF-8 bytes
/// are framed as-is.
pub fn encode_frames(args: &[String], hex_input: bool) -> Result<String> {
    let frames = args
        .iter()
        .map(|arg| {
            if hex_input {
                hex::decode(arg).with_context(|| format!("argument '{}' is not valid hex", arg))
            } else {
                Ok(arg.as_bytes().to_vec())
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(hex::encode(FrameCodec::encode(&frames)?))
}

/// Decodes a hex frame payload into a JSON array, one object per argument.
pub fn decode_frames(payload: &str) -> Result<Value> {
    let bytes = hex::decode(payload.trim()).context("payload is not valid hex")?;
    let frames = FrameCodec::decode(&bytes)?;

    let described = frames
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            json!({
                "index": index,
                "len": frame.len(),
                "hex": hex::encode(frame),
                "utf8": std::str::from_utf8(frame).ok(),
            })
        })
        .collect();

    Ok(Value::Array(described))
}

/// Resolves the parameter types for a JSON array of argument values.
pub fn resolve_json_types(args: &str, hints: Option<&str>, generic: bool) -> Result<Vec<String>> {
    let parsed: Value = serde_json::from_str(args).context("arguments are not valid JSON")?;
    let values = match parsed {
        Value::Array(items) => items.into_iter().map(ArgValue::from).collect::<Vec<_>>(),
        other => anyhow::bail!("expected a JSON array of arguments, got {}", other),
    };
    let hints = hints.map(parse_type_hints).unwrap_or_default();

    let types = resolve_types(&values, &hints, generic)?;
    Ok(types.into_iter().map(|t| t.into_string()).collect())
}

/// Parses a service key and returns its parts.
pub fn describe_key(input: &str) -> Result<Value> {
    let key = ServiceKey::parse(input)?;
    Ok(json!({
        "group": key.group,
        "interface": key.interface_name,
        "version": key.version,
        "canonical": key.canonical(),
        "registrable": key.has_interface(),
    }))
}

/// Lists the recovery log under `base_dir`.
///
/// Each entry reports whether a restarted bridge could parse it.
pub fn list_recovery_log(base_dir: &Path, product: &str, action: &str) -> Result<Value> {
    let log = RecoveryLog::with_scope(base_dir, product, action);
    let entries = log
        .load()
        .with_context(|| format!("failed to read {}", log.path().display()))?;

    let listed = entries
        .iter()
        .map(|entry| match ServiceKey::parse(entry) {
            Ok(key) => json!({ "entry": entry, "valid": key.has_interface() }),
            Err(e) => {
                tracing::warn!(entry = %entry, "Invalid recovery entry: {}", e);
                json!({ "entry": entry, "valid": false })
            }
        })
        .collect();

    Ok(json!({
        "path": log.path().display().to_string(),
        "entries": Value::Array(listed),
    }))
}
