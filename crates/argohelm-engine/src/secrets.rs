//! Secret decoding for rendered manifests
//!
//! `helm template` emits Secret `data` base64-encoded. For review it is far
//! easier to read the plain values, so every `data` entry of every
//! `kind: Secret` document is decoded in place.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_yaml::Value;

/// Decode Secret data in a multi-document manifest stream
///
/// Values that are not valid base64 or not UTF-8 once decoded are kept
/// unchanged. If the stream does not parse as YAML it is returned as-is.
pub fn decode_secrets(manifest: &str) -> String {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(manifest) {
        match Value::deserialize(document) {
            Ok(Value::Null) => {}
            Ok(mut value) => {
                decode_document(&mut value);
                documents.push(value);
            }
            Err(e) => {
                tracing::warn!("Failed to parse YAML, leaving output untouched: {}", e);
                return manifest.to_string();
            }
        }
    }

    let mut parts = Vec::with_capacity(documents.len());
    for document in &documents {
        match serde_yaml::to_string(document) {
            Ok(part) => parts.push(part),
            Err(e) => {
                tracing::warn!("Failed to serialize YAML, leaving output untouched: {}", e);
                return manifest.to_string();
            }
        }
    }

    format!("---\n{}", parts.join("---\n"))
}

fn decode_document(document: &mut Value) {
    if document.get("kind").and_then(Value::as_str) != Some("Secret") {
        return;
    }

    let name = document
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    tracing::debug!("Processing Secret: {}", name);

    let Some(data) = document.get_mut("data").and_then(Value::as_mapping_mut) else {
        return;
    };

    for (key, value) in data.iter_mut() {
        let key = key.as_str().unwrap_or("?");
        let Some(encoded) = value.as_str() else {
            continue;
        };

        match decode_value(encoded) {
            Ok(decoded) => {
                tracing::debug!("  Decoded key: {}", key);
                *value = Value::String(decoded);
            }
            Err(reason) => {
                tracing::warn!("Secret {}: failed to decode key {}: {}", name, key, reason);
            }
        }
    }
}

fn decode_value(encoded: &str) -> Result<String, String> {
    let bytes = STANDARD.decode(encoded.trim()).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}
