//! Rendered manifest files

use serde::Deserialize;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Manifest file name for plain renders
pub const MANIFEST_FILE: &str = ".manifest.yaml";

/// Manifest file name when Secret data has been decoded
pub const SECRETS_MANIFEST_FILE: &str = ".manifest.secrets.yaml";

pub fn manifest_file_name(decoded_secrets: bool) -> &'static str {
    if decoded_secrets {
        SECRETS_MANIFEST_FILE
    } else {
        MANIFEST_FILE
    }
}

/// Write a rendered manifest into `output_dir`, returning the file path
pub fn write_manifest(output_dir: &Path, content: &str, decoded_secrets: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(manifest_file_name(decoded_secrets));
    std::fs::write(&path, content)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}

/// Rewrite a multi-document YAML file with every mapping's keys sorted
///
/// Makes two renders comparable regardless of the key order the templates
/// happened to emit.
pub fn sort_yaml_file(path: &Path) -> Result<()> {
    tracing::debug!("Sorting {}", path.display());

    let content = std::fs::read_to_string(path)?;
    let mut parts = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        parts.push(serde_yaml::to_string(&sort_keys(value))?);
    }

    std::fs::write(path, parts.join("---\n"))?;
    Ok(())
}

/// Recursively sort mapping keys
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(Value, Value)> = map.into_iter().collect();
            entries.sort_by_cached_key(|(k, _)| key_text(k));
            Value::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Mapping>(),
            )
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sort_keys).collect()),
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            Value::Tagged(Box::new(TaggedValue {
                tag,
                value: sort_keys(value),
            }))
        }
        other => other,
    }
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}
