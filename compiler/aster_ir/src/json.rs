//! Versioned Core IR JSON codec.
//!
//! The envelope is `{ "version": "1.0", "module": { … }, "metadata"?: { … } }`.
//! Deserialization rejects a missing or unknown version. Field order is
//! deterministic (struct declaration order), so serializing the same module
//! twice yields the same bytes; equality comparisons go through
//! [`prune_for_compare`], which strips positional bookkeeping.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CoreModule;

/// Current Core IR serialization version.
pub const CORE_IR_VERSION: &str = "1.0";

/// Keys stripped before structural comparison.
const PRUNED_KEYS: [&str; 5] = ["span", "file", "origin", "nameSpan", "variantSpans"];

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: String,
    module: CoreModule,
    #[serde(skip_serializing_if = "std::option::Option::is_none")]
    metadata: Option<Value>,
}

/// Failure to decode a Core IR document.
#[derive(Debug)]
pub enum CodecError {
    /// The document is not valid JSON or not a valid envelope.
    Parse(String),
    /// The envelope carries a version this build does not understand.
    UnsupportedVersion(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Parse(msg) => write!(f, "invalid Core IR JSON: {msg}"),
            CodecError::UnsupportedVersion(v) => {
                write!(f, "unsupported Core IR version `{v}` (expected `{CORE_IR_VERSION}`)")
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Serialize a module into the versioned envelope.
pub fn serialize_core_ir(module: &CoreModule, metadata: Option<Value>) -> String {
    let envelope = Envelope {
        version: CORE_IR_VERSION.to_string(),
        module: module.clone(),
        metadata,
    };
    // CoreModule contains no map types, so serialization cannot fail.
    serde_json::to_string(&envelope).unwrap_or_default()
}

/// Decode a versioned envelope back into a module.
pub fn deserialize_core_ir(json: &str) -> Result<CoreModule, CodecError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| CodecError::Parse(e.to_string()))?;
    let version = value
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::Parse("missing `version` field".to_string()))?;
    if version != CORE_IR_VERSION {
        return Err(CodecError::UnsupportedVersion(version.to_string()));
    }
    let envelope: Envelope =
        serde_json::from_value(value).map_err(|e| CodecError::Parse(e.to_string()))?;
    Ok(envelope.module)
}

/// True when the string decodes as a current-version Core IR envelope.
pub fn is_valid_core_ir_json(json: &str) -> bool {
    deserialize_core_ir(json).is_ok()
}

/// Strip spans, origins, and empty `typeParams` in place, recursively.
///
/// Test tooling compares modules after this prune so that formatting-only
/// and position-only differences never affect equality.
pub fn prune_for_compare(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in PRUNED_KEYS {
                map.remove(key);
            }
            let empty_type_params = map
                .get("typeParams")
                .and_then(Value::as_array)
                .is_some_and(Vec::is_empty);
            if empty_type_params {
                map.remove("typeParams");
            }
            for child in map.values_mut() {
                prune_for_compare(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                prune_for_compare(item);
            }
        }
        _ => {}
    }
}

/// Serialize and prune in one step, for structural comparisons.
pub fn pruned_value(module: &CoreModule) -> Value {
    let mut value = serde_json::to_value(module).unwrap_or(Value::Null);
    prune_for_compare(&mut value);
    value
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::{Origin, Position, Span};

    fn sample_module() -> CoreModule {
        CoreModule {
            name: Some("demo.greet".into()),
            decls: vec![],
            span: Span::point(Position::ORIGIN),
            origin: Origin::new("demo.aster", Span::DUMMY),
        }
    }

    #[test]
    fn round_trip_preserves_module() {
        let module = sample_module();
        let json = serialize_core_ir(&module, None);
        let back = deserialize_core_ir(&json).unwrap();
        assert_eq!(back, module);
    }

    #[test]
    fn serialization_is_deterministic() {
        let module = sample_module();
        assert_eq!(serialize_core_ir(&module, None), serialize_core_ir(&module, None));
    }

    #[test]
    fn reserialize_is_byte_identical() {
        let module = sample_module();
        let json = serialize_core_ir(&module, None);
        let back = deserialize_core_ir(&json).unwrap();
        assert_eq!(serialize_core_ir(&back, None), json);
    }

    #[test]
    fn missing_version_rejected() {
        let module = sample_module();
        let json = serialize_core_ir(&module, None);
        let mut value: Value = serde_json::from_str(&json).unwrap();
        value.as_object_mut().unwrap().remove("version");
        assert!(!is_valid_core_ir_json(&value.to_string()));
    }

    #[test]
    fn unknown_version_rejected() {
        let module = sample_module();
        let json = serialize_core_ir(&module, None).replace("\"1.0\"", "\"9.9\"");
        match deserialize_core_ir(&json) {
            Err(CodecError::UnsupportedVersion(v)) => assert_eq!(v, "9.9"),
            other => panic!("expected version error, got {other:?}"),
        }
    }

    #[test]
    fn metadata_survives_envelope() {
        let module = sample_module();
        let meta = serde_json::json!({ "tool": "asterc" });
        let json = serialize_core_ir(&module, Some(meta.clone()));
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"], meta);
    }

    #[test]
    fn prune_removes_spans_and_origin() {
        let module = sample_module();
        let pruned = pruned_value(&module);
        assert!(pruned.get("span").is_none());
        assert!(pruned.get("origin").is_none());
        assert_eq!(pruned["name"], "demo.greet");
    }

    #[test]
    fn prune_removes_empty_type_params_only() {
        let mut value = serde_json::json!({
            "typeParams": [],
            "nested": { "typeParams": ["T"], "span": { "s": 1 } }
        });
        prune_for_compare(&mut value);
        assert!(value.get("typeParams").is_none());
        assert_eq!(value["nested"]["typeParams"], serde_json::json!(["T"]));
        assert!(value["nested"].get("span").is_none());
    }

    #[test]
    fn not_json_is_invalid() {
        assert!(!is_valid_core_ir_json("not json at all"));
    }
}
