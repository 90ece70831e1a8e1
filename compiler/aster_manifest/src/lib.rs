//! Package manifest validation.
//!
//! Validates the package metadata JSON document and returns either the
//! parsed [`Manifest`] or a non-empty diagnostic list with the stable codes
//! M001–M008. Validation always runs to completion so a single manifest
//! read reports every problem at once.

use std::collections::BTreeMap;
use std::path::Path;

use aster_diagnostic::{DiagCode, Diagnostic};
use aster_ir::{Capability, Span};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)*$").unwrap_or_else(|_| unreachable!())
});
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap_or_else(|_| unreachable!()));
static CONSTRAINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\^~]?\d+\.\d+\.\d+$").unwrap_or_else(|_| unreachable!()));
static EFFECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap_or_else(|_| unreachable!()));

const KNOWN_FIELDS: [&str; 6] = [
    "name",
    "version",
    "dependencies",
    "devDependencies",
    "effects",
    "capabilities",
];

/// Capability names as manifests spell them.
const CAPABILITY_NAMES: [(&str, Capability); 7] = [
    ("Http", Capability::Http),
    ("Sql", Capability::Sql),
    ("Time", Capability::Time),
    ("Files", Capability::Files),
    ("Secrets", Capability::Secrets),
    ("AiModel", Capability::AiModel),
    ("Cpu", Capability::Cpu),
];

/// A validated package manifest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Manifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
    pub effects: Vec<String>,
    pub capabilities: Option<ManifestCapabilities>,
}

/// Allow/deny capability lists from the manifest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManifestCapabilities {
    pub allow: Vec<Capability>,
    pub deny: Vec<Capability>,
}

/// Read and validate a manifest file.
pub fn parse_manifest(path: &Path) -> Result<Manifest, Vec<Diagnostic>> {
    let text = std::fs::read_to_string(path).map_err(|_| {
        vec![error(
            DiagCode::M002,
            format!("manifest file not found: {}", path.display()),
        )]
    })?;
    validate_manifest_str(&text)
}

/// Validate a manifest document already in memory.
pub fn validate_manifest_str(text: &str) -> Result<Manifest, Vec<Diagnostic>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| vec![error(DiagCode::M001, format!("manifest is not valid JSON: {e}"))])?;
    let Some(object) = value.as_object() else {
        return Err(vec![error(
            DiagCode::M001,
            "manifest must be a JSON object".to_string(),
        )]);
    };

    let mut diags = Vec::new();
    let mut manifest = Manifest::default();

    for key in object.keys() {
        if !KNOWN_FIELDS.contains(&key.as_str()) {
            diags.push(error(
                DiagCode::M007,
                format!("unknown manifest field `{key}`"),
            ));
        }
    }

    if let Some(name) = object.get("name") {
        match name.as_str() {
            Some(name) if NAME_RE.is_match(name) => manifest.name = Some(name.to_string()),
            _ => diags.push(error(
                DiagCode::M003,
                format!("invalid package name {name}"),
            )),
        }
    }

    if let Some(version) = object.get("version") {
        match version.as_str() {
            Some(v) if VERSION_RE.is_match(v) => manifest.version = Some(v.to_string()),
            _ => diags.push(error(
                DiagCode::M004,
                format!("invalid version {version} (expected N.N.N)"),
            )),
        }
    }

    manifest.dependencies =
        dependency_map(object.get("dependencies"), "dependencies", &mut diags);
    manifest.dev_dependencies =
        dependency_map(object.get("devDependencies"), "devDependencies", &mut diags);

    if let Some(effects) = object.get("effects") {
        match effects.as_array() {
            Some(items) => {
                for item in items {
                    match item.as_str() {
                        Some(name) if EFFECT_RE.is_match(name) => {
                            manifest.effects.push(name.to_string());
                        }
                        _ => diags.push(error(
                            DiagCode::M006,
                            format!("invalid effect name {item} (expected PascalCase)"),
                        )),
                    }
                }
            }
            None => diags.push(error(
                DiagCode::M006,
                "`effects` must be an array of names".to_string(),
            )),
        }
    }

    if let Some(caps) = object.get("capabilities") {
        manifest.capabilities = Some(capability_lists(caps, &mut diags));
    }

    if diags.is_empty() {
        Ok(manifest)
    } else {
        Err(diags)
    }
}

fn dependency_map(
    value: Option<&Value>,
    field: &str,
    diags: &mut Vec<Diagnostic>,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let Some(value) = value else { return map };
    let Some(object) = value.as_object() else {
        diags.push(error(
            DiagCode::M005,
            format!("`{field}` must be an object of name → constraint"),
        ));
        return map;
    };
    for (name, constraint) in object {
        if !NAME_RE.is_match(name) {
            diags.push(error(
                DiagCode::M003,
                format!("invalid dependency name `{name}` in `{field}`"),
            ));
            continue;
        }
        match constraint.as_str() {
            Some(c) if CONSTRAINT_RE.is_match(c) => {
                map.insert(name.clone(), c.to_string());
            }
            _ => diags.push(error(
                DiagCode::M005,
                format!(
                    "invalid constraint {constraint} for `{name}` (expected `^`, `~`, or exact N.N.N)"
                ),
            )),
        }
    }
    map
}

fn capability_lists(value: &Value, diags: &mut Vec<Diagnostic>) -> ManifestCapabilities {
    let mut lists = ManifestCapabilities::default();
    let Some(object) = value.as_object() else {
        diags.push(error(
            DiagCode::M008,
            "`capabilities` must be an object with `allow`/`deny` lists".to_string(),
        ));
        return lists;
    };
    for (key, entry) in object {
        let target = match key.as_str() {
            "allow" => &mut lists.allow,
            "deny" => &mut lists.deny,
            other => {
                diags.push(error(
                    DiagCode::M008,
                    format!("unknown capabilities list `{other}` (expected allow/deny)"),
                ));
                continue;
            }
        };
        let Some(items) = entry.as_array() else {
            diags.push(error(
                DiagCode::M008,
                format!("capabilities `{key}` must be an array"),
            ));
            continue;
        };
        for item in items {
            let cap = item
                .as_str()
                .and_then(|name| {
                    CAPABILITY_NAMES
                        .iter()
                        .find(|(spelling, _)| *spelling == name)
                        .map(|(_, cap)| *cap)
                });
            match cap {
                Some(cap) => target.push(cap),
                None => diags.push(error(
                    DiagCode::M008,
                    format!(
                        "unknown capability {item} (expected one of Http, Sql, Time, Files, Secrets, AiModel, Cpu)"
                    ),
                )),
            }
        }
    }
    lists
}

fn error(code: DiagCode, message: String) -> Diagnostic {
    Diagnostic::error(message, Span::DUMMY).with_code(code)
}
