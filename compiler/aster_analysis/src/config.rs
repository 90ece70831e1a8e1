//! Built-in effect signatures and the optional effect-config JSON.
//!
//! Patterns are prefix matches against qualified callee names. The config
//! file is cached by `(path, mtime)` and reloads automatically when either
//! changes; `force_reload` exists for tests.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use aster_ir::{Capability, Effect};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

/// Prefix → (effect, capability) signature table.
#[derive(Clone, Debug)]
pub struct EffectTable {
    entries: Vec<(String, Effect, Capability)>,
}

impl EffectTable {
    /// The default built-in signatures.
    pub fn builtin() -> Self {
        let entry = |p: &str, e, c| (p.to_string(), e, c);
        EffectTable {
            entries: vec![
                entry("Http.", Effect::Io, Capability::Http),
                entry("Sql.", Effect::Io, Capability::Sql),
                entry("Time.", Effect::Io, Capability::Time),
                entry("Files.", Effect::Io, Capability::Files),
                entry("Secrets.", Effect::Io, Capability::Secrets),
                entry("Ai.", Effect::Io, Capability::AiModel),
                entry("Crypto.", Effect::Cpu, Capability::Cpu),
                entry("Math.", Effect::Cpu, Capability::Cpu),
            ],
        }
    }

    /// Longest-prefix lookup for a qualified callee name.
    pub fn lookup(&self, callee: &str) -> Option<(Effect, Capability)> {
        self.entries
            .iter()
            .filter(|(prefix, _, _)| callee.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _, _)| prefix.len())
            .map(|(_, effect, cap)| (*effect, *cap))
    }

    fn from_file(file: &EffectConfigFile) -> Self {
        let mut entries = Vec::new();
        for (family, prefixes) in &file.patterns.io {
            let Some(cap) = Capability::parse_name(family) else { continue };
            for prefix in prefixes {
                entries.push((prefix.clone(), Effect::Io, cap));
            }
        }
        for prefix in &file.patterns.ai {
            entries.push((prefix.clone(), Effect::Io, Capability::AiModel));
        }
        for prefix in &file.patterns.cpu {
            entries.push((prefix.clone(), Effect::Cpu, Capability::Cpu));
        }
        EffectTable { entries }
    }
}

#[derive(Deserialize, Default)]
struct EffectConfigFile {
    #[serde(default)]
    patterns: PatternsSection,
}

#[derive(Deserialize, Default)]
struct PatternsSection {
    /// Capability family (lowercase name) → callee prefixes.
    #[serde(default)]
    io: FxHashMap<String, Vec<String>>,
    #[serde(default)]
    cpu: Vec<String>,
    #[serde(default)]
    ai: Vec<String>,
}

/// Mtime-keyed cache around the effect-config file.
///
/// The only caching state in the pipeline; one instance per embedder.
#[derive(Debug, Default)]
pub struct EffectConfigCache {
    path: Option<PathBuf>,
    mtime: Option<SystemTime>,
    table: Option<EffectTable>,
}

impl EffectConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table for `path`, reloading when the path or mtime changed.
    /// Falls back to the built-in table when the file is missing or bad.
    pub fn table_for(&mut self, path: &Path) -> EffectTable {
        let mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        let stale = self.path.as_deref() != Some(path)
            || self.mtime != mtime
            || self.table.is_none();
        if stale {
            debug!(path = %path.display(), "reloading effect config");
            self.path = Some(path.to_path_buf());
            self.mtime = mtime;
            self.table = Some(load_table(path));
        }
        self.table.clone().unwrap_or_else(EffectTable::builtin)
    }

    /// Drop the cached table; the next `table_for` reloads from disk.
    pub fn force_reload(&mut self) {
        self.table = None;
        self.mtime = None;
    }
}

fn load_table(path: &Path) -> EffectTable {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str::<EffectConfigFile>(&text) {
            Ok(file) => EffectTable::from_file(&file),
            Err(_) => EffectTable::builtin(),
        },
        Err(_) => EffectTable::builtin(),
    }
}
