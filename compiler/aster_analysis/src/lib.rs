//! Static analyzers over Core IR.
//!
//! Three independent, non-fatal passes: the effect/capability checker, the
//! PII flow analyzer, and the match-exhaustiveness hint. Each returns a
//! (possibly empty) diagnostic list in source-position order and never
//! fails on valid input.

mod config;
mod effects;
mod exhaustive;
mod manifest;
mod pii;

pub use config::{EffectConfigCache, EffectTable};
pub use effects::{check_effects, typecheck_module_with_capabilities};
pub use exhaustive::check_exhaustiveness;
pub use manifest::CapabilityManifest;
pub use pii::{check_pii_flow, check_pii_flow_with, PiiOptions};
