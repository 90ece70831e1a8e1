//! The Aster front-end, assembled.
//!
//! # Architecture
//!
//! ```text
//! source text
//!     │  canonicalize()          aster_canon
//!     ▼
//! canonical text
//!     │  lex()                   aster_lexer
//!     ▼
//! tokens ──► translate ──► parse aster_translate / aster_parse
//!     ▼
//! surface AST
//!     │  lower_module()          aster_lower
//!     ▼
//! Core IR ──► effect/capability + PII analyzers   aster_analysis
//! ```
//!
//! Every stage is a pure function from input to `(output, diagnostics)`;
//! the [`compile`] driver threads them together, converting the fatal
//! lex/parse/lower errors into diagnostics at the boundary. Diagnostics
//! arrive in pipeline order, position-ascending within each stage.

use std::sync::Arc;

use aster_diagnostic::Diagnostic;
use aster_ir::CoreModule;
use aster_lexicon::Lexicon;

pub use aster_analysis::{
    check_effects, check_exhaustiveness, check_pii_flow, check_pii_flow_with,
    typecheck_module_with_capabilities, CapabilityManifest, EffectConfigCache, EffectTable,
    PiiOptions,
};
pub use aster_canon::{canonicalize, canonicalize_with_options, Options as CanonOptions};
pub use aster_ir::json::{
    deserialize_core_ir, is_valid_core_ir_json, prune_for_compare, pruned_value,
    serialize_core_ir, CORE_IR_VERSION,
};
pub use aster_lexer::{lex, LexError};
pub use aster_lexicon::registry;
pub use aster_lower::{lower_module, lower_module_in_file, LowerError};
pub use aster_manifest::{parse_manifest, validate_manifest_str, Manifest};
pub use aster_parse::{parse, parse_with_lexicon, ParseError};
pub use aster_translate::{translate, translate_to_english};

/// What a full pipeline run produces: the Core module when the front half
/// succeeded, plus every diagnostic in pipeline order.
#[derive(Debug)]
pub struct CompileOutput {
    pub core: Option<CoreModule>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    /// True when no diagnostic is an error.
    pub fn is_clean(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Options for a [`compile`] run.
#[derive(Clone)]
pub struct CompileOptions {
    pub lexicon: Arc<Lexicon>,
    /// File name recorded in Core IR origins.
    pub file: String,
    pub manifest: Option<CapabilityManifest>,
    pub strict_pii: bool,
    /// Effect signatures; the built-in table when absent.
    pub effect_table: Option<EffectTable>,
}

impl CompileOptions {
    pub fn new(lexicon: Arc<Lexicon>, file: impl Into<String>) -> Self {
        CompileOptions {
            lexicon,
            file: file.into(),
            manifest: None,
            strict_pii: false,
            effect_table: None,
        }
    }

    /// Options with the process-default lexicon.
    pub fn default_locale(file: impl Into<String>) -> Self {
        Self::new(registry::get_default(), file)
    }

    pub fn with_manifest(mut self, manifest: CapabilityManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_strict_pii(mut self, strict: bool) -> Self {
        self.strict_pii = strict;
        self
    }

    pub fn with_effect_table(mut self, table: EffectTable) -> Self {
        self.effect_table = Some(table);
        self
    }
}

/// Run the whole pipeline on one source document.
///
/// Lex, parse, and lower failures are fatal to their stage: the run stops
/// there and the error comes back as a diagnostic. The analyzers are
/// non-fatal and always contribute their lists.
pub fn compile(source: &str, options: &CompileOptions) -> CompileOutput {
    let lexicon = &options.lexicon;
    tracing::debug!(file = %options.file, locale = %lexicon.id, "compiling");
    let canonical = canonicalize(source, lexicon);

    let tokens = match lex(&canonical, lexicon) {
        Ok(tokens) => tokens,
        Err(err) => {
            return CompileOutput {
                core: None,
                diagnostics: vec![err.to_diagnostic()],
            }
        }
    };

    let module = match parse_with_lexicon(&tokens, lexicon) {
        Ok(module) => module,
        Err(errors) => {
            return CompileOutput {
                core: None,
                diagnostics: errors.iter().map(ParseError::to_diagnostic).collect(),
            }
        }
    };

    let core = match lower_module_in_file(&module, &options.file) {
        Ok(core) => core,
        Err(err) => {
            return CompileOutput {
                core: None,
                diagnostics: vec![err.to_diagnostic()],
            }
        }
    };

    let table = options
        .effect_table
        .clone()
        .unwrap_or_else(EffectTable::builtin);
    let mut diagnostics = check_effects(&core, &table, options.manifest.as_ref());
    diagnostics.extend(check_exhaustiveness(&core));
    aster_diagnostic::sort_by_position(&mut diagnostics);
    let pii = if options.strict_pii {
        check_pii_flow_with(&core, &PiiOptions { strict: true, ..PiiOptions::default() })
    } else {
        check_pii_flow(&core)
    };
    diagnostics.extend(pii);

    CompileOutput { core: Some(core), diagnostics }
}
