//! Stable machine-readable diagnostic codes.

use std::fmt;

use aster_ir::Effect;
use serde::{Serialize, Serializer};

/// Diagnostic codes, grouped by pipeline stage.
///
/// The `Display` spelling is the wire format consumed by code-action
/// tooling; it never changes for an existing variant.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiagCode {
    // Lexer
    LexIllegalChar,
    LexBadIndent,
    LexUnterminatedString,
    LexDedentMismatch,

    // Parser
    ParseExpected,
    ParseUnexpectedKeyword,
    ParseBadConstraint,
    ParseUnknownCapability,
    ParseUnbalancedParens,

    // Lowering
    UnknownEffect,

    // Effect / capability analysis
    EffMissingIo,
    EffMissingCpu,
    EffSuperfluousIo,
    EffSuperfluousCpu,
    CapabilityNotAllowed,
    CapabilityManifest,

    // Semantic hints
    MatchNotExhaustive,

    // PII flow
    PiiHttpLeak,
    PiiMissingConsent,

    // Package manifest (M001–M008)
    M001,
    M002,
    M003,
    M004,
    M005,
    M006,
    M007,
    M008,
}

impl DiagCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagCode::LexIllegalChar => "LEX_ILLEGAL_CHAR",
            DiagCode::LexBadIndent => "LEX_BAD_INDENT",
            DiagCode::LexUnterminatedString => "LEX_UNTERMINATED_STRING",
            DiagCode::LexDedentMismatch => "LEX_DEDENT_MISMATCH",
            DiagCode::ParseExpected => "PARSE_EXPECTED",
            DiagCode::ParseUnexpectedKeyword => "PARSE_UNEXPECTED_KEYWORD",
            DiagCode::ParseBadConstraint => "PARSE_BAD_CONSTRAINT",
            DiagCode::ParseUnknownCapability => "PARSE_UNKNOWN_CAPABILITY",
            DiagCode::ParseUnbalancedParens => "PARSE_UNBALANCED_PARENS",
            DiagCode::UnknownEffect => "UNKNOWN_EFFECT",
            DiagCode::EffMissingIo => "EFF_MISSING_IO",
            DiagCode::EffMissingCpu => "EFF_MISSING_CPU",
            DiagCode::EffSuperfluousIo => "EFF_SUPERFLUOUS_IO",
            DiagCode::EffSuperfluousCpu => "EFF_SUPERFLUOUS_CPU",
            DiagCode::CapabilityNotAllowed => "CAPABILITY_NOT_ALLOWED",
            DiagCode::CapabilityManifest => "CAPABILITY_MANIFEST",
            DiagCode::MatchNotExhaustive => "MATCH_NOT_EXHAUSTIVE",
            DiagCode::PiiHttpLeak => "PII_HTTP_LEAK",
            DiagCode::PiiMissingConsent => "PII_MISSING_CONSENT",
            DiagCode::M001 => "M001",
            DiagCode::M002 => "M002",
            DiagCode::M003 => "M003",
            DiagCode::M004 => "M004",
            DiagCode::M005 => "M005",
            DiagCode::M006 => "M006",
            DiagCode::M007 => "M007",
            DiagCode::M008 => "M008",
        }
    }

    /// Code for an effect missing from a function's declaration.
    pub fn missing_effect(effect: Effect) -> DiagCode {
        match effect {
            Effect::Io => DiagCode::EffMissingIo,
            Effect::Cpu => DiagCode::EffMissingCpu,
        }
    }

    /// Code for a declared effect the body never needs.
    pub fn superfluous_effect(effect: Effect) -> DiagCode {
        match effect {
            Effect::Io => DiagCode::EffSuperfluousIo,
            Effect::Cpu => DiagCode::EffSuperfluousCpu,
        }
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiagCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_code_mapping() {
        assert_eq!(DiagCode::missing_effect(Effect::Io), DiagCode::EffMissingIo);
        assert_eq!(DiagCode::superfluous_effect(Effect::Cpu), DiagCode::EffSuperfluousCpu);
    }

    #[test]
    fn display_spellings_are_stable() {
        assert_eq!(DiagCode::EffMissingIo.to_string(), "EFF_MISSING_IO");
        assert_eq!(DiagCode::CapabilityNotAllowed.to_string(), "CAPABILITY_NOT_ALLOWED");
        assert_eq!(DiagCode::M003.to_string(), "M003");
    }
}
