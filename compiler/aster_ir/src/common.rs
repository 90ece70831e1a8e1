//! Enums shared between the surface AST and the Core IR.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A declared side-effect class.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Io,
    Cpu,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::Io => "io",
            Effect::Cpu => "cpu",
        }
    }
}

impl FromStr for Effect {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "io" => Ok(Effect::Io),
            "cpu" => Ok(Effect::Cpu),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named permission attached to a function's effects.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    Http,
    Sql,
    Time,
    Files,
    Secrets,
    AiModel,
    Cpu,
}

impl Capability {
    /// The canonical ordering for `effectCaps` lists.
    pub const CANONICAL: [Capability; 7] = [
        Capability::Http,
        Capability::Sql,
        Capability::Time,
        Capability::Files,
        Capability::Secrets,
        Capability::AiModel,
        Capability::Cpu,
    ];

    /// Capabilities implied by a bare `io` effect (everything but CPU).
    pub const IO_IMPLICIT: [Capability; 6] = [
        Capability::Http,
        Capability::Sql,
        Capability::Time,
        Capability::Files,
        Capability::Secrets,
        Capability::AiModel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Http => "HTTP",
            Capability::Sql => "SQL",
            Capability::Time => "TIME",
            Capability::Files => "FILES",
            Capability::Secrets => "SECRETS",
            Capability::AiModel => "AI_MODEL",
            Capability::Cpu => "CPU",
        }
    }

    /// Case-insensitive lookup accepting `Http`, `HTTP`, `ai_model`,
    /// `AiModel` and the like.
    pub fn parse_name(name: &str) -> Option<Capability> {
        let folded: String = name
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "http" => Some(Capability::Http),
            "sql" => Some(Capability::Sql),
            "time" => Some(Capability::Time),
            "files" => Some(Capability::Files),
            "secrets" => Some(Capability::Secrets),
            "aimodel" => Some(Capability::AiModel),
            "cpu" => Some(Capability::Cpu),
            _ => None,
        }
    }

    /// Sort a capability set into the canonical order, dropping duplicates.
    pub fn canonical_order(caps: &[Capability]) -> Vec<Capability> {
        Capability::CANONICAL
            .iter()
            .copied()
            .filter(|c| caps.contains(c))
            .collect()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PII sensitivity tier; ordering is L1 < L2 < L3.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
)]
pub enum Sensitivity {
    L1,
    L2,
    L3,
}

impl Sensitivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Sensitivity::L1 => "L1",
            Sensitivity::L2 => "L2",
            Sensitivity::L3 => "L3",
        }
    }

    pub fn parse_name(name: &str) -> Option<Sensitivity> {
        match name {
            "L1" | "l1" => Some(Sensitivity::L1),
            "L2" | "l2" => Some(Sensitivity::L2),
            "L3" | "l3" => Some(Sensitivity::L3),
            _ => None,
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field or parameter constraint from the inline constraint DSL.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Constraint {
    Required,
    Range {
        #[serde(skip_serializing_if = "std::option::Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "std::option::Option::is_none")]
        max: Option<f64>,
    },
    Pattern {
        regexp: String,
    },
}

impl Constraint {
    /// True when every present range endpoint is a whole number.
    pub fn is_integral_range(&self) -> bool {
        match self {
            Constraint::Range { min, max } => {
                let whole = |v: &Option<f64>| v.map_or(true, |n| n.fract() == 0.0);
                whole(min) && whole(max)
            }
            _ => false,
        }
    }

    /// True when some range endpoint carries a fractional part.
    pub fn is_fractional_range(&self) -> bool {
        matches!(self, Constraint::Range { .. }) && !self.is_integral_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_canonical_order() {
        let caps = vec![Capability::Cpu, Capability::Http, Capability::Sql, Capability::Http];
        assert_eq!(
            Capability::canonical_order(&caps),
            vec![Capability::Http, Capability::Sql, Capability::Cpu]
        );
    }

    #[test]
    fn capability_parse_accepts_mixed_case() {
        assert_eq!(Capability::parse_name("Http"), Some(Capability::Http));
        assert_eq!(Capability::parse_name("AI_MODEL"), Some(Capability::AiModel));
        assert_eq!(Capability::parse_name("AiModel"), Some(Capability::AiModel));
        assert_eq!(Capability::parse_name("ftp"), None);
    }

    #[test]
    fn sensitivity_ordering() {
        assert!(Sensitivity::L1 < Sensitivity::L2);
        assert!(Sensitivity::L2 < Sensitivity::L3);
        assert_eq!(Sensitivity::L2.max(Sensitivity::L3), Sensitivity::L3);
    }

    #[test]
    fn effect_round_trip() {
        assert_eq!("io".parse::<Effect>(), Ok(Effect::Io));
        assert_eq!("cpu".parse::<Effect>(), Ok(Effect::Cpu));
        assert!("net".parse::<Effect>().is_err());
        assert_eq!(Effect::Io.to_string(), "io");
    }

    #[test]
    fn constraint_range_classification() {
        let int_range = Constraint::Range { min: Some(0.0), max: Some(150.0) };
        assert!(int_range.is_integral_range());
        let frac = Constraint::Range { min: Some(0.5), max: None };
        assert!(frac.is_fractional_range());
        assert!(!Constraint::Required.is_integral_range());
    }
}
