//! Name- and constraint-based type inference for untyped fields.
//!
//! Used by the parser when a field or parameter carries no explicit type.
//! Explicit constraints override naming; naming applies otherwise; a
//! fractional range promotes an integral inference to `Float`. The fallback
//! is always `Text`.

use aster_ir::Constraint;
use aster_lexicon::{InferredType, Lexicon};
use once_cell::sync::Lazy;
use regex::Regex;

struct BaseRule {
    regex: Lazy<Regex>,
    ty: InferredType,
    priority: i32,
}

macro_rules! base_rule {
    ($pattern:expr, $ty:expr, $priority:expr) => {
        BaseRule {
            regex: Lazy::new(|| Regex::new($pattern).unwrap_or_else(|_| unreachable!())),
            ty: $ty,
            priority: $priority,
        }
    };
}

/// Locale-independent naming rules.
static BASE_RULES: [BaseRule; 3] = [
    base_rule!(
        r".*(Id|ID|Identifier|Code|Key|Token)$",
        InferredType::Text,
        10
    ),
    base_rule!(
        r".*(Amount|Price|Cost|Fee|Balance|Salary|Income|Rate|Percentage)$",
        InferredType::Float,
        10
    ),
    base_rule!(
        r".*(Count|Number|Qty|Age|Score|Level|Months|Days|Years|Minutes|Size|Length|Index)$",
        InferredType::Int,
        10
    ),
];

/// Infer a field's type from its name and constraints.
pub fn infer_type(name: &str, constraints: &[Constraint], lexicon: &Lexicon) -> InferredType {
    if let Some(ty) = from_constraints(constraints) {
        return ty;
    }
    from_name(name, lexicon).unwrap_or(InferredType::Text)
}

/// Constraint-based refinement: ranges give numerics, patterns give text.
fn from_constraints(constraints: &[Constraint]) -> Option<InferredType> {
    let mut result: Option<InferredType> = None;
    for constraint in constraints {
        let ty = match constraint {
            Constraint::Range { .. } if constraint.is_fractional_range() => InferredType::Float,
            Constraint::Range { .. } => InferredType::Int,
            Constraint::Pattern { .. } => InferredType::Text,
            Constraint::Required => continue,
        };
        result = Some(match (result, ty) {
            // Numeric promotion: Int + Float unifies to Float.
            (Some(InferredType::Int), InferredType::Float)
            | (Some(InferredType::Float), InferredType::Int) => InferredType::Float,
            (Some(prev), _) => prev,
            (None, ty) => ty,
        });
    }
    result
}

/// Highest-priority matching rule: lexicon overlays first, base rules after.
fn from_name(name: &str, lexicon: &Lexicon) -> Option<InferredType> {
    let mut best: Option<(i32, InferredType)> = None;
    for rule in &lexicon.inference_rules {
        if let Ok(re) = Regex::new(&rule.pattern) {
            if re.is_match(name) && best.map_or(true, |(p, _)| rule.priority > p) {
                best = Some((rule.priority, rule.ty));
            }
        }
    }
    for rule in &BASE_RULES {
        if rule.regex.is_match(name) && best.map_or(true, |(p, _)| rule.priority > p) {
            best = Some((rule.priority, rule.ty));
        }
    }
    best.map(|(_, ty)| ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_lexicon::english;

    fn infer(name: &str, constraints: &[Constraint]) -> InferredType {
        infer_type(name, constraints, &english())
    }

    #[test]
    fn id_like_names_are_text() {
        assert_eq!(infer("userId", &[]), InferredType::Text);
        assert_eq!(infer("apiKey", &[]), InferredType::Text);
        assert_eq!(infer("sessionToken", &[]), InferredType::Text);
    }

    #[test]
    fn money_like_names_are_float() {
        assert_eq!(infer("totalAmount", &[]), InferredType::Float);
        assert_eq!(infer("taxRate", &[]), InferredType::Float);
    }

    #[test]
    fn count_like_names_are_int() {
        assert_eq!(infer("retryCount", &[]), InferredType::Int);
        assert_eq!(infer("userAge", &[]), InferredType::Int);
        assert_eq!(infer("waitMinutes", &[]), InferredType::Int);
    }

    #[test]
    fn bool_overlay_beats_base() {
        assert_eq!(infer("isActive", &[]), InferredType::Bool);
        assert_eq!(infer("hasChildren", &[]), InferredType::Bool);
        assert_eq!(infer("featureFlag", &[]), InferredType::Bool);
    }

    #[test]
    fn datetime_overlay() {
        assert_eq!(infer("createdAt", &[]), InferredType::DateTime);
        assert_eq!(infer("birthDate", &[]), InferredType::DateTime);
    }

    #[test]
    fn unknown_names_default_to_text() {
        assert_eq!(infer("thing", &[]), InferredType::Text);
    }

    #[test]
    fn integral_range_overrides_text_name() {
        let range = Constraint::Range { min: Some(0.0), max: Some(150.0) };
        assert_eq!(infer("userId", &[range]), InferredType::Int);
    }

    #[test]
    fn fractional_range_gives_float() {
        let range = Constraint::Range { min: Some(0.5), max: Some(2.0) };
        assert_eq!(infer("userId", &[range]), InferredType::Float);
    }

    #[test]
    fn pattern_constraint_gives_text() {
        let pattern = Constraint::Pattern { regexp: "^[a-z]+$".into() };
        assert_eq!(infer("count", &[pattern]), InferredType::Text);
    }

    #[test]
    fn int_and_float_ranges_promote() {
        let a = Constraint::Range { min: Some(0.0), max: Some(10.0) };
        let b = Constraint::Range { min: Some(0.5), max: None };
        assert_eq!(infer("x", &[a, b]), InferredType::Float);
    }

    #[test]
    fn required_alone_does_not_refine() {
        assert_eq!(infer("score", &[Constraint::Required]), InferredType::Int);
    }
}
