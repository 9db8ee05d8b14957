//! Operator Registry - the single declarative table mapping every
//! compare operator to its polarity and translation semantics.
//!
//! [`kind`] is that table: one `match`, covering the whole operator
//! enum, so adding an operator cannot update one backend's behavior and
//! forget the other. Handlers build backend-agnostic [`Predicate`]s;
//! they never know which emitter will render them.
//!
//! # Translation rules
//!
//! ```text
//! equality            scalar -> term, list -> terms
//! contains / prefix   scalar -> wildcard, list -> OR of wildcards (msm=1)
//! ordering            scalar only -> half-open range
//! before / after      scalar timestamp -> half-open range
//! betweenDates        exactly [start, end] -> inclusive range
//! exists              value ignored -> exists
//! rating              label -> interval from the catalog's ratingRanges
//! nested fields       wrapped in a nested scope on keys[0]
//! ```

use crate::catalog::CatalogField;
use crate::error::CompileError;
use crate::filter::{CompareOperator, FieldValue, ScalarValue};
use crate::predicate::{Predicate, RangeBound, WildcardKind};

/// Which clause list a compiled predicate contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Must,
    MustNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCmp {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingCmp {
    Equal,
    Less,
    Greater,
}

/// Semantic family of a compare operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Equality { case_insensitive: bool },
    Substring,
    FreeText,
    Prefix,
    Ordering(Comparison),
    DateOrdering(DateCmp),
    DateWindow,
    Existence,
    Rating(RatingCmp),
}

/// The registry table. Negated operators reuse their positive family and
/// differ only in polarity (`isNotEqualToRating` is the must-not of the
/// equal-to interval, `notBeginsWith` the must-not of the prefix set).
pub fn kind(operator: CompareOperator) -> (Polarity, OperatorKind) {
    use CompareOperator as Op;
    use OperatorKind as Kind;
    use Polarity::{Must, MustNot};
    match operator {
        Op::IsEqualTo | Op::IsEqualToNumber | Op::IsEqualToIp | Op::IsEqualToString => (
            Must,
            Kind::Equality {
                case_insensitive: false,
            },
        ),
        Op::IsNotEqualTo | Op::IsNotEqualToNumber | Op::IsNotEqualToIp | Op::IsNotEqualToString => {
            (
                MustNot,
                Kind::Equality {
                    case_insensitive: false,
                },
            )
        }
        Op::IsEqualToCaseInsensitive => (
            Must,
            Kind::Equality {
                case_insensitive: true,
            },
        ),
        Op::IsNotEqualToCaseInsensitive => (
            MustNot,
            Kind::Equality {
                case_insensitive: true,
            },
        ),
        Op::Contains => (Must, Kind::Substring),
        Op::NotContains => (MustNot, Kind::Substring),
        Op::ContainsText => (Must, Kind::FreeText),
        Op::BeginsWith => (Must, Kind::Prefix),
        Op::NotBeginsWith => (MustNot, Kind::Prefix),
        Op::IsLessThan => (Must, Kind::Ordering(Comparison::Lt)),
        Op::IsLessThanOrEqualTo => (Must, Kind::Ordering(Comparison::Le)),
        Op::IsGreaterThan => (Must, Kind::Ordering(Comparison::Gt)),
        Op::IsGreaterThanOrEqualTo => (Must, Kind::Ordering(Comparison::Ge)),
        Op::Before => (Must, Kind::DateOrdering(DateCmp::Before)),
        Op::After => (Must, Kind::DateOrdering(DateCmp::After)),
        Op::BetweenDates => (Must, Kind::DateWindow),
        Op::Exists => (Must, Kind::Existence),
        Op::NotExists => (MustNot, Kind::Existence),
        Op::IsEqualToRating => (Must, Kind::Rating(RatingCmp::Equal)),
        Op::IsNotEqualToRating => (MustNot, Kind::Rating(RatingCmp::Equal)),
        Op::IsLessThanRating => (Must, Kind::Rating(RatingCmp::Less)),
        Op::IsGreaterThanRating => (Must, Kind::Rating(RatingCmp::Greater)),
    }
}

/// Compile one validated field into its polarity and predicate.
///
/// `value` must already be canonicalized and validated against the
/// catalog entry; this function only applies the translation rules.
pub fn compile_field(
    name: &str,
    keys: &[String],
    operator: CompareOperator,
    entry: &CatalogField,
    value: &FieldValue,
) -> Result<(Polarity, Predicate), CompileError> {
    let (polarity, kind) = kind(operator);

    // Nested fields match against the entry's value field, scoped below.
    let target = match &entry.nested {
        Some(nested) => nested.value_field.as_str(),
        None => entry.backend_name.as_str(),
    };

    let leaf = build_leaf(name, target, kind, entry, value)?;

    let predicate = match &entry.nested {
        Some(nested) => {
            if keys.len() != 1 {
                return Err(CompileError::NestedKeyCount {
                    field: name.to_string(),
                    got: keys.len(),
                });
            }
            Predicate::Nested {
                path: nested.path.clone(),
                key_field: nested.key_field.clone(),
                key: keys[0].clone(),
                inner: Box::new(leaf),
            }
        }
        None => leaf,
    };

    Ok((polarity, predicate))
}

fn build_leaf(
    name: &str,
    target: &str,
    kind: OperatorKind,
    entry: &CatalogField,
    value: &FieldValue,
) -> Result<Predicate, CompileError> {
    match kind {
        OperatorKind::Equality { case_insensitive } => {
            Ok(equality(target, case_insensitive, value))
        }
        OperatorKind::Substring | OperatorKind::FreeText => {
            Ok(wildcards(target, WildcardKind::Contains, value))
        }
        OperatorKind::Prefix => Ok(wildcards(target, WildcardKind::Prefix, value)),
        OperatorKind::Ordering(cmp) => {
            let scalar = scalar_only(name, value)?;
            let bound = RangeBound {
                value: scalar.clone(),
                inclusive: matches!(cmp, Comparison::Le | Comparison::Ge),
            };
            let (lower, upper) = match cmp {
                Comparison::Lt | Comparison::Le => (None, Some(bound)),
                Comparison::Gt | Comparison::Ge => (Some(bound), None),
            };
            Ok(Predicate::Range {
                field: target.to_string(),
                lower,
                upper,
            })
        }
        OperatorKind::DateOrdering(cmp) => {
            let scalar = scalar_only(name, value)?;
            let bound = RangeBound::exclusive(scalar.clone());
            let (lower, upper) = match cmp {
                DateCmp::Before => (None, Some(bound)),
                DateCmp::After => (Some(bound), None),
            };
            Ok(Predicate::Range {
                field: target.to_string(),
                lower,
                upper,
            })
        }
        OperatorKind::DateWindow => {
            let scalars = value.scalars();
            if !value.is_list() || scalars.len() != 2 {
                return Err(CompileError::BetweenDatesLength {
                    field: name.to_string(),
                    got: scalars.len(),
                });
            }
            Ok(Predicate::Range {
                field: target.to_string(),
                lower: Some(RangeBound::inclusive(scalars[0].clone())),
                upper: Some(RangeBound::inclusive(scalars[1].clone())),
            })
        }
        OperatorKind::Existence => Ok(Predicate::Exists {
            field: target.to_string(),
        }),
        OperatorKind::Rating(cmp) => {
            let scalar = scalar_only(name, value)?;
            let label = scalar
                .as_text()
                .ok_or_else(|| CompileError::WrongValueType {
                    field: name.to_string(),
                    expected: "rating label",
                    got: scalar.render_text(),
                })?;
            let range = entry.rating_range(label);
            let (lower, upper) = match cmp {
                RatingCmp::Equal => (
                    Some(RangeBound::inclusive(ScalarValue::Number(range.min))),
                    Some(RangeBound::inclusive(ScalarValue::Number(range.max))),
                ),
                RatingCmp::Less => (
                    None,
                    Some(RangeBound::exclusive(ScalarValue::Number(range.min))),
                ),
                RatingCmp::Greater => (
                    Some(RangeBound::exclusive(ScalarValue::Number(range.max))),
                    None,
                ),
            };
            Ok(Predicate::Range {
                field: target.to_string(),
                lower,
                upper,
            })
        }
    }
}

fn equality(target: &str, case_insensitive: bool, value: &FieldValue) -> Predicate {
    match value {
        FieldValue::Scalar(scalar) => Predicate::Term {
            field: target.to_string(),
            value: scalar.clone(),
            case_insensitive,
        },
        FieldValue::List(list) if case_insensitive => Predicate::AnyOf(
            list.iter()
                .map(|scalar| Predicate::Term {
                    field: target.to_string(),
                    value: scalar.clone(),
                    case_insensitive: true,
                })
                .collect(),
        ),
        FieldValue::List(list) => Predicate::Terms {
            field: target.to_string(),
            values: list.clone(),
        },
    }
}

fn wildcards(target: &str, pattern: WildcardKind, value: &FieldValue) -> Predicate {
    let one = |scalar: &ScalarValue| Predicate::Wildcard {
        field: target.to_string(),
        value: scalar.render_text(),
        kind: pattern,
    };
    match value {
        FieldValue::Scalar(scalar) => one(scalar),
        FieldValue::List(list) => Predicate::AnyOf(list.iter().map(one).collect()),
    }
}

fn scalar_only<'a>(name: &str, value: &'a FieldValue) -> Result<&'a ScalarValue, CompileError> {
    value
        .as_scalar()
        .ok_or_else(|| CompileError::MultiSelectNotAllowed {
            field: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ControlType;
    use serde_json::json;

    fn entry(backend: &str, control: ControlType) -> CatalogField {
        CatalogField::new(backend, control)
    }

    fn value(raw: serde_json::Value) -> FieldValue {
        FieldValue::canonicalize("test", &raw).unwrap()
    }

    #[test]
    fn test_equality_scalar_is_term() {
        let (polarity, predicate) = compile_field(
            "status",
            &[],
            CompareOperator::IsEqualTo,
            &entry("status", ControlType::Keyword),
            &value(json!("open")),
        )
        .unwrap();
        assert_eq!(polarity, Polarity::Must);
        assert_eq!(
            predicate,
            Predicate::Term {
                field: "status".into(),
                value: ScalarValue::Text("open".into()),
                case_insensitive: false,
            }
        );
    }

    #[test]
    fn test_equality_list_is_terms() {
        let (_, predicate) = compile_field(
            "status",
            &[],
            CompareOperator::IsEqualTo,
            &entry("status", ControlType::Keyword),
            &value(json!(["open", "new"])),
        )
        .unwrap();
        assert_eq!(
            predicate,
            Predicate::Terms {
                field: "status".into(),
                values: vec![
                    ScalarValue::Text("open".into()),
                    ScalarValue::Text("new".into())
                ],
            }
        );
    }

    #[test]
    fn test_negated_equality_is_must_not() {
        let (polarity, _) = compile_field(
            "status",
            &[],
            CompareOperator::IsNotEqualTo,
            &entry("status", ControlType::Keyword),
            &value(json!("closed")),
        )
        .unwrap();
        assert_eq!(polarity, Polarity::MustNot);
    }

    #[test]
    fn test_contains_list_is_any_of_wildcards() {
        let (_, predicate) = compile_field(
            "host",
            &[],
            CompareOperator::Contains,
            &entry("hostname", ControlType::Text),
            &value(json!(["web", "db"])),
        )
        .unwrap();
        match predicate {
            Predicate::AnyOf(inner) => {
                assert_eq!(inner.len(), 2);
                assert_eq!(
                    inner[0],
                    Predicate::Wildcard {
                        field: "hostname".into(),
                        value: "web".into(),
                        kind: WildcardKind::Contains,
                    }
                );
            }
            other => panic!("expected AnyOf, got {other:?}"),
        }
    }

    #[test]
    fn test_substring_formats_numbers_deterministically() {
        let (_, predicate) = compile_field(
            "port",
            &[],
            CompareOperator::BeginsWith,
            &entry("port", ControlType::Number),
            &value(json!(8080.0)),
        )
        .unwrap();
        assert_eq!(
            predicate,
            Predicate::Wildcard {
                field: "port".into(),
                value: "8080".into(),
                kind: WildcardKind::Prefix,
            }
        );
    }

    #[test]
    fn test_ordering_rejects_list() {
        let err = compile_field(
            "score",
            &[],
            CompareOperator::IsGreaterThan,
            &entry("score", ControlType::Number),
            &value(json!([1, 2])),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::MultiSelectNotAllowed {
                field: "score".into()
            }
        );
    }

    #[test]
    fn test_ordering_bounds() {
        let cases = [
            (CompareOperator::IsLessThan, false, false),
            (CompareOperator::IsLessThanOrEqualTo, false, true),
            (CompareOperator::IsGreaterThan, true, false),
            (CompareOperator::IsGreaterThanOrEqualTo, true, true),
        ];
        for (operator, is_lower, inclusive) in cases {
            let (_, predicate) = compile_field(
                "score",
                &[],
                operator,
                &entry("score", ControlType::Number),
                &value(json!(5)),
            )
            .unwrap();
            let Predicate::Range { lower, upper, .. } = predicate else {
                panic!("expected Range for {operator}");
            };
            let bound = if is_lower { lower.unwrap() } else { upper.unwrap() };
            assert_eq!(bound.inclusive, inclusive, "{operator}");
            assert_eq!(bound.value, ScalarValue::Number(5.0));
        }
    }

    #[test]
    fn test_before_is_exclusive_upper_bound() {
        let (polarity, predicate) = compile_field(
            "seen",
            &[],
            CompareOperator::Before,
            &entry("seen_at", ControlType::DateTime),
            &value(json!("2024-06-01T00:00:00Z")),
        )
        .unwrap();
        assert_eq!(polarity, Polarity::Must);
        assert_eq!(
            predicate,
            Predicate::Range {
                field: "seen_at".into(),
                lower: None,
                upper: Some(RangeBound::exclusive(ScalarValue::Text(
                    "2024-06-01T00:00:00Z".into()
                ))),
            }
        );
    }

    #[test]
    fn test_after_is_exclusive_lower_bound() {
        let (_, predicate) = compile_field(
            "seen",
            &[],
            CompareOperator::After,
            &entry("seen_at", ControlType::DateTime),
            &value(json!("2024-06-01T00:00:00Z")),
        )
        .unwrap();
        assert_eq!(
            predicate,
            Predicate::Range {
                field: "seen_at".into(),
                lower: Some(RangeBound::exclusive(ScalarValue::Text(
                    "2024-06-01T00:00:00Z".into()
                ))),
                upper: None,
            }
        );
    }

    #[test]
    fn test_contains_text_is_wildcard_containment() {
        let entry = entry("hostname", ControlType::Text);
        let (_, free_text) = compile_field(
            "host",
            &[],
            CompareOperator::ContainsText,
            &entry,
            &value(json!("web")),
        )
        .unwrap();
        let (_, contains) = compile_field(
            "host",
            &[],
            CompareOperator::Contains,
            &entry,
            &value(json!("web")),
        )
        .unwrap();
        assert_eq!(
            free_text,
            Predicate::Wildcard {
                field: "hostname".into(),
                value: "web".into(),
                kind: WildcardKind::Contains,
            }
        );
        assert_eq!(free_text, contains);
    }

    #[test]
    fn test_between_dates_inclusive_both_ends() {
        let (_, predicate) = compile_field(
            "seen",
            &[],
            CompareOperator::BetweenDates,
            &entry("seen_at", ControlType::DateTime),
            &value(json!(["2024-01-01T00:00:00Z", "2024-01-31T23:59:59Z"])),
        )
        .unwrap();
        let Predicate::Range { lower, upper, .. } = predicate else {
            panic!("expected Range");
        };
        assert!(lower.unwrap().inclusive);
        assert!(upper.unwrap().inclusive);
    }

    #[test]
    fn test_between_dates_wrong_length() {
        let err = compile_field(
            "seen",
            &[],
            CompareOperator::BetweenDates,
            &entry("seen_at", ControlType::DateTime),
            &value(json!(["a", "b", "c"])),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::BetweenDatesLength {
                field: "seen".into(),
                got: 3
            }
        );
    }

    #[test]
    fn test_exists_ignores_value() {
        for raw in [json!(true), json!("yes"), json!(0)] {
            let (polarity, predicate) = compile_field(
                "owner",
                &[],
                CompareOperator::Exists,
                &entry("owner", ControlType::Keyword),
                &value(raw),
            )
            .unwrap();
            assert_eq!(polarity, Polarity::Must);
            assert_eq!(
                predicate,
                Predicate::Exists {
                    field: "owner".into()
                }
            );
        }
    }

    #[test]
    fn test_rating_greater_than_is_exclusive_above_max() {
        // ratingRanges["severity"]["Medium"] = [4, 6.9]: greater-than
        // must select 7 but not 6.9.
        let entry = entry("severity", ControlType::Number).rating("Medium", 4.0, 6.9);
        let (_, predicate) = compile_field(
            "severity",
            &[],
            CompareOperator::IsGreaterThanRating,
            &entry,
            &value(json!("Medium")),
        )
        .unwrap();
        assert_eq!(
            predicate,
            Predicate::Range {
                field: "severity".into(),
                lower: Some(RangeBound::exclusive(ScalarValue::Number(6.9))),
                upper: None,
            }
        );
    }

    #[test]
    fn test_rating_equal_is_inclusive_interval() {
        let entry = entry("severity", ControlType::Number).rating("Medium", 4.0, 6.9);
        let (_, predicate) = compile_field(
            "severity",
            &[],
            CompareOperator::IsEqualToRating,
            &entry,
            &value(json!("Medium")),
        )
        .unwrap();
        assert_eq!(
            predicate,
            Predicate::Range {
                field: "severity".into(),
                lower: Some(RangeBound::inclusive(ScalarValue::Number(4.0))),
                upper: Some(RangeBound::inclusive(ScalarValue::Number(6.9))),
            }
        );
    }

    #[test]
    fn test_not_equal_rating_is_must_not_of_interval() {
        let entry = entry("severity", ControlType::Number).rating("Low", 0.0, 3.9);
        let (polarity, predicate) = compile_field(
            "severity",
            &[],
            CompareOperator::IsNotEqualToRating,
            &entry,
            &value(json!("Low")),
        )
        .unwrap();
        assert_eq!(polarity, Polarity::MustNot);
        assert!(matches!(predicate, Predicate::Range { .. }));
    }

    #[test]
    fn test_nested_field_scopes_key_and_value() {
        let entry = CatalogField::new("tag", ControlType::Keyword).nested(
            "tags",
            "tags.name",
            "tags.value",
        );
        let (_, predicate) = compile_field(
            "tag",
            &["env".to_string()],
            CompareOperator::Contains,
            &entry,
            &value(json!("prod")),
        )
        .unwrap();
        assert_eq!(
            predicate,
            Predicate::Nested {
                path: "tags".into(),
                key_field: "tags.name".into(),
                key: "env".into(),
                inner: Box::new(Predicate::Wildcard {
                    field: "tags.value".into(),
                    value: "prod".into(),
                    kind: WildcardKind::Contains,
                }),
            }
        );
    }

    #[test]
    fn test_nested_field_requires_exactly_one_key() {
        let entry = CatalogField::new("tag", ControlType::Keyword).nested(
            "tags",
            "tags.name",
            "tags.value",
        );
        for keys in [vec![], vec!["a".to_string(), "b".to_string()]] {
            let err = compile_field(
                "tag",
                &keys,
                CompareOperator::IsEqualTo,
                &entry,
                &value(json!("x")),
            )
            .unwrap_err();
            assert_eq!(
                err,
                CompileError::NestedKeyCount {
                    field: "tag".into(),
                    got: keys.len()
                }
            );
        }
    }
}
