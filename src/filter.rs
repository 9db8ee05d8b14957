// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Filter Model - wire-facing filter request types.
//!
//! A request arrives as JSON and deserializes field-for-field:
//!
//! ```json
//! {
//!   "operator": "and",
//!   "fields": [
//!     {"name": "status", "operator": "isEqualTo", "value": ["open", "new"]},
//!     {"name": "tag", "keys": ["env"], "operator": "contains", "value": "prod"}
//!   ]
//! }
//! ```
//!
//! Raw values come in as [`serde_json::Value`] and are canonicalized exactly
//! once, at the validation boundary, into a [`FieldValue`] tagged as scalar
//! or list. Handlers downstream never re-discover cardinality.

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// How the fields of one request combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOperator {
    And,
    Or,
}

/// Comparison discriminant of the filter algebra.
///
/// Wire names are the camelCase serde renames. The set is closed: an
/// unknown operator string fails at deserialization, before compilation
/// starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOperator {
    #[serde(rename = "isEqualTo")]
    IsEqualTo,
    #[serde(rename = "isNotEqualTo")]
    IsNotEqualTo,
    #[serde(rename = "isEqualToNumber")]
    IsEqualToNumber,
    #[serde(rename = "isNotEqualToNumber")]
    IsNotEqualToNumber,
    #[serde(rename = "isEqualToIp")]
    IsEqualToIp,
    #[serde(rename = "isNotEqualToIp")]
    IsNotEqualToIp,
    #[serde(rename = "isEqualToString")]
    IsEqualToString,
    #[serde(rename = "isNotEqualToString")]
    IsNotEqualToString,
    #[serde(rename = "isEqualToCaseInsensitive")]
    IsEqualToCaseInsensitive,
    #[serde(rename = "isNotEqualToCaseInsensitive")]
    IsNotEqualToCaseInsensitive,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "notContains")]
    NotContains,
    #[serde(rename = "containsText")]
    ContainsText,
    #[serde(rename = "beginsWith")]
    BeginsWith,
    #[serde(rename = "notBeginsWith")]
    NotBeginsWith,
    #[serde(rename = "isLessThan")]
    IsLessThan,
    #[serde(rename = "isLessThanOrEqualTo")]
    IsLessThanOrEqualTo,
    #[serde(rename = "isGreaterThan")]
    IsGreaterThan,
    #[serde(rename = "isGreaterThanOrEqualTo")]
    IsGreaterThanOrEqualTo,
    #[serde(rename = "before")]
    Before,
    #[serde(rename = "after")]
    After,
    #[serde(rename = "betweenDates")]
    BetweenDates,
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "notExists")]
    NotExists,
    #[serde(rename = "isEqualToRating")]
    IsEqualToRating,
    #[serde(rename = "isNotEqualToRating")]
    IsNotEqualToRating,
    #[serde(rename = "isLessThanRating")]
    IsLessThanRating,
    #[serde(rename = "isGreaterThanRating")]
    IsGreaterThanRating,
}

impl CompareOperator {
    /// The wire name, used in error messages.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::IsEqualTo => "isEqualTo",
            Self::IsNotEqualTo => "isNotEqualTo",
            Self::IsEqualToNumber => "isEqualToNumber",
            Self::IsNotEqualToNumber => "isNotEqualToNumber",
            Self::IsEqualToIp => "isEqualToIp",
            Self::IsNotEqualToIp => "isNotEqualToIp",
            Self::IsEqualToString => "isEqualToString",
            Self::IsNotEqualToString => "isNotEqualToString",
            Self::IsEqualToCaseInsensitive => "isEqualToCaseInsensitive",
            Self::IsNotEqualToCaseInsensitive => "isNotEqualToCaseInsensitive",
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::ContainsText => "containsText",
            Self::BeginsWith => "beginsWith",
            Self::NotBeginsWith => "notBeginsWith",
            Self::IsLessThan => "isLessThan",
            Self::IsLessThanOrEqualTo => "isLessThanOrEqualTo",
            Self::IsGreaterThan => "isGreaterThan",
            Self::IsGreaterThanOrEqualTo => "isGreaterThanOrEqualTo",
            Self::Before => "before",
            Self::After => "after",
            Self::BetweenDates => "betweenDates",
            Self::Exists => "exists",
            Self::NotExists => "notExists",
            Self::IsEqualToRating => "isEqualToRating",
            Self::IsNotEqualToRating => "isNotEqualToRating",
            Self::IsLessThanRating => "isLessThanRating",
            Self::IsGreaterThanRating => "isGreaterThanRating",
        }
    }
}

impl std::fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// One filter constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestField {
    /// Public field name, resolved through the catalog.
    pub name: String,
    /// Key path for nested key/value fields (typically length 1),
    /// e.g. the tag name when filtering on a tag's value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    pub operator: CompareOperator,
    /// Raw wire value: scalar or array. Canonicalized by the compiler.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// A complete filter request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    /// Required when more than one field is present. A single-field
    /// request defaults to AND.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<LogicOperator>,
    #[serde(default)]
    pub fields: Vec<RequestField>,
}

/// A single comparison value after canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl ScalarValue {
    /// Deterministic text rendering for substring/prefix patterns.
    ///
    /// Numbers use `f64` Display, which never produces scientific
    /// notation and drops a trailing `.0`.
    pub fn render_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => serde_json::json!(n),
            Self::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

/// Canonical scalar-or-list value, resolved once per field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(ScalarValue),
    List(Vec<ScalarValue>),
}

impl FieldValue {
    /// Canonicalize a raw wire value.
    ///
    /// Errors: null or missing value, empty list, nested arrays/objects.
    pub fn canonicalize(field: &str, raw: &serde_json::Value) -> Result<Self, CompileError> {
        match raw {
            serde_json::Value::Null => Err(CompileError::NoValue {
                field: field.to_string(),
            }),
            serde_json::Value::Array(items) => {
                if items.is_empty() {
                    return Err(CompileError::EmptyValueList {
                        field: field.to_string(),
                    });
                }
                let scalars = items
                    .iter()
                    .map(|item| Self::scalar(field, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::List(scalars))
            }
            other => Ok(Self::Scalar(Self::scalar(field, other)?)),
        }
    }

    fn scalar(field: &str, raw: &serde_json::Value) -> Result<ScalarValue, CompileError> {
        match raw {
            serde_json::Value::String(s) => Ok(ScalarValue::Text(s.clone())),
            serde_json::Value::Number(n) => {
                n.as_f64().map(ScalarValue::Number).ok_or_else(|| {
                    CompileError::WrongValueType {
                        field: field.to_string(),
                        expected: "number",
                        got: n.to_string(),
                    }
                })
            }
            serde_json::Value::Bool(b) => Ok(ScalarValue::Bool(*b)),
            other => Err(CompileError::WrongValueType {
                field: field.to_string(),
                expected: "scalar",
                got: other.to_string(),
            }),
        }
    }

    /// All scalars regardless of cardinality.
    pub fn scalars(&self) -> &[ScalarValue] {
        match self {
            Self::Scalar(s) => std::slice::from_ref(s),
            Self::List(list) => list,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let raw = json!({
            "operator": "and",
            "fields": [
                {"name": "status", "operator": "isEqualTo", "value": ["open", "new"]},
                {"name": "tag", "keys": ["env"], "operator": "contains", "value": "prod"}
            ]
        });
        let request: FilterRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.operator, Some(LogicOperator::And));
        assert_eq!(request.fields.len(), 2);
        assert_eq!(request.fields[0].operator, CompareOperator::IsEqualTo);
        assert_eq!(request.fields[1].keys, vec!["env".to_string()]);
    }

    #[test]
    fn test_operator_optional_for_single_field() {
        let raw = json!({
            "fields": [{"name": "status", "operator": "exists", "value": true}]
        });
        let request: FilterRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.operator, None);
    }

    #[test]
    fn test_unknown_operator_rejected_at_parse() {
        let raw = json!({
            "fields": [{"name": "status", "operator": "isRoughlyEqualTo", "value": 1}]
        });
        assert!(serde_json::from_value::<FilterRequest>(raw).is_err());
    }

    #[test]
    fn test_canonicalize_scalar() {
        let value = FieldValue::canonicalize("f", &json!("open")).unwrap();
        assert_eq!(value, FieldValue::Scalar(ScalarValue::Text("open".into())));
        assert!(!value.is_list());
    }

    #[test]
    fn test_canonicalize_list() {
        let value = FieldValue::canonicalize("f", &json!([1, 2])).unwrap();
        assert_eq!(
            value,
            FieldValue::List(vec![ScalarValue::Number(1.0), ScalarValue::Number(2.0)])
        );
    }

    #[test]
    fn test_canonicalize_null_fails() {
        let err = FieldValue::canonicalize("f", &serde_json::Value::Null).unwrap_err();
        assert_eq!(err, CompileError::NoValue { field: "f".into() });
    }

    #[test]
    fn test_canonicalize_empty_list_fails() {
        let err = FieldValue::canonicalize("f", &json!([])).unwrap_err();
        assert_eq!(err, CompileError::EmptyValueList { field: "f".into() });
    }

    #[test]
    fn test_canonicalize_nested_array_fails() {
        assert!(FieldValue::canonicalize("f", &json!([[1]])).is_err());
        assert!(FieldValue::canonicalize("f", &json!({"a": 1})).is_err());
    }

    #[test]
    fn test_render_text_never_scientific() {
        assert_eq!(ScalarValue::Number(5.0).render_text(), "5");
        assert_eq!(ScalarValue::Number(6.9).render_text(), "6.9");
        assert_eq!(
            ScalarValue::Number(1e20).render_text(),
            "100000000000000000000"
        );
    }
}
