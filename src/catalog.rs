// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field Catalog - maps public field names to backend identifiers and
//! enforces per-field operator/value policy.
//!
//! A catalog is built once at startup, either programmatically with the
//! builder methods or from configuration via serde, and is read-only for
//! the rest of the process lifetime. It may be shared across concurrent
//! compilations without locking.
//!
//! ```
//! use filterql::catalog::{CatalogField, ControlType, FieldCatalog};
//! use filterql::filter::CompareOperator;
//!
//! let catalog = FieldCatalog::new()
//!     .field(
//!         "status",
//!         CatalogField::new("status", ControlType::Keyword)
//!             .multi_select()
//!             .operators([CompareOperator::IsEqualTo, CompareOperator::IsNotEqualTo]),
//!     )
//!     .field(
//!         "severity",
//!         CatalogField::new("severity", ControlType::Number)
//!             .operators([CompareOperator::IsGreaterThanRating])
//!             .rating("Medium", 4.0, 6.9),
//!     );
//! assert!(catalog.resolve("status").is_ok());
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::filter::{CompareOperator, FieldValue, ScalarValue};
use crate::registry::{self, OperatorKind};

/// Declared value type of a catalog field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlType {
    /// Analyzed free text.
    Text,
    /// Exact-match string.
    Keyword,
    Number,
    Boolean,
    /// String restricted to the catalog's allowed values.
    Enum,
    Uuid,
    DateTime,
    Ip,
}

impl ControlType {
    fn expected(&self) -> &'static str {
        match self {
            Self::Text | Self::Keyword | Self::Enum => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Uuid => "UUID",
            Self::DateTime => "timestamp",
            Self::Ip => "IP address",
        }
    }
}

/// Inclusive numeric interval backing a rating label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: f64,
    pub max: f64,
}

/// Backend location of a nested key/value field (e.g. tags).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedSpec {
    /// Nested document path (search) / side table (relational).
    pub path: String,
    /// Field holding the entry key, e.g. "tags.name".
    pub key_field: String,
    /// Field holding the entry value, e.g. "tags.value".
    pub value_field: String,
}

/// Catalog entry for one public field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogField {
    /// Backend field/column identifier. Pre-validated configuration, so
    /// emitters may identifier-quote it rather than bind it.
    pub backend_name: String,
    pub control_type: ControlType,
    /// Operators legal on this field.
    pub operators: Vec<CompareOperator>,
    /// Allowed values for the `enum` control type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    /// Whether list values are accepted.
    #[serde(default)]
    pub multi_select: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<NestedSpec>,
    /// Label -> inclusive interval, for the rating operators.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rating_ranges: BTreeMap<String, RatingRange>,
}

impl CatalogField {
    pub fn new(backend_name: impl Into<String>, control_type: ControlType) -> Self {
        Self {
            backend_name: backend_name.into(),
            control_type,
            operators: Vec::new(),
            allowed_values: Vec::new(),
            multi_select: false,
            nested: None,
            rating_ranges: BTreeMap::new(),
        }
    }

    /// Set the legal operators.
    pub fn operators(mut self, operators: impl IntoIterator<Item = CompareOperator>) -> Self {
        self.operators = operators.into_iter().collect();
        self
    }

    /// Allow list values.
    pub fn multi_select(mut self) -> Self {
        self.multi_select = true;
        self
    }

    /// Restrict values (enum control type).
    pub fn allowed_values(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Mark as a nested key/value field.
    pub fn nested(
        mut self,
        path: impl Into<String>,
        key_field: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        self.nested = Some(NestedSpec {
            path: path.into(),
            key_field: key_field.into(),
            value_field: value_field.into(),
        });
        self
    }

    /// Add a rating label with its inclusive interval.
    pub fn rating(mut self, label: impl Into<String>, min: f64, max: f64) -> Self {
        self.rating_ranges
            .insert(label.into(), RatingRange { min, max });
        self
    }

    /// Resolve a rating label to its interval.
    ///
    /// An unknown label resolves to the empty interval `[0, -1]`:
    /// equal-to matches nothing, not-equal-to matches everything,
    /// less-than means `x < 0` and greater-than means `x > -1`.
    /// Deterministic rather than an error, so a stale label degrades to
    /// a well-defined empty match instead of failing the request.
    pub fn rating_range(&self, label: &str) -> RatingRange {
        self.rating_ranges
            .get(label)
            .copied()
            .unwrap_or(RatingRange {
                min: 0.0,
                max: -1.0,
            })
    }
}

/// Immutable public-name -> catalog-entry mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldCatalog {
    fields: HashMap<String, CatalogField>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field. Last registration wins for duplicate names.
    pub fn field(mut self, name: impl Into<String>, entry: CatalogField) -> Self {
        self.fields.insert(name.into(), entry);
        self
    }

    /// Resolve a public field name to its catalog entry.
    pub fn resolve(&self, name: &str) -> Result<&CatalogField, CompileError> {
        self.fields
            .get(name)
            .ok_or_else(|| CompileError::FieldNotMapped(name.to_string()))
    }

    /// Validate a field's operator and canonicalized value against its
    /// catalog entry. Pure; no side effects.
    ///
    /// Rules, in order: operator must be allowed for the field; list
    /// values need `multi_select` (and a list-eligible operator); every
    /// scalar must match the declared control type; enum values must be
    /// whitelisted; UUID and timestamp values must parse.
    pub fn validate(
        &self,
        name: &str,
        entry: &CatalogField,
        operator: CompareOperator,
        value: &FieldValue,
    ) -> Result<(), CompileError> {
        if !entry.operators.contains(&operator) {
            return Err(CompileError::OperatorNotAllowed {
                field: name.to_string(),
                operator: operator.wire_name().to_string(),
            });
        }

        let kind = registry::kind(operator).1;

        // The existence operators ignore their value entirely.
        if kind == OperatorKind::Existence {
            return Ok(());
        }

        if value.is_list() && !entry.multi_select && kind != OperatorKind::DateWindow {
            return Err(CompileError::MultiSelectNotAllowed {
                field: name.to_string(),
            });
        }

        for scalar in value.scalars() {
            self.validate_scalar(name, entry, kind, scalar)?;
        }
        Ok(())
    }

    fn validate_scalar(
        &self,
        name: &str,
        entry: &CatalogField,
        kind: OperatorKind,
        scalar: &ScalarValue,
    ) -> Result<(), CompileError> {
        match kind {
            // Rating operators compare against a semantic label, not the
            // field's raw numeric type.
            OperatorKind::Rating(_) => match scalar {
                ScalarValue::Text(_) => Ok(()),
                other => Err(CompileError::WrongValueType {
                    field: name.to_string(),
                    expected: "rating label",
                    got: other.render_text(),
                }),
            },
            OperatorKind::DateOrdering(_) | OperatorKind::DateWindow => {
                parse_timestamp(name, scalar)
            }
            OperatorKind::Ordering(_) => match scalar {
                ScalarValue::Number(_) => Ok(()),
                other => Err(CompileError::WrongValueType {
                    field: name.to_string(),
                    expected: "number",
                    got: other.render_text(),
                }),
            },
            // Substring/prefix patterns accept numbers; they are
            // formatted deterministically by the handlers.
            OperatorKind::Substring | OperatorKind::FreeText | OperatorKind::Prefix => {
                match scalar {
                    ScalarValue::Text(_) | ScalarValue::Number(_) => Ok(()),
                    other => Err(CompileError::WrongValueType {
                        field: name.to_string(),
                        expected: "string",
                        got: other.render_text(),
                    }),
                }
            }
            _ => self.validate_control_type(name, entry, scalar),
        }
    }

    fn validate_control_type(
        &self,
        name: &str,
        entry: &CatalogField,
        scalar: &ScalarValue,
    ) -> Result<(), CompileError> {
        let mismatch = || CompileError::WrongValueType {
            field: name.to_string(),
            expected: entry.control_type.expected(),
            got: scalar.render_text(),
        };
        match entry.control_type {
            ControlType::Text | ControlType::Keyword | ControlType::Ip => match scalar {
                ScalarValue::Text(_) => Ok(()),
                _ => Err(mismatch()),
            },
            ControlType::Number => match scalar {
                ScalarValue::Number(_) => Ok(()),
                _ => Err(mismatch()),
            },
            ControlType::Boolean => match scalar {
                ScalarValue::Bool(_) => Ok(()),
                _ => Err(mismatch()),
            },
            ControlType::Enum => match scalar {
                ScalarValue::Text(s) if entry.allowed_values.iter().any(|v| v == s) => Ok(()),
                ScalarValue::Text(s) => Err(CompileError::ValueNotAllowed {
                    field: name.to_string(),
                    value: s.clone(),
                }),
                _ => Err(mismatch()),
            },
            ControlType::Uuid => match scalar {
                ScalarValue::Text(s) if uuid::Uuid::parse_str(s).is_ok() => Ok(()),
                other => Err(CompileError::InvalidUuid {
                    field: name.to_string(),
                    value: other.render_text(),
                }),
            },
            ControlType::DateTime => parse_timestamp(name, scalar),
        }
    }
}

pub(crate) fn parse_timestamp(name: &str, scalar: &ScalarValue) -> Result<(), CompileError> {
    match scalar {
        ScalarValue::Text(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => Ok(()),
        other => Err(CompileError::InvalidTimestamp {
            field: name.to_string(),
            value: other.render_text(),
        }),
    }
}
