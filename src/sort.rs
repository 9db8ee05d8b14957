//! Sort Compiler - maps a logical sort column to an effective backend
//! ordering.
//!
//! A direct column orders rows (or documents) on a backend field. An
//! aggregated column has no per-row value: ordering grouped results by
//! it requires synthesizing a metric sub-aggregation (min for ascending,
//! max for descending) over the backing field, then ordering the outer
//! buckets by that metric. The relational target supports direct columns
//! only.
//!
//! An absent sort request emits no ordering clause at all; callers fall
//! back to the backend's natural order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::emit::sql::quote_ident;
use crate::error::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn wire_name(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Wire-facing sort request: `{"column": "severity", "direction": "desc"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortRequest {
    pub column: String,
    pub direction: SortDirection,
}

/// How a logical sort column maps onto the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortDescriptor {
    /// Bucket-level ordering by a synthesized metric sub-aggregation.
    #[serde(rename_all = "camelCase")]
    Aggregated {
        /// Name of the synthesized sub-aggregation.
        aggregation_name: String,
        /// Backend field the metric runs over.
        direct_field: String,
        /// Sort path referencing the sub-aggregation's value.
        aggregation_value: String,
    },
    /// Row-level ordering on a backend field.
    #[serde(rename_all = "camelCase")]
    Direct { direct_field: String },
}

impl SortDescriptor {
    pub fn direct(field: impl Into<String>) -> Self {
        Self::Direct {
            direct_field: field.into(),
        }
    }

    pub fn aggregated(
        aggregation_name: impl Into<String>,
        direct_field: impl Into<String>,
        aggregation_value: impl Into<String>,
    ) -> Self {
        Self::Aggregated {
            aggregation_name: aggregation_name.into(),
            direct_field: direct_field.into(),
            aggregation_value: aggregation_value.into(),
        }
    }
}

/// Compiled search-side ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOrdering {
    Direct {
        field: String,
        direction: SortDirection,
    },
    Aggregated {
        /// Sub-aggregation name to install under the grouping.
        name: String,
        /// The metric body, e.g. `{"max": {"field": "severity"}}`.
        metric: Value,
        /// Bucket-level sort referencing the metric's value.
        order: Value,
    },
}

impl SearchOrdering {
    /// The sort clause: row-level for direct orderings, bucket-level
    /// (for use inside a `bucket_sort` stage) for aggregated ones.
    pub fn sort_clause(&self) -> Value {
        match self {
            Self::Direct { field, direction } => {
                json!([{field: {"order": direction.wire_name()}}])
            }
            Self::Aggregated { order, .. } => order.clone(),
        }
    }

    /// The metric sub-aggregation to install, if any.
    pub fn metric_aggregation(&self) -> Option<(&str, &Value)> {
        match self {
            Self::Direct { .. } => None,
            Self::Aggregated { name, metric, .. } => Some((name, metric)),
        }
    }
}

/// Compiles sort requests against a fixed column map. Built once,
/// read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SortCompiler {
    columns: BTreeMap<String, SortDescriptor>,
}

impl SortCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sortable column.
    pub fn column(mut self, name: impl Into<String>, descriptor: SortDescriptor) -> Self {
        self.columns.insert(name.into(), descriptor);
        self
    }

    fn resolve(&self, column: &str) -> Result<&SortDescriptor, CompileError> {
        self.columns
            .get(column)
            .ok_or_else(|| CompileError::UnknownSortColumn {
                column: column.to_string(),
                valid: self
                    .columns
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Compile for the search target.
    pub fn compile_search(&self, request: &SortRequest) -> Result<SearchOrdering, CompileError> {
        match self.resolve(&request.column)? {
            SortDescriptor::Direct { direct_field } => Ok(SearchOrdering::Direct {
                field: direct_field.clone(),
                direction: request.direction,
            }),
            SortDescriptor::Aggregated {
                aggregation_name,
                direct_field,
                aggregation_value,
            } => {
                // Ascending buckets order by the group minimum,
                // descending by the group maximum.
                let metric_kind = match request.direction {
                    SortDirection::Asc => "min",
                    SortDirection::Desc => "max",
                };
                Ok(SearchOrdering::Aggregated {
                    name: aggregation_name.clone(),
                    metric: json!({metric_kind: {"field": direct_field}}),
                    order: json!([
                        {aggregation_value: {"order": request.direction.wire_name()}}
                    ]),
                })
            }
        }
    }

    /// Compile for the relational target: an `ORDER BY` fragment.
    pub fn compile_sql(&self, request: &SortRequest) -> Result<String, CompileError> {
        match self.resolve(&request.column)? {
            SortDescriptor::Direct { direct_field } => Ok(format!(
                "ORDER BY {} {}",
                quote_ident(direct_field),
                match request.direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                }
            )),
            SortDescriptor::Aggregated { .. } => Err(CompileError::SortColumnNotRelational(
                request.column.clone(),
            )),
        }
    }
}
