// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Compiler - orchestrates validation, dispatch and boolean
//! composition.
//!
//! The compiler is purely functional: a synchronous transformation over
//! an immutable request using the read-only catalog. One compiler can
//! serve arbitrarily many concurrent compilations.
//!
//! # Algorithm
//!
//! 1. Absent or empty request -> empty clause set (no-op filter).
//! 2. Exactly one field with no logic operator -> default to AND.
//!    Multiple fields without a logic operator -> error.
//! 3. Per field: resolve through the catalog, canonicalize the value,
//!    validate, dispatch through the operator registry, and append to
//!    must or must-not per the operator's polarity. The first error
//!    aborts compilation; no partial output.
//! 4. Compose must/must-not per the logic operator (see
//!    [`ClauseSet::compose`]).

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::catalog::FieldCatalog;
use crate::emit::{SearchEmitter, SqlEmitter, SqlFragment};
use crate::error::CompileError;
use crate::filter::{CompareOperator, FieldValue, FilterRequest, LogicOperator, ScalarValue};
use crate::metrics;
use crate::paging::{self, PageRequest};
use crate::predicate::{BoolClause, ClauseSet};
use crate::registry::{self, Polarity};
use crate::sort::{SearchOrdering, SortCompiler, SortRequest};

/// Compiles filter requests against one field catalog.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    catalog: FieldCatalog,
}

impl QueryCompiler {
    pub fn new(catalog: FieldCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Compile a request into the composed boolean clause both emitters
    /// consume. `None` compiles to the empty (match-all) clause.
    pub fn compile(&self, request: Option<&FilterRequest>) -> Result<BoolClause, CompileError> {
        let _timer = metrics::CompileTimer::new();

        let Some(request) = request.filter(|r| !r.fields.is_empty()) else {
            metrics::record_compile("ok");
            return Ok(BoolClause::default());
        };

        let operator = match request.operator {
            Some(operator) => operator,
            None if request.fields.len() == 1 => LogicOperator::And,
            None => {
                metrics::record_compile("error");
                return Err(CompileError::MissingLogicOperator(request.fields.len()));
            }
        };

        let mut clauses = ClauseSet::default();
        for field in &request.fields {
            match self.compile_one(field) {
                Ok((Polarity::Must, predicate)) => clauses.must.push(predicate),
                Ok((Polarity::MustNot, predicate)) => clauses.must_not.push(predicate),
                Err(err) => {
                    metrics::record_compile("error");
                    return Err(err);
                }
            }
        }

        debug!(
            fields = request.fields.len(),
            operator = ?operator,
            must = clauses.must.len(),
            must_not = clauses.must_not.len(),
            "compiled filter request"
        );
        metrics::record_compile("ok");
        Ok(clauses.compose(operator))
    }

    /// Stitch filter, sort and paging into one search request body:
    /// `{"query": ..., "sort": ..., "from": ..., "size": ...}`.
    ///
    /// Covers the row-level path only. Aggregated sort columns order
    /// grouped buckets; those call sites compose
    /// [`SortCompiler::compile_search`] and [`paging::bucket_sort`]
    /// directly, and an aggregated column here is an error.
    pub fn compile_search(
        &self,
        sorter: &SortCompiler,
        filter: Option<&FilterRequest>,
        sort: Option<&SortRequest>,
        page: Option<&PageRequest>,
    ) -> Result<Value, CompileError> {
        let clause = self.compile(filter)?;
        let mut body = Map::new();
        body.insert("query".into(), SearchEmitter::render(&clause));
        if let Some(sort) = sort {
            match sorter.compile_search(sort)? {
                ordering @ SearchOrdering::Direct { .. } => {
                    body.insert("sort".into(), ordering.sort_clause());
                }
                SearchOrdering::Aggregated { .. } => {
                    return Err(CompileError::SortColumnNotRelational(sort.column.clone()));
                }
            }
        }
        if let Some(page) = page {
            let window = paging::window(page)?;
            body.insert("from".into(), json!(window.offset));
            body.insert("size".into(), json!(window.limit));
        }
        Ok(Value::Object(body))
    }

    /// Stitch filter, sort and paging into one relational fragment,
    /// composable after `WHERE`:
    /// `<predicate> [ORDER BY ...] [LIMIT n OFFSET m]`.
    pub fn compile_sql(
        &self,
        sorter: &SortCompiler,
        filter: Option<&FilterRequest>,
        sort: Option<&SortRequest>,
        page: Option<&PageRequest>,
    ) -> Result<SqlFragment, CompileError> {
        let clause = self.compile(filter)?;
        let mut fragment = SqlEmitter::render(&clause);
        if let Some(sort) = sort {
            fragment.clause.push(' ');
            fragment.clause.push_str(&sorter.compile_sql(sort)?);
        }
        if let Some(page) = page {
            fragment.clause.push(' ');
            fragment.clause.push_str(&paging::window(page)?.sql());
        }
        Ok(fragment)
    }

    fn compile_one(
        &self,
        field: &crate::filter::RequestField,
    ) -> Result<(Polarity, crate::predicate::Predicate), CompileError> {
        let entry = self.catalog.resolve(&field.name)?;

        // The existence operators accept any placeholder value, or none.
        let value = match field.operator {
            CompareOperator::Exists | CompareOperator::NotExists => {
                FieldValue::Scalar(ScalarValue::Bool(true))
            }
            _ => FieldValue::canonicalize(&field.name, &field.value)?,
        };

        self.catalog
            .validate(&field.name, entry, field.operator, &value)?;
        registry::compile_field(&field.name, &field.keys, field.operator, entry, &value)
    }
}
