//! # filterql
//!
//! A backend-agnostic filter/sort/paging compiler. An abstract,
//! wire-serializable filter request is validated against a field
//! catalog, compiled through a fixed operator registry into an
//! abstract boolean clause, and rendered by two independent emitters
//! with identical semantics.
//!
//! ## Architecture
//!
//! ```text
//! FilterRequest (wire JSON)
//!     │
//!     ▼
//! FieldCatalog ── resolve names, validate operators/values
//!     │
//!     ▼
//! Operator Registry ── one declarative table: operator → polarity + handler
//!     │
//!     ▼
//! QueryCompiler ── accumulate must/must_not, compose AND/OR
//!     │
//!     ├─→ SearchEmitter → nested bool-query tree (JSON)
//!     └─→ SqlEmitter    → parameterized WHERE fragment
//!
//! SortCompiler / paging ── composed independently per backend
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use filterql::{
//!     CatalogField, CompareOperator, ControlType, FieldCatalog, FilterRequest,
//!     QueryCompiler, SearchEmitter, SqlEmitter,
//! };
//!
//! let catalog = FieldCatalog::new().field(
//!     "status",
//!     CatalogField::new("status", ControlType::Keyword)
//!         .multi_select()
//!         .operators([CompareOperator::IsEqualTo, CompareOperator::IsNotEqualTo]),
//! );
//! let compiler = QueryCompiler::new(catalog);
//!
//! let request: FilterRequest = serde_json::from_value(serde_json::json!({
//!     "operator": "and",
//!     "fields": [{"name": "status", "operator": "isEqualTo", "value": ["open", "new"]}]
//! }))
//! .unwrap();
//!
//! let clause = compiler.compile(Some(&request)).unwrap();
//!
//! let search = SearchEmitter::render(&clause);
//! assert_eq!(
//!     search,
//!     serde_json::json!({"bool": {"must": [{"terms": {"status": ["open", "new"]}}]}})
//! );
//!
//! let sql = SqlEmitter::render(&clause);
//! assert_eq!(sql.clause, "\"status\" IN (?, ?)");
//! ```
//!
//! ## Semantics
//!
//! - Compilation fails closed: the first unmapped field, disallowed
//!   operator or malformed value aborts the whole request. No partial
//!   query is ever produced.
//! - AND composes as a flat conjunction of must and must-not clauses.
//!   OR wraps each must-not clause in its own negation and folds
//!   everything into a should list with minimum_should_match = 1.
//! - The compiler is purely functional. Catalogs, sort column maps and
//!   the operator registry are built once and read-only afterwards;
//!   share them across threads freely.
//!
//! ## Modules
//!
//! - [`filter`]: wire-facing request model
//! - [`catalog`]: field catalog and validation
//! - [`registry`]: operator → polarity/handler table
//! - [`predicate`]: backend-agnostic predicate IR
//! - [`compiler`]: the [`QueryCompiler`] orchestrating it all
//! - [`emit`]: the search and SQL emitters
//! - [`sort`] / [`paging`]: ordering and windowing, per backend

pub mod catalog;
pub mod compiler;
pub mod emit;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod paging;
pub mod predicate;
pub mod registry;
pub mod sort;

pub use catalog::{CatalogField, ControlType, FieldCatalog, NestedSpec, RatingRange};
pub use compiler::QueryCompiler;
pub use emit::{SearchEmitter, SqlEmitter, SqlFragment, SqlParam};
pub use error::CompileError;
pub use filter::{
    CompareOperator, FieldValue, FilterRequest, LogicOperator, RequestField, ScalarValue,
};
pub use paging::{PageDefaults, PageRequest, PageWindow};
pub use predicate::{BoolClause, ClauseSet, Predicate, RangeBound, WildcardKind};
pub use registry::Polarity;
pub use sort::{SearchOrdering, SortCompiler, SortDescriptor, SortDirection, SortRequest};
