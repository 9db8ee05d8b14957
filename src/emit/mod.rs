//! Backend Emitters
//!
//! Two independent renderers over the same composed [`BoolClause`]:
//!
//! ```text
//! QueryCompiler (BoolClause IR)
//!     ↓
//!     ├─→ SearchEmitter → nested OpenSearch bool-query tree (JSON)
//!     └─→ SqlEmitter    → parameterized WHERE fragment
//! ```
//!
//! Neither emitter depends on the other; their boolean semantics are
//! proven to agree by the shared fixtures in `tests/parity.rs`.
//!
//! [`BoolClause`]: crate::predicate::BoolClause

mod search;
pub(crate) mod sql;

pub use search::SearchEmitter;
pub use sql::{SqlEmitter, SqlFragment, SqlParam};
