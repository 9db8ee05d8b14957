//! Paging Compiler - translates page index/size into backend windows.
//!
//! The strict operations error on non-positive sizes and negative
//! indexes; they never clamp. The lenient defaulting policy is a
//! deliberately separate operation ([`window_or_default`]) so strict
//! and lenient callers can be tested independently - the two must not
//! be merged.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::CompileError;

/// Wire-facing paging request: `{"index": 0, "size": 25}`. Index is
/// 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub index: i64,
    pub size: i64,
}

/// A resolved offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Relational fragment, composed after `ORDER BY`.
    pub fn sql(&self) -> String {
        format!("LIMIT {} OFFSET {}", self.limit, self.offset)
    }
}

/// Strict translation: `offset = index * size`, `limit = size`.
pub fn window(page: &PageRequest) -> Result<PageWindow, CompileError> {
    if page.size <= 0 {
        return Err(CompileError::InvalidPageSize(page.size));
    }
    if page.index < 0 {
        return Err(CompileError::InvalidPageIndex(page.index));
    }
    Ok(PageWindow {
        offset: (page.index as u64).saturating_mul(page.size as u64),
        limit: page.size as u64,
    })
}

/// Synthesized bucket-sort stage for search-aggregation pagination,
/// optionally carrying a bucket-level sort from the Sort Compiler.
pub fn bucket_sort(page: &PageRequest, sort: Option<&Value>) -> Result<Value, CompileError> {
    let window = window(page)?;
    let mut body = Map::new();
    if let Some(sort) = sort {
        body.insert("sort".into(), sort.clone());
    }
    body.insert("from".into(), json!(window.offset));
    body.insert("size".into(), json!(window.limit));
    Ok(json!({"bucket_sort": body}))
}

/// Default page size used by the lenient policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDefaults {
    pub size: u64,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self { size: 25 }
    }
}

/// Lenient policy: an absent or invalid request becomes the first page
/// at the configured default size instead of erroring.
pub fn window_or_default(page: Option<&PageRequest>, defaults: PageDefaults) -> PageWindow {
    page.and_then(|p| window(p).ok()).unwrap_or(PageWindow {
        offset: 0,
        limit: defaults.size,
    })
}
